//! Session commands.

use clap::Subcommand;
use secrecy::SecretString;

use tienda_console::{AppState, Result};

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Show the signed-in user and roles
    Whoami,
    /// Save a session token for later commands
    Login {
        /// Access token from the web sign-in
        #[arg(short, long)]
        token: String,
    },
    /// Sign out and forget the saved token
    SignOut,
}

pub async fn run(state: &mut AppState, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Whoami => {
            state.resolve_session().await;
            match state.session().user() {
                Some(user) => {
                    println!("{} <{}>", user.display_name(), user.id);
                    println!("roles: {}", user.roles);
                    if let Some(expires_at) =
                        state.session().session().and_then(|session| session.expires_at)
                    {
                        println!("expires: {expires_at}");
                    }
                }
                None => println!("Not signed in"),
            }
        }
        SessionCommand::Login { token } => {
            state.save_access_token(&SecretString::from(token))?;
            println!("Token saved; it is used from the next command on");
        }
        SessionCommand::SignOut => {
            state.resolve_session().await;
            state.sign_out().await?;
            println!("Signed out");
        }
    }
    Ok(())
}
