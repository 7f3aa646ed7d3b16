//! Team management commands.

use clap::Subcommand;

use tienda_console::{AppError, AppState, Result};
use tienda_core::{RoleSet, UserId};

#[derive(Subcommand)]
pub enum TeamCommand {
    /// List team members and their roles
    List,
    /// Replace a member's roles
    SetRoles {
        /// Member's user ID
        user_id: UserId,

        /// Comma-separated roles, e.g. `ventas,inventario`
        roles: String,
    },
}

pub async fn run(state: &mut AppState, command: TeamCommand) -> Result<()> {
    state.resolve_session().await;

    match command {
        TeamCommand::List => {
            let members = state.team().list_members().await;
            if members.is_empty() {
                println!("No team members");
            }
            for member in members {
                println!("{}  {:<28} {}", member.id, member.display_name(), member.roles);
            }
        }
        TeamCommand::SetRoles { user_id, roles } => {
            let roles =
                RoleSet::parse_list(&roles).map_err(|e| AppError::BadRequest(e.to_string()))?;
            let actor = state
                .session()
                .user()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("sign in first".to_string()))?;

            let updated = state.team().set_roles(&actor, user_id, roles).await?;
            println!("{}  {}", updated.display_name(), updated.roles);
        }
    }
    Ok(())
}
