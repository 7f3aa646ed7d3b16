//! Tienda CLI - cart, session and admin console from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two medium white shirts to the cart
//! tienda cart add --id 12 --name "Remera" --price 12.50 -q 2 --size M --color blanco
//!
//! # Show the cart
//! tienda cart show
//!
//! # Save a session token obtained from the web sign-in
//! tienda session login --token "$TOKEN"
//!
//! # Check whether the signed-in user may open a page
//! tienda guard /admin/ventas
//!
//! # Give a member the cutter role
//! tienda team set-roles 6f1c1a52-6a4e-4d4f-9d38-2f3f4a1b9e10 cortador
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and edit the persisted cart
//! - `session` - Inspect, save or end the current session
//! - `nav` - Admin menu for the current user (or a given role list)
//! - `guard` - Route guard decision for a path
//! - `team` - List members and edit their roles

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tienda_console::{AppError, AppState, ConsoleConfig};

mod commands;

#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about = "Tienda CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartCommand,
    },
    /// Inspect or end the current session
    Session {
        #[command(subcommand)]
        action: commands::session::SessionCommand,
    },
    /// Show the admin menu
    Nav {
        /// Preview the menu for these roles instead of the signed-in user
        #[arg(short, long)]
        roles: Option<String>,
    },
    /// Check whether the current session may open a path
    Guard {
        /// Path to check, e.g. `/admin/ventas`
        path: String,
    },
    /// Manage team members
    Team {
        #[command(subcommand)]
        action: commands::team::TeamCommand,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ConsoleConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tienda_console=info,tienda_cli=info".into());

    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = init_sentry(&config);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &ConsoleConfig) -> Result<(), AppError> {
    let mut state = AppState::from_config(config)?;

    match cli.command {
        Commands::Cart { action } => commands::cart::run(&mut state, action),
        Commands::Session { action } => commands::session::run(&mut state, action).await,
        Commands::Nav { roles } => commands::nav::menu(&mut state, roles.as_deref()).await,
        Commands::Guard { path } => {
            commands::nav::guard(&mut state, &path).await;
            Ok(())
        }
        Commands::Team { action } => commands::team::run(&mut state, action).await,
    }
}
