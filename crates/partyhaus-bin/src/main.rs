//! PartyHaus CLI - webhook server, invitations and the local session.

mod app;
mod auth;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use partyhaus_config_and_utils::{init_logging, init_logging_for_service, Config, Paths};

/// PartyHaus command-line interface.
#[derive(Parser, Debug)]
#[command(name = "partyhaus")]
#[command(about = "PartyHaus event invitations and delivery tracking")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, database, logs). Defaults to ~/.partyhaus
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the delivery webhook server
    Serve,
    /// Create or upgrade the local database
    Migrate,
    /// Restore the stored session and show the cached state
    Session,
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PARTYHAUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the local session
    Logout,
    /// Send an invitation email to a guest
    Invite {
        #[arg(long)]
        guest_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    if matches!(cli.command, Commands::Serve) {
        init_logging_for_service("webhook", level, &paths);
    } else {
        init_logging(level, &paths);
    }
    paths.ensure_dirs()?;

    match cli.command {
        Commands::Serve => app::run_server(config, paths).await?,
        Commands::Migrate => app::run_migrations(&paths).await?,
        Commands::Session => auth::show_session(&config, &paths).await?,
        Commands::Login { email, password } => {
            auth::login(&config, &paths, &email, &password).await?
        }
        Commands::Logout => auth::logout(&config, &paths).await?,
        Commands::Invite { guest_id } => app::send_invitation(&config, &paths, &guest_id).await?,
    }

    Ok(())
}
