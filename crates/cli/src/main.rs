//! Shopbag CLI - session table migrations and backend checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront session table
//! shopbag-cli migrate storefront
//!
//! # Create the admin session table (schema `admin`)
//! shopbag-cli migrate admin
//!
//! # Both
//! shopbag-cli migrate all
//!
//! # Check that BACKEND_BASE_URL answers
//! shopbag-cli backend ping
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "shopbag-cli")]
#[command(author, version, about = "Shopbag operational tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create session tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Commerce backend checks
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Storefront session table
    Storefront,
    /// Admin session table
    Admin,
    /// Both session tables
    All,
}

#[derive(Subcommand)]
enum BackendAction {
    /// Request the public category list
    Ping,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Backend { action } => match action {
            BackendAction::Ping => commands::backend::ping().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_migrate_all() {
        let cli = Cli::try_parse_from(["shopbag-cli", "migrate", "all"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Migrate {
                target: MigrateTarget::All
            })
        ));
    }

    #[test]
    fn test_rejects_unknown_target() {
        assert!(Cli::try_parse_from(["shopbag-cli", "migrate", "orders"]).is_err());
    }
}
