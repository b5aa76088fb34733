//! Threadline CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! tl-cli migrate
//!
//! # Import products from a YAML file
//! tl-cli seed products --file products.yaml
//!
//! # Grant a role to an existing account
//! tl-cli user set-role --email staff@example.com --role distributor
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed products` - Bulk product import
//! - `user set-role` - Change an account's role

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(author, version, about = "Threadline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage storefront accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Import products from a YAML file
    Products {
        /// Path to the YAML file (a list of products)
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Change the role of an existing account
    SetRole {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// New role (`admin`, `distributor`, `customer`)
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => {
                commands::seed::products(&file).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, &role).await?;
            }
        },
    }
    Ok(())
}
