//! `SchoolMall` CLI - database migrations and store management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! sm-cli migrate
//!
//! # Create an admin account
//! sm-cli admin create -e admin@example.com -n "Admin User" -p 'long-password'
//!
//! # Reset a password
//! sm-cli admin set-password -e admin@example.com -p 'new-long-password'
//!
//! # Load categories, products and delivery routes
//! sm-cli seed --file crates/cli/seed/catalog.yaml
//! ```
//!
//! All commands read `SCHOOLMALL_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use sqlx::PgPool;

mod commands;

#[derive(Parser)]
#[command(name = "sm-cli")]
#[command(author, version, about = "SchoolMall CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the catalog and delivery routes from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long, default_value = "crates/cli/seed/catalog.yaml")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin full name
        #[arg(short, long)]
        name: String,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Contact phone number
        #[arg(long)]
        phone: Option<String>,
    },
    /// Replace an existing account's password
    SetPassword {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// New password
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
                phone,
            } => {
                commands::admin::create(&pool, &email, &name, &password, phone.as_deref())
                    .await?;
            }
            AdminAction::SetPassword { email, password } => {
                commands::admin::set_password(&pool, &email, &password).await?;
            }
        },
        Commands::Seed { file } => commands::seed::run(&pool, &file).await?,
    }
    Ok(())
}

async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SCHOOLMALL_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "SCHOOLMALL_DATABASE_URL not set")?;

    tracing::info!("Connecting to database...");
    Ok(schoolmall_server::db::create_pool(&database_url).await?)
}
