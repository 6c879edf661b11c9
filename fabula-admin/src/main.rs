//! fabula-admin - maintenance CLI for the Fabula catalog
//!
//! Subcommands run offline against the application database: importing a
//! legacy SQLite export, seeding the starter catalog, and creating login
//! accounts. Logs go to stderr so output stays pipeable.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fabula_common::config;
use fabula_common::db::init::init_database;
use fabula_common::db::users::{ROLE_ADMIN, ROLE_NORMAL_USER};
use std::path::PathBuf;
use tracing::info;

use fabula_admin::{account, import, seed};

#[derive(Parser, Debug)]
#[command(name = "fabula-admin", version, about = "Maintenance CLI for the Fabula catalog")]
struct Cli {
    /// Root folder holding the database and stored covers
    #[arg(long, global = true, env = config::ROOT_FOLDER_ENV)]
    root_folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy data from a legacy SQLite export into the application database
    ImportLegacy {
        /// Path to the legacy SQLite file (default: <root>/legacy/db.sqlite3)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Delete target rows before copying
        #[arg(long)]
        truncate: bool,
    },

    /// Insert the starter catalog (skips entries already present)
    Seed,

    /// Create a login account
    CreateUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long, default_value = ROLE_ADMIN, value_parser = [ROLE_ADMIN, ROLE_NORMAL_USER])]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let root_folder = config::resolve_root_folder(cli.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let pool = init_database(&config::database_path(&root_folder)).await?;

    match cli.command {
        Command::ImportLegacy { source, truncate } => {
            let source =
                source.unwrap_or_else(|| root_folder.join("legacy").join("db.sqlite3"));
            import::import_legacy(&pool, &source, truncate).await?;
        }
        Command::Seed => {
            seed::run(&pool).await?;
        }
        Command::CreateUser {
            email,
            password,
            full_name,
            role,
        } => {
            account::create_user(&pool, &email, &password, full_name, &role).await?;
        }
    }

    Ok(())
}
