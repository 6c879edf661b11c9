//! fabula-web - personal media catalog web application
//!
//! Public catalog pages for TV series and novels plus an authenticated
//! dashboard for maintaining them. Zero-config startup: the root folder
//! resolves from CLI / environment / config file / OS default, and the
//! database is created on first run.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use fabula_common::config;
use fabula_common::db::{init::init_database, sessions};
use std::net::SocketAddr;
use tracing::info;

use fabula_web::{build_router, AppState};

/// Default bind port
const DEFAULT_PORT: u16 = 5750;

#[derive(Parser, Debug)]
#[command(name = "fabula-web", version, about = "Personal media catalog web application")]
struct Cli {
    /// Root folder holding the database and stored covers
    #[arg(long, env = config::ROOT_FOLDER_ENV)]
    root_folder: Option<String>,

    /// Bind address (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting fabula-web v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let toml_config = config::load_toml_config();

    let root_folder = config::resolve_root_folder(cli.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path).await?;

    let purged = sessions::purge_expired(&pool, Utc::now()).await?;
    if purged > 0 {
        info!("Purged {} expired sessions", purged);
    }

    let host = cli
        .host
        .or_else(|| toml_config.host.clone())
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = cli.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);

    let state = AppState::new(pool, root_folder, toml_config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("fabula-web listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
