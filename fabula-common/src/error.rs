//! Library-level errors
//!
//! Shared by the web service and the admin CLI. The web crate wraps this in
//! its own response type to pick HTTP statuses; the CLI reports these
//! through anyhow.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Query or connection failure from the SQLite store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure (root folder, cover storage)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad or missing configuration (root folder, TOML file, API keys)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catalog entry, user or session that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied value that fails validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Anything that indicates a bug rather than bad input
    #[error("Internal error: {0}")]
    Internal(String),
}
