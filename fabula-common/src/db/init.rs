//! Database initialization
//!
//! Opens (or creates) the SQLite database, creates any missing tables, runs
//! pending schema migrations and installs default settings. Safe to call on
//! every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;
    create_tables(&pool).await?;

    // Upgrade pre-existing databases (idempotent)
    crate::db::migrations::run_migrations(&pool).await?;

    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Connection pragmas: referential integrity, concurrent-reader journal,
/// bounded lock waits.
pub async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}

/// Create every table and index if missing.
///
/// New databases come out at the current schema version; older ones are
/// brought forward by [`crate::db::migrations::run_migrations`].
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_series_table(pool).await?;
    create_novels_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            full_name TEXT,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'admin'
                CHECK (role IN ('admin', 'normal_user')),
            password_hash TEXT NOT NULL,
            last_login_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            ip_address TEXT,
            user_agent TEXT,
            payload TEXT NOT NULL DEFAULT '{}',
            is_current INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            last_activity TEXT,
            expires_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_series_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS series (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            short_description TEXT,
            long_description TEXT,
            cover_image TEXT,
            rating REAL,
            personal_review TEXT,
            trailer_url TEXT,
            number_of_seasons INTEGER,
            tmdb_id INTEGER,
            backdrop_url TEXT,
            theme_url TEXT,
            genre TEXT,
            release_year INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_series_created_at ON series(created_at)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_novels_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS novels (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            short_description TEXT,
            long_description TEXT,
            cover_image TEXT,
            rating REAL,
            personal_review TEXT,
            external_link TEXT,
            number_of_chapters INTEGER,
            theme_url TEXT,
            genre TEXT,
            release_year INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_novels_created_at ON novels(created_at)")
        .execute(pool)
        .await?;
    Ok(())
}

/// Install default settings, preserving any existing values.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "tmdb_api_key", "").await?;
    ensure_setting(
        pool,
        "session_timeout_seconds",
        &crate::config::DEFAULT_SESSION_TIMEOUT_SECS.to_string(),
    )
    .await?;
    ensure_setting(
        pool,
        "remember_me_timeout_seconds",
        &crate::config::DEFAULT_REMEMBER_ME_TIMEOUT_SECS.to_string(),
    )
    .await?;
    Ok(())
}

/// Insert a setting only when the key is absent; a NULL value left behind by
/// an earlier version is reset to the default.
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?;

    sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value IS NULL")
        .bind(default_value)
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}
