//! Database schema migrations
//!
//! Versioned, idempotent upgrades so existing databases survive new
//! releases without manual surgery. `CREATE TABLE IF NOT EXISTS` in
//! [`crate::db::init`] covers fresh databases; the migrations here bring
//! older ones up to the same shape.
//!
//! Guidelines:
//! 1. Never modify an existing migration once released
//! 2. Add a new numbered migration for each schema change
//! 3. Check column presence before ALTER TABLE so reruns are harmless

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Current schema version
///
/// Increment when adding a migration.
pub const CURRENT_SCHEMA_VERSION: i64 = 3;

/// Get current schema version from database
///
/// Returns 0 if the schema_version table doesn't exist or has no rows.
async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type = 'table' AND name = 'schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = get_schema_version(pool).await?;

    if current < 2 {
        migrate_v2(pool).await?;
    }
    if current < 3 {
        migrate_v3(pool).await?;
    }

    if current < CURRENT_SCHEMA_VERSION {
        set_schema_version(pool, CURRENT_SCHEMA_VERSION).await?;
        info!(
            "Database schema migrated from v{} to v{}",
            current, CURRENT_SCHEMA_VERSION
        );
    }

    Ok(())
}

/// v2: TMDB linkage for series (`tmdb_id`, `backdrop_url`)
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    add_column_if_missing(pool, "series", "tmdb_id", "INTEGER").await?;
    add_column_if_missing(pool, "series", "backdrop_url", "TEXT").await?;
    Ok(())
}

/// v3: `theme_url`, `genre` and `release_year` on both catalog tables
async fn migrate_v3(pool: &SqlitePool) -> Result<()> {
    for table in ["series", "novels"] {
        add_column_if_missing(pool, table, "theme_url", "TEXT").await?;
        add_column_if_missing(pool, table, "genre", "TEXT").await?;
        add_column_if_missing(pool, table, "release_year", "INTEGER").await?;
    }
    Ok(())
}

/// ALTER TABLE ADD COLUMN guarded by a pragma_table_info presence check.
async fn add_column_if_missing(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    column_type: &str,
) -> Result<()> {
    let has_column: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    if has_column == 0 {
        let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_type);
        sqlx::query(&sql).execute(pool).await?;
        info!("Migration: added {}.{}", table, column);
    }

    Ok(())
}
