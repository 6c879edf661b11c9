//! Legacy database import
//!
//! Copies rows from an old SQLite export into the application database.
//! The legacy schema stored UUIDs as 32-char hex strings and booleans as
//! 0/1 integers; values are normalized on the way in. Only the tables with
//! a counterpart in the current schema are carried; legacy framework
//! tables (access tokens, remember-me tokens, rate limit counters) are
//! reported and skipped.

use anyhow::{bail, Result};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::path::Path;
use tracing::{debug, info};

/// Import order respecting foreign keys (sessions reference users)
pub const TABLE_ORDER: [&str; 4] = ["users", "sessions", "series", "novels"];

/// Legacy framework tables with no counterpart in the current schema
const LEGACY_TABLES: [&str; 3] = ["auth_access_tokens", "remember_me_tokens", "rate_limits"];

/// A dynamically-typed SQLite value carried from source to target
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Rewrite a 32-char hex string as a hyphenated 8-4-4-4-12 UUID.
///
/// Existing hyphens are ignored for the length check, so an
/// already-hyphenated UUID passes through unchanged in value. Case is
/// preserved. Anything that is not 32 hex chars returns `None`.
pub fn to_uuid(value: &str) -> Option<String> {
    let hex: String = value.chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}

fn is_uuid_column(column: &str) -> bool {
    column == "id" || column == "user_id" || column == "tokenable_id" || column.ends_with("_id")
}

/// Normalize a single column value from the legacy schema.
pub fn normalize_value(column: &str, value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(text) if is_uuid_column(column) => match to_uuid(&text) {
            Some(uuid) => SqlValue::Text(uuid),
            None => SqlValue::Text(text),
        },
        // Legacy booleans are already 0/1 integers; clamp anything else
        SqlValue::Integer(flag) if column == "is_current" => {
            SqlValue::Integer(i64::from(flag != 0))
        }
        other => other,
    }
}

fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_string();
    Ok(match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Integer(row.try_get(index)?),
        "REAL" => SqlValue::Real(row.try_get(index)?),
        "BLOB" => SqlValue::Blob(row.try_get(index)?),
        _ => SqlValue::Text(row.try_get(index)?),
    })
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Blob(v) => query.bind(v),
    }
}

/// Open the legacy source database read-only.
///
/// `immutable=1` keeps SQLite from writing even for internal bookkeeping.
pub async fn open_source(path: &Path) -> Result<SqlitePool> {
    let unopenable =
        || format!("Cannot open SQLite file at {}. Ensure the file exists.", path.display());
    if !path.exists() {
        bail!(unopenable());
    }
    let url = format!("sqlite://{}?mode=ro&immutable=1", path.display());
    match SqlitePool::connect(&url).await {
        Ok(pool) => Ok(pool),
        Err(_) => bail!(unopenable()),
    }
}

async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

async fn target_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(pool)
        .await?;
    Ok(names)
}

/// Copy all recognized tables from the legacy export into the target.
///
/// All inserts run in one transaction; a failure leaves the target
/// untouched. With `truncate`, target rows are deleted first in reverse
/// table order.
pub async fn import_legacy(target: &SqlitePool, source_path: &Path, truncate: bool) -> Result<()> {
    let source = open_source(source_path).await?;
    info!("Reading SQLite from {}", source_path.display());

    let mut tx = target.begin().await?;

    if truncate {
        info!("Truncating target tables...");
        for table in TABLE_ORDER.iter().rev() {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        info!("Truncate done.");
    }

    for table in LEGACY_TABLES {
        if table_exists(&source, table).await? {
            info!("Skipping legacy table {} (no counterpart)", table);
        }
    }

    for table in TABLE_ORDER {
        if !table_exists(&source, table).await? {
            info!("Skip {} (not in SQLite)", table);
            continue;
        }

        let rows = sqlx::query(&format!("SELECT * FROM {}", table))
            .fetch_all(&source)
            .await?;
        if rows.is_empty() {
            info!("{}: 0 rows", table);
            continue;
        }

        // Insert only the columns both schemas know about
        let known = target_columns(target, table).await?;
        let mut kept: Vec<(usize, String)> = Vec::new();
        for (index, column) in rows[0].columns().iter().enumerate() {
            let name = column.name().to_string();
            if known.contains(&name) {
                kept.push((index, name));
            } else {
                debug!("{}: dropping column {} (not in target schema)", table, name);
            }
        }
        if kept.is_empty() {
            info!("{}: 0 rows (no shared columns)", table);
            continue;
        }

        let column_list = kept
            .iter()
            .map(|(_, name)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; kept.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table, column_list, placeholders
        );

        for row in &rows {
            let mut query = sqlx::query(&sql);
            for (index, name) in &kept {
                let value = normalize_value(name, decode_value(row, *index)?);
                query = bind_value(query, value);
            }
            query.execute(&mut *tx).await?;
        }
        info!("{}: {} rows", table, rows.len());
    }

    tx.commit().await?;
    info!("Migration from SQLite completed.");
    Ok(())
}
