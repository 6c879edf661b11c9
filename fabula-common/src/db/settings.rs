//! Key/value settings storage

use crate::Result;
use sqlx::{Row, SqlitePool};

/// Read a setting value; `None` when the key is absent or NULL.
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(row.try_get::<Option<String>, _>("value")?),
        None => Ok(None),
    }
}

/// Write a setting, inserting or replacing.
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
