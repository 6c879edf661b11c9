//! User accounts
//!
//! Emails are matched case-insensitively so accounts imported from the
//! legacy deployment keep working regardless of how they were typed.

use crate::db::{parse_opt_timestamp, parse_timestamp, parse_uuid};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_NORMAL_USER: &str = "normal_user";

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        password_hash: row.try_get("password_hash")?,
        last_login_at: parse_opt_timestamp(row.try_get("last_login_at")?)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_opt_timestamp(row.try_get("updated_at")?)?,
    })
}

pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, full_name, email, role, password_hash,
                           last_login_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(&user.role)
    .bind(&user.password_hash)
    .bind(user.last_login_at.map(|t| t.to_rfc3339()))
    .bind(user.created_at.to_rfc3339())
    .bind(user.updated_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let normalized = email.trim().to_lowercase();
    let row = sqlx::query("SELECT * FROM users WHERE LOWER(email) = ?")
        .bind(normalized)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn touch_last_login(pool: &SqlitePool, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE users SET last_login_at = ?, updated_at = ? WHERE id = ?")
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE LOWER(email) = ?")
        .bind(email.trim().to_lowercase())
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}
