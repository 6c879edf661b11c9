//! Login sessions
//!
//! One row per signed-in device; the row id is the cookie value. The
//! `payload` column is a JSON object used for one-shot flash data consumed
//! by the next rendered page. Rows imported from the legacy deployment have
//! no `expires_at` and therefore never authenticate; they are retained as
//! sign-in history only.

use crate::db::{parse_opt_timestamp, parse_timestamp, parse_uuid};
use crate::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub payload: Value,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Fresh session for a successful login.
    pub fn new(user_id: Uuid, ip_address: Option<String>, user_agent: Option<String>, lifetime_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            ip_address,
            user_agent,
            payload: json!({}),
            is_current: true,
            created_at: now,
            last_activity: Some(now),
            expires_at: Some(now + chrono::Duration::seconds(lifetime_secs)),
        }
    }
}

fn session_from_row(row: &SqliteRow) -> Result<Session> {
    let payload_text: String = row.try_get("payload")?;
    let payload = match serde_json::from_str(&payload_text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Session payload is not valid JSON, resetting: {}", e);
            json!({})
        }
    };

    Ok(Session {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        payload,
        is_current: row.try_get::<i64, _>("is_current")? != 0,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        last_activity: parse_opt_timestamp(row.try_get("last_activity")?)?,
        expires_at: parse_opt_timestamp(row.try_get("expires_at")?)?,
    })
}

pub async fn insert_session(pool: &SqlitePool, session: &Session) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, ip_address, user_agent, payload,
                              is_current, created_at, last_activity, expires_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.id.to_string())
    .bind(session.user_id.to_string())
    .bind(&session.ip_address)
    .bind(&session.user_agent)
    .bind(session.payload.to_string())
    .bind(session.is_current as i64)
    .bind(session.created_at.to_rfc3339())
    .bind(session.last_activity.map(|t| t.to_rfc3339()))
    .bind(session.expires_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_session(pool: &SqlitePool, id: Uuid) -> Result<Option<Session>> {
    let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(session_from_row).transpose()
}

/// Fetch a session only when it can still authenticate: a known id with an
/// expiry in the future.
pub async fn find_valid(pool: &SqlitePool, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>> {
    let session = get_session(pool, id).await?;
    Ok(session.filter(|s| matches!(s.expires_at, Some(expires) if expires > now)))
}

pub async fn touch(pool: &SqlitePool, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE sessions SET last_activity = ? WHERE id = ?")
        .bind(at.to_rfc3339())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_session(pool: &SqlitePool, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Store a flash value under `payload.flash.<key>`, replacing any previous
/// value for that key. Unknown session ids are a no-op.
pub async fn flash(pool: &SqlitePool, id: Uuid, key: &str, value: Value) -> Result<()> {
    let Some(mut session) = get_session(pool, id).await? else {
        return Ok(());
    };

    if !session.payload.is_object() {
        session.payload = json!({});
    }
    let root = session
        .payload
        .as_object_mut()
        .ok_or_else(|| crate::Error::Internal("session payload not an object".into()))?;
    let flash = root
        .entry("flash")
        .or_insert_with(|| json!({}));
    if !flash.is_object() {
        *flash = json!({});
    }
    if let Some(map) = flash.as_object_mut() {
        map.insert(key.to_string(), value);
    }

    write_payload(pool, id, &session.payload).await
}

/// Remove and return the flash object, leaving the rest of the payload
/// intact. Returns an empty map for unknown sessions or empty flashes.
pub async fn take_flash(pool: &SqlitePool, id: Uuid) -> Result<serde_json::Map<String, Value>> {
    let Some(mut session) = get_session(pool, id).await? else {
        return Ok(serde_json::Map::new());
    };

    let flash = match session.payload.as_object_mut() {
        Some(root) => root.remove("flash"),
        None => None,
    };

    let map = match flash {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return Ok(serde_json::Map::new()),
    };

    write_payload(pool, id, &session.payload).await?;
    Ok(map)
}

async fn write_payload(pool: &SqlitePool, id: Uuid, payload: &Value) -> Result<()> {
    sqlx::query("UPDATE sessions SET payload = ? WHERE id = ?")
        .bind(payload.to_string())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete sessions whose expiry has passed. Legacy rows without an expiry
/// are kept as history.
pub async fn purge_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at IS NOT NULL AND expires_at <= ?")
        .bind(now.to_rfc3339())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::{insert_user, User, ROLE_ADMIN};

    async fn pool_with_user() -> (SqlitePool, Uuid) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init::create_tables(&pool).await.unwrap();
        let user = User {
            id: Uuid::new_v4(),
            full_name: None,
            email: "owner@example.com".to_string(),
            role: ROLE_ADMIN.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        insert_user(&pool, &user).await.unwrap();
        (pool, user.id)
    }

    #[tokio::test]
    async fn test_valid_session_roundtrip() {
        let (pool, user_id) = pool_with_user().await;
        let session = Session::new(user_id, Some("127.0.0.1".into()), Some("test-agent".into()), 3600);
        insert_session(&pool, &session).await.unwrap();

        let found = find_valid(&pool, session.id, Utc::now()).await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.ip_address.as_deref(), Some("127.0.0.1"));
        assert!(found.is_current);
    }

    #[tokio::test]
    async fn test_expired_session_not_valid() {
        let (pool, user_id) = pool_with_user().await;
        let mut session = Session::new(user_id, None, None, 3600);
        session.expires_at = Some(Utc::now() - chrono::Duration::seconds(5));
        insert_session(&pool, &session).await.unwrap();

        assert!(find_valid(&pool, session.id, Utc::now()).await.unwrap().is_none());
        // Still present as history
        assert!(get_session(&pool, session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_session_without_expiry_never_authenticates() {
        let (pool, user_id) = pool_with_user().await;
        let mut session = Session::new(user_id, None, None, 3600);
        session.expires_at = None;
        insert_session(&pool, &session).await.unwrap();

        assert!(find_valid(&pool, session.id, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flash_is_consumed_once() {
        let (pool, user_id) = pool_with_user().await;
        let session = Session::new(user_id, None, None, 3600);
        insert_session(&pool, &session).await.unwrap();

        flash(&pool, session.id, "success", json!("Series created successfully."))
            .await
            .unwrap();
        flash(&pool, session.id, "errors", json!({"title": "Title is required"}))
            .await
            .unwrap();

        let taken = take_flash(&pool, session.id).await.unwrap();
        assert_eq!(taken.get("success"), Some(&json!("Series created successfully.")));
        assert_eq!(
            taken.get("errors"),
            Some(&json!({"title": "Title is required"}))
        );

        let again = take_flash(&pool, session.id).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_and_legacy_rows() {
        let (pool, user_id) = pool_with_user().await;

        let live = Session::new(user_id, None, None, 3600);
        insert_session(&pool, &live).await.unwrap();

        let mut expired = Session::new(user_id, None, None, 3600);
        expired.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        insert_session(&pool, &expired).await.unwrap();

        let mut legacy = Session::new(user_id, None, None, 3600);
        legacy.expires_at = None;
        insert_session(&pool, &legacy).await.unwrap();

        let purged = purge_expired(&pool, Utc::now()).await.unwrap();
        assert_eq!(purged, 1);
        assert!(get_session(&pool, live.id).await.unwrap().is_some());
        assert!(get_session(&pool, expired.id).await.unwrap().is_none());
        assert!(get_session(&pool, legacy.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (pool, user_id) = pool_with_user().await;
        let session = Session::new(user_id, None, None, 3600);
        insert_session(&pool, &session).await.unwrap();

        delete_session(&pool, session.id).await.unwrap();
        assert!(get_session(&pool, session.id).await.unwrap().is_none());
    }
}
