//! Login account management

use anyhow::{bail, Result};
use chrono::Utc;
use fabula_common::auth;
use fabula_common::db::users::{self, User};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Create a login account. The email is trimmed and lowercased; a
/// duplicate is an error.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    full_name: Option<String>,
    role: &str,
) -> Result<User> {
    let email = email.trim().to_lowercase();
    if !auth::plausible_email(&email) {
        bail!("Invalid email address: {}", email);
    }
    if users::email_exists(pool, &email).await? {
        bail!("A user with email {} already exists", email);
    }

    let user = User {
        id: Uuid::new_v4(),
        full_name,
        email,
        role: role.to_string(),
        password_hash: auth::hash_password(password)?,
        last_login_at: None,
        created_at: Utc::now(),
        updated_at: None,
    };
    users::insert_user(pool, &user).await?;
    info!("Created {} user {}", user.role, user.email);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_common::config;
    use fabula_common::db::init::init_database;
    use fabula_common::db::users::ROLE_ADMIN;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_user_and_reject_duplicates() {
        let root = TempDir::new().unwrap();
        let pool = init_database(&config::database_path(root.path()))
            .await
            .unwrap();

        let user = create_user(
            &pool,
            "  Ada@Example.com ",
            "correct horse",
            Some("Ada".to_string()),
            ROLE_ADMIN,
        )
        .await
        .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(auth::verify_password("correct horse", &user.password_hash).unwrap());

        let err = create_user(&pool, "ada@example.com", "other", None, ROLE_ADMIN)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let err = create_user(&pool, "not-an-email", "pw", None, ROLE_ADMIN)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid email address"));
    }
}
