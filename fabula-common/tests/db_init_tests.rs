//! Integration tests for database initialization
//!
//! Creation on first run, reopening, default settings, and schema version
//! stamping.

use fabula_common::db::init::init_database;
use fabula_common::db::migrations::CURRENT_SCHEMA_VERSION;
use std::path::PathBuf;

fn temp_db(name: &str) -> PathBuf {
    PathBuf::from(format!("/tmp/fabula-test-{}-{}.db", name, std::process::id()))
}

fn cleanup(db_path: &PathBuf) {
    let _ = std::fs::remove_file(db_path);
    // WAL sidecar files
    let _ = std::fs::remove_file(format!("{}-wal", db_path.display()));
    let _ = std::fs::remove_file(format!("{}-shm", db_path.display()));
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let db_path = temp_db("create");
    cleanup(&db_path);

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");

    cleanup(&db_path);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let db_path = temp_db("existing");
    cleanup(&db_path);

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    drop(pool2);
    cleanup(&db_path);
}

#[tokio::test]
async fn test_all_tables_created() {
    let db_path = temp_db("tables");
    cleanup(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    for table in ["users", "sessions", "series", "novels", "settings", "schema_version"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "table {} missing after init", table);
    }

    drop(pool);
    cleanup(&db_path);
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let db_path = temp_db("settings");
    cleanup(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    let tmdb_key: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'tmdb_api_key'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(tmdb_key.as_deref(), Some(""), "tmdb_api_key default should be empty");

    let timeout: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'session_timeout_seconds'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(timeout.as_deref(), Some("86400"));

    let remember: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'remember_me_timeout_seconds'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(remember.as_deref(), Some("2592000"));

    drop(pool);
    cleanup(&db_path);
}

#[tokio::test]
async fn test_existing_settings_preserved_on_reinit() {
    let db_path = temp_db("preserve");
    cleanup(&db_path);

    let pool = init_database(&db_path).await.unwrap();
    fabula_common::db::settings::set_setting(&pool, "tmdb_api_key", "configured-key")
        .await
        .unwrap();
    drop(pool);

    let pool = init_database(&db_path).await.unwrap();
    let key = fabula_common::db::settings::get_setting(&pool, "tmdb_api_key")
        .await
        .unwrap();
    assert_eq!(key.as_deref(), Some("configured-key"));

    drop(pool);
    cleanup(&db_path);
}

#[tokio::test]
async fn test_schema_version_stamped() {
    let db_path = temp_db("version");
    cleanup(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    let version: i64 =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(version, CURRENT_SCHEMA_VERSION);

    drop(pool);
    cleanup(&db_path);
}
