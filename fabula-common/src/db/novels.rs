//! Novel catalog queries
//!
//! The novels pages carry no search or filter controls, so listing is a
//! fixed newest-first order.

use crate::db::catalog::CoverImage;
use crate::db::series::cover_json;
use crate::db::{parse_opt_timestamp, parse_timestamp, parse_uuid};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

/// A novel catalog entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Novel {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub cover_image: Option<CoverImage>,
    pub rating: Option<f64>,
    pub personal_review: Option<String>,
    pub external_link: Option<String>,
    pub number_of_chapters: Option<i64>,
    pub theme_url: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn novel_from_row(row: &SqliteRow) -> Result<Novel> {
    let cover_text: Option<String> = row.try_get("cover_image")?;
    let cover_image = cover_text.as_deref().and_then(|text| {
        match serde_json::from_str::<CoverImage>(text) {
            Ok(cover) => Some(cover),
            Err(e) => {
                warn!("Dropping unreadable cover_image value: {}", e);
                None
            }
        }
    });

    Ok(Novel {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        short_description: row.try_get("short_description")?,
        long_description: row.try_get("long_description")?,
        cover_image,
        rating: row.try_get("rating")?,
        personal_review: row.try_get("personal_review")?,
        external_link: row.try_get("external_link")?,
        number_of_chapters: row.try_get("number_of_chapters")?,
        theme_url: row.try_get("theme_url")?,
        genre: row.try_get("genre")?,
        release_year: row.try_get("release_year")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_opt_timestamp(row.try_get("updated_at")?)?,
    })
}

/// All novels, newest first.
pub async fn list_recent(pool: &SqlitePool) -> Result<Vec<Novel>> {
    let rows = sqlx::query("SELECT * FROM novels ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;
    rows.iter().map(novel_from_row).collect()
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Novel>> {
    let row = sqlx::query("SELECT * FROM novels WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(novel_from_row).transpose()
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Novel>> {
    let row = sqlx::query("SELECT * FROM novels WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(novel_from_row).transpose()
}

pub async fn insert(pool: &SqlitePool, novel: &Novel) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO novels (id, title, slug, short_description, long_description,
                            cover_image, rating, personal_review, external_link,
                            number_of_chapters, theme_url, genre, release_year,
                            created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(novel.id.to_string())
    .bind(&novel.title)
    .bind(&novel.slug)
    .bind(&novel.short_description)
    .bind(&novel.long_description)
    .bind(cover_json(&novel.cover_image)?)
    .bind(novel.rating)
    .bind(&novel.personal_review)
    .bind(&novel.external_link)
    .bind(novel.number_of_chapters)
    .bind(&novel.theme_url)
    .bind(&novel.genre)
    .bind(novel.release_year)
    .bind(novel.created_at.to_rfc3339())
    .bind(novel.updated_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update(pool: &SqlitePool, novel: &Novel) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE novels SET
            title = ?, slug = ?, short_description = ?, long_description = ?,
            cover_image = ?, rating = ?, personal_review = ?, external_link = ?,
            number_of_chapters = ?, theme_url = ?, genre = ?, release_year = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&novel.title)
    .bind(&novel.slug)
    .bind(&novel.short_description)
    .bind(&novel.long_description)
    .bind(cover_json(&novel.cover_image)?)
    .bind(novel.rating)
    .bind(&novel.personal_review)
    .bind(&novel.external_link)
    .bind(novel.number_of_chapters)
    .bind(&novel.theme_url)
    .bind(&novel.genre)
    .bind(novel.release_year)
    .bind(novel.updated_at.map(|t| t.to_rfc3339()))
    .bind(novel.id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM novels WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM novels")
        .fetch_one(pool)
        .await?)
}
