//! Series catalog queries

use crate::db::catalog::{build_list_sql, CatalogFilter, CoverImage};
use crate::db::{parse_opt_timestamp, parse_timestamp, parse_uuid};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

/// A TV series catalog entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub cover_image: Option<CoverImage>,
    pub rating: Option<f64>,
    pub personal_review: Option<String>,
    pub trailer_url: Option<String>,
    pub number_of_seasons: Option<i64>,
    pub tmdb_id: Option<i64>,
    pub backdrop_url: Option<String>,
    pub theme_url: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn series_from_row(row: &SqliteRow) -> Result<Series> {
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

    Ok(Series {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        short_description: row.try_get("short_description")?,
        long_description: row.try_get("long_description")?,
        cover_image,
        rating: row.try_get("rating")?,
        personal_review: row.try_get("personal_review")?,
        trailer_url: row.try_get("trailer_url")?,
        number_of_seasons: row.try_get("number_of_seasons")?,
        tmdb_id: row.try_get("tmdb_id")?,
        backdrop_url: row.try_get("backdrop_url")?,
        theme_url: row.try_get("theme_url")?,
        genre: row.try_get("genre")?,
        release_year: row.try_get("release_year")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_opt_timestamp(row.try_get("updated_at")?)?,
    })
}

/// List series entries matching a filter, in the filter's sort order.
pub async fn list(pool: &SqlitePool, filter: &CatalogFilter) -> Result<Vec<Series>> {
    let (sql, binds) = build_list_sql("series", filter);
    let mut query = sqlx::query(&sql);
    for bind in binds {
        query = query.bind(bind);
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter().map(series_from_row).collect()
}

/// Distinct non-empty genres, ascending. Feeds the genre filter dropdown.
pub async fn distinct_genres(pool: &SqlitePool) -> Result<Vec<String>> {
    let genres: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT genre FROM series WHERE genre IS NOT NULL AND genre != '' ORDER BY genre ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(genres)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Series>> {
    let row = sqlx::query("SELECT * FROM series WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(series_from_row).transpose()
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Series>> {
    let row = sqlx::query("SELECT * FROM series WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(series_from_row).transpose()
}

/// Match an existing entry by title, ignoring case and surrounding
/// whitespace. Used for the duplicate warning on create.
pub async fn find_by_title_ci(pool: &SqlitePool, title: &str) -> Result<Option<Series>> {
    let normalized = title.trim().to_lowercase();
    let row = sqlx::query("SELECT * FROM series WHERE LOWER(TRIM(title)) = ? LIMIT 1")
        .bind(normalized)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(series_from_row).transpose()
}

pub async fn insert(pool: &SqlitePool, series: &Series) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO series (id, title, slug, short_description, long_description,
                            cover_image, rating, personal_review, trailer_url,
                            number_of_seasons, tmdb_id, backdrop_url, theme_url,
                            genre, release_year, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(series.id.to_string())
    .bind(&series.title)
    .bind(&series.slug)
    .bind(&series.short_description)
    .bind(&series.long_description)
    .bind(cover_json(&series.cover_image)?)
    .bind(series.rating)
    .bind(&series.personal_review)
    .bind(&series.trailer_url)
    .bind(series.number_of_seasons)
    .bind(series.tmdb_id)
    .bind(&series.backdrop_url)
    .bind(&series.theme_url)
    .bind(&series.genre)
    .bind(series.release_year)
    .bind(series.created_at.to_rfc3339())
    .bind(series.updated_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update(pool: &SqlitePool, series: &Series) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE series SET
            title = ?, slug = ?, short_description = ?, long_description = ?,
            cover_image = ?, rating = ?, personal_review = ?, trailer_url = ?,
            number_of_seasons = ?, tmdb_id = ?, backdrop_url = ?, theme_url = ?,
            genre = ?, release_year = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&series.title)
    .bind(&series.slug)
    .bind(&series.short_description)
    .bind(&series.long_description)
    .bind(cover_json(&series.cover_image)?)
    .bind(series.rating)
    .bind(&series.personal_review)
    .bind(&series.trailer_url)
    .bind(series.number_of_seasons)
    .bind(series.tmdb_id)
    .bind(&series.backdrop_url)
    .bind(&series.theme_url)
    .bind(&series.genre)
    .bind(series.release_year)
    .bind(series.updated_at.map(|t| t.to_rfc3339()))
    .bind(series.id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM series WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM series")
        .fetch_one(pool)
        .await?)
}

pub(crate) fn cover_json(cover: &Option<CoverImage>) -> Result<Option<String>> {
    cover
        .as_ref()
        .map(|c| {
            serde_json::to_string(c)
                .map_err(|e| crate::Error::Internal(format!("Cover serialization failed: {}", e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::CatalogSort;

    fn entry(title: &str, slug: &str) -> Series {
        Series {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
            short_description: None,
            long_description: None,
            cover_image: None,
            rating: None,
            personal_review: None,
            trailer_url: None,
            number_of_seasons: None,
            tmdb_id: None,
            backdrop_url: None,
            theme_url: None,
            genre: None,
            release_year: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init::create_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip() {
        let pool = test_pool().await;
        let mut series = entry("Breaking Bad", "breaking-bad");
        series.rating = Some(9.5);
        series.number_of_seasons = Some(5);
        series.tmdb_id = Some(1396);
        series.genre = Some("Crime, Drama".to_string());
        series.cover_image = Some(CoverImage {
            name: "cover.jpg".to_string(),
            url: "/uploads/covers/abc.jpg".to_string(),
        });
        insert(&pool, &series).await.unwrap();

        let found = find_by_slug(&pool, "breaking-bad").await.unwrap().unwrap();
        assert_eq!(found.id, series.id);
        assert_eq!(found.rating, Some(9.5));
        assert_eq!(found.tmdb_id, Some(1396));
        assert_eq!(
            found.cover_image.unwrap().url,
            "/uploads/covers/abc.jpg"
        );

        assert!(find_by_slug(&pool, "missing").await.unwrap().is_none());
        assert_eq!(count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_matches_title_and_short_description() {
        let pool = test_pool().await;
        let mut a = entry("The Wire", "the-wire");
        a.short_description = Some("Baltimore institutions".to_string());
        insert(&pool, &a).await.unwrap();
        insert(&pool, &entry("Dark", "dark")).await.unwrap();

        let filter = CatalogFilter {
            search: Some("wire".to_string()),
            ..Default::default()
        };
        let hits = list(&pool, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "the-wire");

        let filter = CatalogFilter {
            search: Some("baltimore".to_string()),
            ..Default::default()
        };
        let hits = list(&pool, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "the-wire");
    }

    #[tokio::test]
    async fn test_search_treats_percent_literally() {
        let pool = test_pool().await;
        insert(&pool, &entry("100% Wolf", "100-wolf")).await.unwrap();
        insert(&pool, &entry("100 Days", "100-days")).await.unwrap();

        let filter = CatalogFilter {
            search: Some("100%".to_string()),
            ..Default::default()
        };
        let hits = list(&pool, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "100-wolf");
    }

    #[tokio::test]
    async fn test_rated_only_and_rating_sort_nulls_last() {
        let pool = test_pool().await;
        let mut high = entry("High", "high");
        high.rating = Some(9.0);
        let mut low = entry("Low", "low");
        low.rating = Some(5.5);
        let unrated = entry("Unrated", "unrated");
        insert(&pool, &high).await.unwrap();
        insert(&pool, &low).await.unwrap();
        insert(&pool, &unrated).await.unwrap();

        let filter = CatalogFilter {
            rated_only: true,
            ..Default::default()
        };
        assert_eq!(list(&pool, &filter).await.unwrap().len(), 2);

        let filter = CatalogFilter {
            sort: CatalogSort::RatingDesc,
            ..Default::default()
        };
        let sorted = list(&pool, &filter).await.unwrap();
        let slugs: Vec<&str> = sorted.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["high", "low", "unrated"]);
    }

    #[tokio::test]
    async fn test_genre_filter_and_distinct_genres() {
        let pool = test_pool().await;
        let mut a = entry("A", "a");
        a.genre = Some("Drama".to_string());
        let mut b = entry("B", "b");
        b.genre = Some("Drama".to_string());
        let mut c = entry("C", "c");
        c.genre = Some("Comedy".to_string());
        let mut d = entry("D", "d");
        d.genre = Some("".to_string());
        insert(&pool, &a).await.unwrap();
        insert(&pool, &b).await.unwrap();
        insert(&pool, &c).await.unwrap();
        insert(&pool, &d).await.unwrap();
        insert(&pool, &entry("E", "e")).await.unwrap();

        assert_eq!(distinct_genres(&pool).await.unwrap(), vec!["Comedy", "Drama"]);

        let filter = CatalogFilter {
            genre: Some("Drama".to_string()),
            ..Default::default()
        };
        assert_eq!(list(&pool, &filter).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_year_sort_nulls_last() {
        let pool = test_pool().await;
        let mut old = entry("Old", "old");
        old.release_year = Some(1999);
        let mut new = entry("New", "new");
        new.release_year = Some(2020);
        let undated = entry("Undated", "undated");
        insert(&pool, &old).await.unwrap();
        insert(&pool, &new).await.unwrap();
        insert(&pool, &undated).await.unwrap();

        let filter = CatalogFilter {
            sort: CatalogSort::YearAsc,
            ..Default::default()
        };
        let sorted = list(&pool, &filter).await.unwrap();
        let slugs: Vec<&str> = sorted.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["old", "new", "undated"]);
    }

    #[tokio::test]
    async fn test_find_by_title_ignores_case_and_whitespace() {
        let pool = test_pool().await;
        insert(&pool, &entry("  Breaking Bad  ", "breaking-bad")).await.unwrap();

        let found = find_by_title_ci(&pool, "breaking bad").await.unwrap();
        assert!(found.is_some());
        let found = find_by_title_ci(&pool, "BREAKING BAD").await.unwrap();
        assert!(found.is_some());
        assert!(find_by_title_ci(&pool, "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let pool = test_pool().await;
        let mut series = entry("Dark", "dark");
        insert(&pool, &series).await.unwrap();

        series.title = "Dark (2017)".to_string();
        series.slug = "dark-2017".to_string();
        series.rating = Some(8.8);
        series.updated_at = Some(Utc::now());
        update(&pool, &series).await.unwrap();

        let found = find_by_id(&pool, series.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Dark (2017)");
        assert_eq!(found.slug, "dark-2017");
        assert_eq!(found.rating, Some(8.8));
        assert!(found.updated_at.is_some());

        delete(&pool, series.id).await.unwrap();
        assert!(find_by_id(&pool, series.id).await.unwrap().is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut series = entry("Dark", "dark");
        series.short_description = Some("Time travel".to_string());
        let value = serde_json::to_value(&series).unwrap();
        assert_eq!(value["shortDescription"], "Time travel");
        assert!(value.get("short_description").is_none());
        assert!(value["createdAt"].is_string());
        assert!(value["coverImage"].is_null());
    }
}
