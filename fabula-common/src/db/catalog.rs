//! Shared catalog types and helpers for the series and novels tables

use crate::slug::escape_like;
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Which catalog a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Series,
    Novels,
}

impl CatalogKind {
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Series => "series",
            CatalogKind::Novels => "novels",
        }
    }

    /// Base slug used when a title contains no sluggable characters
    pub fn slug_fallback(&self) -> &'static str {
        match self {
            CatalogKind::Series => "series",
            CatalogKind::Novels => "novel",
        }
    }
}

/// Sort orders accepted by the catalog listing pages.
///
/// Unknown values fall back to `NameAsc`, so a hand-edited query string can
/// never break the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSort {
    #[default]
    NameAsc,
    NameDesc,
    DateDesc,
    DateAsc,
    RatingDesc,
    YearDesc,
    YearAsc,
}

impl CatalogSort {
    pub fn parse(value: &str) -> Self {
        match value {
            "name_desc" => CatalogSort::NameDesc,
            "date_desc" => CatalogSort::DateDesc,
            "date_asc" => CatalogSort::DateAsc,
            "rating_desc" => CatalogSort::RatingDesc,
            "year_desc" => CatalogSort::YearDesc,
            "year_asc" => CatalogSort::YearAsc,
            _ => CatalogSort::NameAsc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSort::NameAsc => "name_asc",
            CatalogSort::NameDesc => "name_desc",
            CatalogSort::DateDesc => "date_desc",
            CatalogSort::DateAsc => "date_asc",
            CatalogSort::RatingDesc => "rating_desc",
            CatalogSort::YearDesc => "year_desc",
            CatalogSort::YearAsc => "year_asc",
        }
    }

    /// Ratings and release years sort with NULLs last in both directions so
    /// unrated/undated entries sink to the bottom.
    fn order_clause(&self) -> &'static str {
        match self {
            CatalogSort::NameAsc => "title COLLATE NOCASE ASC",
            CatalogSort::NameDesc => "title COLLATE NOCASE DESC",
            CatalogSort::DateDesc => "created_at DESC",
            CatalogSort::DateAsc => "created_at ASC",
            CatalogSort::RatingDesc => "rating DESC NULLS LAST",
            CatalogSort::YearDesc => "release_year DESC NULLS LAST",
            CatalogSort::YearAsc => "release_year ASC NULLS LAST",
        }
    }
}

/// Listing filters for the public series index
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub sort: CatalogSort,
    pub rated_only: bool,
    pub genre: Option<String>,
}

/// Stored cover image reference, serialized into the row as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub name: String,
    pub url: String,
}

/// Build the listing SQL and its bind values for a filter.
///
/// Search matches title or short description, case-insensitive, with LIKE
/// wildcards in the term escaped.
pub(crate) fn build_list_sql(table: &str, filter: &CatalogFilter) -> (String, Vec<String>) {
    let mut sql = format!("SELECT * FROM {}", table);
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        conditions
            .push("(title LIKE ? ESCAPE '\\' OR short_description LIKE ? ESCAPE '\\')".to_string());
        binds.push(pattern.clone());
        binds.push(pattern);
    }

    if filter.rated_only {
        conditions.push("rating IS NOT NULL".to_string());
    }

    if let Some(genre) = filter.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        conditions.push("genre = ?".to_string());
        binds.push(genre.to_string());
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    sql.push_str(" ORDER BY ");
    sql.push_str(filter.sort.order_clause());

    (sql, binds)
}

/// Find a slug that is free in the given catalog.
///
/// Tries `base` first, then `base-2`, `base-3`, ... until no other row owns
/// the candidate. `exclude_id` lets an update keep its own slug.
pub async fn ensure_unique_slug(
    pool: &SqlitePool,
    kind: CatalogKind,
    base: &str,
    exclude_id: Option<Uuid>,
) -> Result<String> {
    let mut slug = base.to_string();
    let mut n: u32 = 1;

    loop {
        let sql = match exclude_id {
            Some(_) => format!(
                "SELECT COUNT(*) FROM {} WHERE slug = ? AND id != ?",
                kind.table()
            ),
            None => format!("SELECT COUNT(*) FROM {} WHERE slug = ?", kind.table()),
        };

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(slug.clone());
        if let Some(id) = exclude_id {
            query = query.bind(id.to_string());
        }

        let taken = query.fetch_one(pool).await?;
        if taken == 0 {
            return Ok(slug);
        }

        n += 1;
        slug = format!("{}-{}", base, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    // ========================================================================
    // Sort parsing
    // ========================================================================

    #[test]
    fn test_sort_parse_known_values() {
        assert_eq!(CatalogSort::parse("name_desc"), CatalogSort::NameDesc);
        assert_eq!(CatalogSort::parse("date_desc"), CatalogSort::DateDesc);
        assert_eq!(CatalogSort::parse("date_asc"), CatalogSort::DateAsc);
        assert_eq!(CatalogSort::parse("rating_desc"), CatalogSort::RatingDesc);
        assert_eq!(CatalogSort::parse("year_desc"), CatalogSort::YearDesc);
        assert_eq!(CatalogSort::parse("year_asc"), CatalogSort::YearAsc);
        assert_eq!(CatalogSort::parse("name_asc"), CatalogSort::NameAsc);
    }

    #[test]
    fn test_sort_parse_unknown_falls_back() {
        assert_eq!(CatalogSort::parse(""), CatalogSort::NameAsc);
        assert_eq!(CatalogSort::parse("rating_asc"), CatalogSort::NameAsc);
        assert_eq!(CatalogSort::parse("DROP TABLE"), CatalogSort::NameAsc);
    }

    #[test]
    fn test_sort_round_trips_through_as_str() {
        for sort in [
            CatalogSort::NameAsc,
            CatalogSort::NameDesc,
            CatalogSort::DateDesc,
            CatalogSort::DateAsc,
            CatalogSort::RatingDesc,
            CatalogSort::YearDesc,
            CatalogSort::YearAsc,
        ] {
            assert_eq!(CatalogSort::parse(sort.as_str()), sort);
        }
    }

    // ========================================================================
    // Listing SQL
    // ========================================================================

    #[test]
    fn test_list_sql_no_filters() {
        let (sql, binds) = build_list_sql("series", &CatalogFilter::default());
        assert_eq!(sql, "SELECT * FROM series ORDER BY title COLLATE NOCASE ASC");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_list_sql_search_binds_pattern_twice() {
        let filter = CatalogFilter {
            search: Some("wire".to_string()),
            ..Default::default()
        };
        let (sql, binds) = build_list_sql("series", &filter);
        assert!(sql.contains("title LIKE ? ESCAPE '\\'"));
        assert!(sql.contains("short_description LIKE ? ESCAPE '\\'"));
        assert_eq!(binds, vec!["%wire%".to_string(), "%wire%".to_string()]);
    }

    #[test]
    fn test_list_sql_escapes_wildcards_in_search() {
        let filter = CatalogFilter {
            search: Some("100%".to_string()),
            ..Default::default()
        };
        let (_, binds) = build_list_sql("series", &filter);
        assert_eq!(binds[0], "%100\\%%");
    }

    #[test]
    fn test_list_sql_combined_filters() {
        let filter = CatalogFilter {
            search: Some("the".to_string()),
            sort: CatalogSort::RatingDesc,
            rated_only: true,
            genre: Some("Drama".to_string()),
        };
        let (sql, binds) = build_list_sql("series", &filter);
        assert!(sql.contains("rating IS NOT NULL"));
        assert!(sql.contains("genre = ?"));
        assert!(sql.ends_with("ORDER BY rating DESC NULLS LAST"));
        assert_eq!(binds.len(), 3);
        assert_eq!(binds[2], "Drama");
    }

    #[test]
    fn test_list_sql_blank_search_and_genre_ignored() {
        let filter = CatalogFilter {
            search: Some("   ".to_string()),
            genre: Some("".to_string()),
            ..Default::default()
        };
        let (sql, binds) = build_list_sql("novels", &filter);
        assert!(!sql.contains("WHERE"));
        assert!(binds.is_empty());
    }

    // ========================================================================
    // Slug uniqueness
    // ========================================================================

    async fn pool_with_series_slugs(slugs: &[&str]) -> (SqlitePool, Vec<Uuid>) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init::create_tables(&pool).await.unwrap();
        let mut ids = Vec::new();
        for slug in slugs {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO series (id, title, slug, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(id.to_string())
            .bind(format!("Title for {}", slug))
            .bind(*slug)
            .bind(Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .unwrap();
            ids.push(id);
        }
        (pool, ids)
    }

    #[tokio::test]
    async fn test_slug_free_base_is_kept() {
        let (pool, _) = pool_with_series_slugs(&[]).await;
        let slug = ensure_unique_slug(&pool, CatalogKind::Series, "breaking-bad", None)
            .await
            .unwrap();
        assert_eq!(slug, "breaking-bad");
    }

    #[tokio::test]
    async fn test_slug_first_collision_gets_suffix_2() {
        let (pool, _) = pool_with_series_slugs(&["dune"]).await;
        let slug = ensure_unique_slug(&pool, CatalogKind::Series, "dune", None)
            .await
            .unwrap();
        assert_eq!(slug, "dune-2");
    }

    #[tokio::test]
    async fn test_slug_suffixes_count_upward() {
        let (pool, _) = pool_with_series_slugs(&["dune", "dune-2", "dune-3"]).await;
        let slug = ensure_unique_slug(&pool, CatalogKind::Series, "dune", None)
            .await
            .unwrap();
        assert_eq!(slug, "dune-4");
    }

    #[tokio::test]
    async fn test_slug_update_keeps_own_slug() {
        let (pool, ids) = pool_with_series_slugs(&["dune"]).await;
        let slug = ensure_unique_slug(&pool, CatalogKind::Series, "dune", Some(ids[0]))
            .await
            .unwrap();
        assert_eq!(slug, "dune");
    }

    #[tokio::test]
    async fn test_slug_update_still_avoids_other_rows() {
        let (pool, ids) = pool_with_series_slugs(&["dune", "dune-2"]).await;
        // Renaming the second row to "dune" must not steal the first row's slug
        let slug = ensure_unique_slug(&pool, CatalogKind::Series, "dune", Some(ids[1]))
            .await
            .unwrap();
        assert_eq!(slug, "dune-2");
    }

    #[tokio::test]
    async fn test_slug_catalogs_are_independent() {
        let (pool, _) = pool_with_series_slugs(&["dune"]).await;
        let slug = ensure_unique_slug(&pool, CatalogKind::Novels, "dune", None)
            .await
            .unwrap();
        assert_eq!(slug, "dune");
    }
}
