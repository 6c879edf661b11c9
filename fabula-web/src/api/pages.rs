//! Public pages: home, login, catalog browsing

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use fabula_common::db::catalog::{CatalogFilter, CatalogSort};
use fabula_common::db::{novels, series};
use serde_json::{json, Map, Value};

use crate::error::{WebError, WebResult};
use crate::inertia::{self, InertiaCtx};
use crate::AppState;

/// GET / and GET /home
pub async fn home(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    inertia::render(&state, &ctx, "home", json!({})).await
}

/// GET /login — guests only; signed-in visitors go to the dashboard.
pub async fn login_page(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    if ctx.identity.is_some() {
        return Ok(inertia::see_other("/dashboard"));
    }
    inertia::render(&state, &ctx, "login", json!({})).await
}

/// GET /series — filterable public index.
pub async fn series_index(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    let search_query = ctx
        .qs
        .get("q")
        .map(|q| q.trim().to_string())
        .unwrap_or_default();
    let sort = CatalogSort::parse(ctx.qs.get("sort").map(String::as_str).unwrap_or(""));
    let rated_only = matches!(
        ctx.qs.get("rated_only").map(String::as_str),
        Some("1") | Some("true")
    );
    let genre = ctx
        .qs
        .get("genre")
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty());

    let filter = CatalogFilter {
        search: (!search_query.is_empty()).then(|| search_query.clone()),
        sort,
        rated_only,
        genre: genre.clone(),
    };
    let entries = series::list(&state.db, &filter).await?;
    let genres = series::distinct_genres(&state.db).await?;

    let mut props = Map::new();
    props.insert("series".to_string(), json!(entries));
    props.insert("searchQuery".to_string(), json!(search_query));
    props.insert("sort".to_string(), json!(sort.as_str()));
    props.insert("ratedOnly".to_string(), json!(rated_only));
    if let Some(genre) = genre {
        props.insert("genre".to_string(), json!(genre));
    }
    props.insert("genres".to_string(), json!(genres));

    inertia::render(&state, &ctx, "series/index", Value::Object(props)).await
}

/// GET /series/:slug
pub async fn series_show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    ctx: InertiaCtx,
) -> WebResult<Response> {
    let entry = series::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| WebError::NotFound("Series not found".to_string()))?;

    let base_url = request_base_url(&headers);
    let canonical_url = format!(
        "{}{}",
        base_url,
        ctx.uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| ctx.uri.path().to_string())
    );

    let og_image_url = entry.cover_image.as_ref().map(|cover| {
        if cover.url.starts_with("http") {
            cover.url.clone()
        } else if cover.url.starts_with('/') {
            format!("{}{}", base_url, cover.url)
        } else {
            format!("{}/{}", base_url, cover.url)
        }
    });

    let description: String = entry
        .short_description
        .as_deref()
        .or(entry.long_description.as_deref())
        .unwrap_or("")
        .chars()
        .take(160)
        .collect();

    let mut seo = Map::new();
    seo.insert("canonicalUrl".to_string(), json!(canonical_url));
    if let Some(og) = og_image_url {
        seo.insert("ogImageUrl".to_string(), json!(og));
    }
    if !description.is_empty() {
        seo.insert("description".to_string(), json!(description));
    }
    seo.insert("title".to_string(), json!(entry.title));

    inertia::render(
        &state,
        &ctx,
        "series/show",
        json!({ "series": entry, "seo": Value::Object(seo) }),
    )
    .await
}

/// GET /novels — newest first.
pub async fn novels_index(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    let entries = novels::list_recent(&state.db).await?;
    inertia::render(&state, &ctx, "novels/index", json!({ "novels": entries })).await
}

/// GET /novels/:slug
pub async fn novels_show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ctx: InertiaCtx,
) -> WebResult<Response> {
    let entry = novels::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| WebError::NotFound("Novel not found".to_string()))?;
    inertia::render(&state, &ctx, "novels/show", json!({ "novel": entry })).await
}

/// `scheme://host` for absolutizing relative URLs in SEO props.
fn request_base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}
