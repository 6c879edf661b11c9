//! Series administration (dashboard)
//!
//! Store and update accept multipart forms. A validation failure flashes
//! the field errors and sends the browser back to the form; a success
//! flashes a confirmation and lands on the dashboard index. Creating a
//! title that already exists still succeeds but flashes a duplicate
//! warning pointing at the existing entry.

use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use fabula_common::config;
use fabula_common::db::catalog::{ensure_unique_slug, CatalogFilter, CatalogKind};
use fabula_common::db::sessions;
use fabula_common::db::series::{self, Series};
use fabula_common::slug::slugify;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::covers;
use crate::error::{WebError, WebResult};
use crate::forms::{self, CatalogForm};
use crate::inertia::{self, InertiaCtx};
use crate::lookup::{tmdb, LookupError};
use crate::session::CurrentUser;
use crate::AppState;

const INDEX_ROUTE: &str = "/dashboard/series";

/// GET /dashboard/series
pub async fn index(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    let entries = series::list(&state.db, &CatalogFilter::default()).await?;
    inertia::render(
        &state,
        &ctx,
        "dashboard/series/index",
        json!({ "series": entries }),
    )
    .await
}

/// GET /dashboard/series/create
pub async fn create(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    inertia::render(&state, &ctx, "dashboard/series/create", json!({})).await
}

/// POST /dashboard/series
pub async fn store(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> WebResult<Response> {
    let data = forms::collect(multipart).await?;
    let form = match forms::validate_catalog(&data.fields) {
        Ok(form) => form,
        Err(errors) => {
            sessions::flash(&state.db, current.session_id, "errors", json!(errors)).await?;
            return Ok(inertia::back(&headers, "/dashboard/series/create"));
        }
    };

    // Duplicate titles are allowed; the dashboard just gets a warning.
    if let Some(existing) = series::find_by_title_ci(&state.db, &form.title).await? {
        sessions::flash(
            &state.db,
            current.session_id,
            "warning",
            json!({
                "type": "already_in_catalog",
                "catalog": "series",
                "existingSlug": existing.slug,
                "existingTitle": existing.title,
            }),
        )
        .await?;
    }

    let base = {
        let s = slugify(&form.title);
        if s.is_empty() {
            CatalogKind::Series.slug_fallback().to_string()
        } else {
            s
        }
    };
    let slug = ensure_unique_slug(&state.db, CatalogKind::Series, &base, None).await?;

    let cover_image = covers::resolve(
        &state.http,
        &state.covers_dir(),
        data.cover.as_ref(),
        form.cover_image_url.as_deref(),
    )
    .await;

    let entry = Series {
        id: Uuid::new_v4(),
        slug,
        cover_image,
        created_at: Utc::now(),
        updated_at: None,
        ..series_fields(&form)
    };
    series::insert(&state.db, &entry).await?;

    sessions::flash(
        &state.db,
        current.session_id,
        "success",
        json!("Series created successfully."),
    )
    .await?;
    Ok(inertia::see_other(INDEX_ROUTE))
}

/// GET /dashboard/series/:id/edit
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: InertiaCtx,
) -> WebResult<Response> {
    let entry = find_series(&state, &id).await?;
    inertia::render(
        &state,
        &ctx,
        "dashboard/series/edit",
        json!({ "series": entry }),
    )
    .await
}

/// PUT /dashboard/series/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current: CurrentUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> WebResult<Response> {
    let existing = find_series(&state, &id).await?;

    let data = forms::collect(multipart).await?;
    let form = match forms::validate_catalog(&data.fields) {
        Ok(form) => form,
        Err(errors) => {
            sessions::flash(&state.db, current.session_id, "errors", json!(errors)).await?;
            return Ok(inertia::back(
                &headers,
                &format!("{}/{}/edit", INDEX_ROUTE, existing.id),
            ));
        }
    };

    let base = {
        let s = slugify(&form.title);
        if s.is_empty() {
            CatalogKind::Series.slug_fallback().to_string()
        } else {
            s
        }
    };
    let slug =
        ensure_unique_slug(&state.db, CatalogKind::Series, &base, Some(existing.id)).await?;

    // Only replace the cover when the form carried a new one.
    let mut cover_image = existing.cover_image.clone();
    if data.cover.is_some() || form.cover_image_url.is_some() {
        if let Some(new_cover) = covers::resolve(
            &state.http,
            &state.covers_dir(),
            data.cover.as_ref(),
            form.cover_image_url.as_deref(),
        )
        .await
        {
            if let Some(old) = &existing.cover_image {
                covers::delete(&state.covers_dir(), old).await;
            }
            cover_image = Some(new_cover);
        }
    }

    let entry = Series {
        id: existing.id,
        slug,
        cover_image,
        created_at: existing.created_at,
        updated_at: Some(Utc::now()),
        ..series_fields(&form)
    };
    series::update(&state.db, &entry).await?;

    sessions::flash(
        &state.db,
        current.session_id,
        "success",
        json!("Series updated successfully."),
    )
    .await?;
    Ok(inertia::see_other(INDEX_ROUTE))
}

/// DELETE /dashboard/series/:id
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current: CurrentUser,
    headers: HeaderMap,
) -> WebResult<Response> {
    let existing = find_series(&state, &id).await?;

    series::delete(&state.db, existing.id).await?;
    if let Some(cover) = &existing.cover_image {
        covers::delete(&state.covers_dir(), cover).await;
    }

    sessions::flash(
        &state.db,
        current.session_id,
        "success",
        json!("Series deleted."),
    )
    .await?;
    Ok(inertia::back(&headers, INDEX_ROUTE))
}

#[derive(Debug, Deserialize)]
pub struct FetchInfoBody {
    pub query: Option<String>,
}

/// POST /dashboard/series/fetch-info — TMDB lookup for the entry form.
pub async fn fetch_info(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(body): Json<FetchInfoBody>,
) -> WebResult<Response> {
    let query = body.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(WebError::BadRequest("Query is required".to_string()));
    }

    let api_key = config::resolve_tmdb_api_key(&state.db, &state.toml_config)
        .await
        .map_err(|_| LookupError::NotConfigured)?;
    let payload = tmdb::fetch_series(&state.http, &api_key, query).await?;
    Ok(Json(payload).into_response())
}

async fn find_series(state: &AppState, id: &str) -> WebResult<Series> {
    let not_found = || WebError::NotFound("Series not found".to_string());
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    series::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)
}

/// Shared field mapping from the validated form; identity and cover fields
/// are overridden by the caller.
fn series_fields(form: &CatalogForm) -> Series {
    Series {
        id: Uuid::nil(),
        title: form.title.clone(),
        slug: String::new(),
        short_description: form.short_description.clone(),
        long_description: form.long_description.clone(),
        cover_image: None,
        rating: form.rating,
        personal_review: form.personal_review.clone(),
        trailer_url: form.trailer_url.clone(),
        number_of_seasons: form.number_of_seasons,
        tmdb_id: form.tmdb_id,
        backdrop_url: form.backdrop_url.clone(),
        theme_url: form.theme_url.clone(),
        genre: form.genre.clone(),
        release_year: form.release_year,
        created_at: Utc::now(),
        updated_at: None,
    }
}
