//! Novel administration (dashboard)
//!
//! Mirrors the series flows minus the duplicate-title warning; lookups go
//! to Open Library instead of TMDB and need no API key.

use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use fabula_common::db::catalog::{ensure_unique_slug, CatalogKind};
use fabula_common::db::novels::{self, Novel};
use fabula_common::db::sessions;
use fabula_common::slug::slugify;
use serde_json::json;
use uuid::Uuid;

use crate::covers;
use crate::error::{WebError, WebResult};
use crate::forms::{self, CatalogForm};
use crate::inertia::{self, InertiaCtx};
use crate::lookup::openlibrary;
use crate::session::CurrentUser;
use crate::AppState;

use super::series_admin::FetchInfoBody;

const INDEX_ROUTE: &str = "/dashboard/novels";

/// GET /dashboard/novels — newest first.
pub async fn index(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    let entries = novels::list_recent(&state.db).await?;
    inertia::render(
        &state,
        &ctx,
        "dashboard/novels/index",
        json!({ "novels": entries }),
    )
    .await
}

/// GET /dashboard/novels/create
pub async fn create(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    inertia::render(&state, &ctx, "dashboard/novels/create", json!({})).await
}

/// POST /dashboard/novels
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
            return Ok(inertia::back(&headers, "/dashboard/novels/create"));
        }
    };

    let slug = unique_slug(&state, &form.title, None).await?;
    let cover_image = covers::resolve(
        &state.http,
        &state.covers_dir(),
        data.cover.as_ref(),
        form.cover_image_url.as_deref(),
    )
    .await;

    let entry = Novel {
        id: Uuid::new_v4(),
        slug,
        cover_image,
        created_at: Utc::now(),
        updated_at: None,
        ..novel_fields(&form)
    };
    novels::insert(&state.db, &entry).await?;

    sessions::flash(
        &state.db,
        current.session_id,
        "success",
        json!("Novel created successfully."),
    )
    .await?;
    Ok(inertia::see_other(INDEX_ROUTE))
}

/// GET /dashboard/novels/:id/edit
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: InertiaCtx,
) -> WebResult<Response> {
    let entry = find_novel(&state, &id).await?;
    inertia::render(
        &state,
        &ctx,
        "dashboard/novels/edit",
        json!({ "novel": entry }),
    )
    .await
}

/// PUT /dashboard/novels/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current: CurrentUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> WebResult<Response> {
    let existing = find_novel(&state, &id).await?;

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

    let slug = unique_slug(&state, &form.title, Some(existing.id)).await?;

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

    let entry = Novel {
        id: existing.id,
        slug,
        cover_image,
        created_at: existing.created_at,
        updated_at: Some(Utc::now()),
        ..novel_fields(&form)
    };
    novels::update(&state.db, &entry).await?;

    sessions::flash(
        &state.db,
        current.session_id,
        "success",
        json!("Novel updated successfully."),
    )
    .await?;
    Ok(inertia::see_other(INDEX_ROUTE))
}

/// DELETE /dashboard/novels/:id
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current: CurrentUser,
    headers: HeaderMap,
) -> WebResult<Response> {
    let existing = find_novel(&state, &id).await?;

    novels::delete(&state.db, existing.id).await?;
    if let Some(cover) = &existing.cover_image {
        covers::delete(&state.covers_dir(), cover).await;
    }

    sessions::flash(
        &state.db,
        current.session_id,
        "success",
        json!("Novel deleted."),
    )
    .await?;
    Ok(inertia::back(&headers, INDEX_ROUTE))
}

/// POST /dashboard/novels/fetch-info — Open Library lookup.
pub async fn fetch_info(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(body): Json<FetchInfoBody>,
) -> WebResult<Response> {
    let query = body.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(WebError::BadRequest("Query is required".to_string()));
    }

    let payload = openlibrary::fetch_novel(&state.http, query).await?;
    Ok(Json(payload).into_response())
}

async fn unique_slug(
    state: &AppState,
    title: &str,
    exclude_id: Option<Uuid>,
) -> WebResult<String> {
    let base = {
        let s = slugify(title);
        if s.is_empty() {
            CatalogKind::Novels.slug_fallback().to_string()
        } else {
            s
        }
    };
    Ok(ensure_unique_slug(&state.db, CatalogKind::Novels, &base, exclude_id).await?)
}

async fn find_novel(state: &AppState, id: &str) -> WebResult<Novel> {
    let not_found = || WebError::NotFound("Novel not found".to_string());
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    novels::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)
}

fn novel_fields(form: &CatalogForm) -> Novel {
    Novel {
        id: Uuid::nil(),
        title: form.title.clone(),
        slug: String::new(),
        short_description: form.short_description.clone(),
        long_description: form.long_description.clone(),
        cover_image: None,
        rating: form.rating,
        personal_review: form.personal_review.clone(),
        external_link: form.external_link.clone(),
        number_of_chapters: form.number_of_chapters,
        theme_url: form.theme_url.clone(),
        genre: form.genre.clone(),
        release_year: form.release_year,
        created_at: Utc::now(),
        updated_at: None,
    }
}
