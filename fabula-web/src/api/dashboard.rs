//! Dashboard landing page

use axum::{extract::State, response::Response};
use fabula_common::db::{novels, series};
use serde_json::json;

use crate::error::WebResult;
use crate::inertia::{self, InertiaCtx};
use crate::AppState;

/// GET /dashboard
pub async fn index(State(state): State<AppState>, ctx: InertiaCtx) -> WebResult<Response> {
    let series_count = series::count(&state.db).await?;
    let novel_count = novels::count(&state.db).await?;
    inertia::render(
        &state,
        &ctx,
        "dashboard",
        json!({
            "seriesCount": series_count,
            "novelCount": novel_count,
        }),
    )
    .await
}
