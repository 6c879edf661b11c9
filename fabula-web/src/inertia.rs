//! Server-driven page protocol
//!
//! Implements the Inertia wire format: the first request for any page gets
//! the HTML shell with the page object embedded in `<div id="app">`;
//! subsequent navigations send `X-Inertia: true` and get the page object as
//! bare JSON. A stale asset version on a GET navigation answers `409` with
//! `X-Inertia-Location`, which makes the client do a full reload.

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use fabula_common::db::sessions;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::api::assets;
use crate::error::WebResult;
use crate::session::{user_props, CurrentUser};
use crate::AppState;

pub const INERTIA_HEADER: &str = "x-inertia";
pub const VERSION_HEADER: &str = "x-inertia-version";
pub const LOCATION_HEADER: &str = "x-inertia-location";

/// Everything a page handler needs to answer in the page protocol
#[derive(Debug, Clone)]
pub struct InertiaCtx {
    pub is_inertia: bool,
    pub client_version: Option<String>,
    pub method: Method,
    pub uri: Uri,
    pub qs: HashMap<String, String>,
    pub identity: Option<CurrentUser>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for InertiaCtx
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let qs = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(map)| map)
            .unwrap_or_default();
        Ok(InertiaCtx {
            is_inertia: header_is(&parts.headers, INERTIA_HEADER, "true"),
            client_version: header_value(&parts.headers, VERSION_HEADER),
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            qs,
            identity: parts.extensions.get::<CurrentUser>().cloned(),
        })
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn header_is(headers: &HeaderMap, name: &str, expected: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false)
}

/// Render a page, choosing the shell or the JSON wire format per request.
///
/// Page props are merged over the shared props (`user`, `isLoggedIn`,
/// `errors`, `flashSuccess`, `flashWarning`, `qs`); any flash data stored by
/// the previous request is consumed here.
pub async fn render(
    state: &AppState,
    ctx: &InertiaCtx,
    component: &str,
    props: Value,
) -> WebResult<Response> {
    let url = ctx
        .uri
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| ctx.uri.path().to_string());

    // Stale client assets: tell the protocol to reload before any flash data
    // is consumed, so the retried request still sees it.
    if ctx.is_inertia && ctx.method == Method::GET {
        if let Some(client_version) = &ctx.client_version {
            if *client_version != state.asset_version {
                return Ok((
                    StatusCode::CONFLICT,
                    [(LOCATION_HEADER, url)],
                )
                    .into_response());
            }
        }
    }

    let mut merged = shared_props(state, ctx).await?;
    if let Value::Object(page_props) = props {
        for (key, value) in page_props {
            merged.insert(key, value);
        }
    }

    let page = json!({
        "component": component,
        "props": Value::Object(merged),
        "url": url,
        "version": state.asset_version,
    });

    if ctx.is_inertia {
        Ok((
            [
                (INERTIA_HEADER, "true"),
                (header::VARY.as_str(), INERTIA_HEADER),
            ],
            Json(page),
        )
            .into_response())
    } else {
        Ok(Html(shell_html(&page)).into_response())
    }
}

async fn shared_props(state: &AppState, ctx: &InertiaCtx) -> WebResult<Map<String, Value>> {
    let mut flash = Map::new();
    if let Some(identity) = &ctx.identity {
        flash = sessions::take_flash(&state.db, identity.session_id).await?;
    }

    let mut shared = Map::new();
    shared.insert(
        "user".to_string(),
        ctx.identity
            .as_ref()
            .map(|i| user_props(&i.user))
            .unwrap_or(Value::Null),
    );
    shared.insert("isLoggedIn".to_string(), json!(ctx.identity.is_some()));
    shared.insert(
        "errors".to_string(),
        flash.remove("errors").unwrap_or_else(|| json!({})),
    );
    shared.insert(
        "flashSuccess".to_string(),
        flash.remove("success").unwrap_or(Value::Null),
    );
    shared.insert(
        "flashWarning".to_string(),
        flash.remove("warning").unwrap_or(Value::Null),
    );
    shared.insert("qs".to_string(), json!(ctx.qs));
    Ok(shared)
}

/// Embed the page object into the HTML shell.
fn shell_html(page: &Value) -> String {
    let encoded = escape_attribute(&page.to_string());
    assets::SHELL_HTML.replace("__INERTIA_PAGE__", &encoded)
}

/// HTML-attribute escaping for the `data-page` payload.
fn escape_attribute(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `303 See Other`, so the protocol client re-requests with GET.
pub fn see_other(to: &str) -> Response {
    (StatusCode::SEE_OTHER, [(header::LOCATION, to.to_string())]).into_response()
}

/// Redirect back to the referring page, or to a fallback route.
pub fn back(headers: &HeaderMap, fallback: &str) -> Response {
    let to = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback);
    see_other(to)
}

/// Hard redirect outside the page protocol (full browser navigation).
#[allow(dead_code)]
pub fn external_redirect(to: &str) -> Response {
    (StatusCode::CONFLICT, [(LOCATION_HEADER, to.to_string())]).into_response()
}
