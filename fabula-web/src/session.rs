//! Cookie-backed login sessions
//!
//! The `fabula_session` cookie carries the session row id. The
//! `load_session` middleware resolves it into a [`CurrentUser`] request
//! extension; `require_auth` gates the dashboard routes on that extension
//! being present.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use fabula_common::db::users::User;
use fabula_common::db::{sessions, users};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::warn;
use uuid::Uuid;

use crate::error::WebError;
use crate::AppState;

/// Session cookie name
pub const SESSION_COOKIE: &str = "fabula_session";

/// The signed-in user attached to a request by [`load_session`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: Uuid,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| WebError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extract the session id from the request's `Cookie` header, if present.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            return Uuid::parse_str(value.trim()).ok();
        }
    }
    None
}

/// Build the `Set-Cookie` value for a fresh login.
pub fn session_cookie(id: Uuid, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, id, max_age_secs
    )
}

/// Build the `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Resolve the session cookie into a [`CurrentUser`] extension.
///
/// Unknown, expired or orphaned sessions leave the request anonymous; the
/// middleware never rejects. Valid sessions get their `last_activity`
/// refreshed.
pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(session_id) = session_id_from_headers(request.headers()) {
        match resolve_session(&state, session_id).await {
            Ok(Some(current)) => {
                request.extensions_mut().insert(current);
            }
            Ok(None) => {}
            Err(e) => warn!("Session lookup failed: {}", e),
        }
    }
    next.run(request).await
}

async fn resolve_session(
    state: &AppState,
    session_id: Uuid,
) -> fabula_common::Result<Option<CurrentUser>> {
    let now = Utc::now();
    let Some(session) = sessions::find_valid(&state.db, session_id, now).await? else {
        return Ok(None);
    };
    let Some(user) = users::find_by_id(&state.db, session.user_id).await? else {
        return Ok(None);
    };
    sessions::touch(&state.db, session_id, now).await?;
    Ok(Some(CurrentUser {
        user,
        session_id,
    }))
}

/// Redirect anonymous requests to the login page.
///
/// Runs after [`load_session`], so presence of the extension is the whole
/// check.
pub async fn require_auth(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_none() {
        return (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, "/login")],
        )
            .into_response();
    }
    next.run(request).await
}

/// Serialize a user for page props and the login response.
///
/// camelCase fields, no password material.
pub fn user_props(user: &User) -> Value {
    json!({
        "id": user.id,
        "fullName": user.full_name,
        "email": user.email,
        "role": user.role,
        "lastLoginAt": user.last_login_at.map(|t| t.to_rfc3339()),
        "createdAt": user.created_at.to_rfc3339(),
    })
}

/// Best-effort client address for session records and login throttling.
///
/// `X-Forwarded-For` wins when a proxy set it; otherwise the socket peer
/// address; unspecified when neither is known (router tests).
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return ip;
            }
        }
    }
    peer.map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
