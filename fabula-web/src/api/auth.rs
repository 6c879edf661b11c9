//! Login and logout
//!
//! `POST /api/v1/auth/login` is a JSON endpoint consumed by the login page;
//! everything else in the application rides on the session cookie it sets.
//! Attempts are throttled per client address before any credential work.

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use fabula_common::db::sessions::{self, Session};
use fabula_common::db::users;
use fabula_common::{auth as password, config};
use serde_json::json;
use std::net::SocketAddr;

use crate::error::{WebError, WebResult};
use crate::forms::{validate_login, LoginBody};
use crate::inertia;
use crate::session::{clear_session_cookie, client_ip, session_cookie, user_props, CurrentUser};
use crate::AppState;

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> WebResult<Response> {
    let ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    if state.login_limiter.check_key(&ip).is_err() {
        return Err(WebError::TooManyRequests(
            "Too many login attempts. Try again later.".to_string(),
        ));
    }

    let form = validate_login(&body).map_err(WebError::Validation)?;

    // Same response for unknown email and wrong password.
    let invalid = || WebError::Unauthorized("Invalid user credentials".to_string());
    let mut user = users::find_by_email(&state.db, &form.email)
        .await?
        .ok_or_else(invalid)?;
    if !password::verify_password(&form.password, &user.password_hash)? {
        return Err(invalid());
    }

    let timeouts = config::session_timeouts(&state.db).await?;
    let lifetime_secs = if form.remember {
        timeouts.remember_me_secs
    } else {
        timeouts.standard_secs
    };

    let now = Utc::now();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let session = Session::new(user.id, Some(ip.to_string()), user_agent, lifetime_secs);
    sessions::insert_session(&state.db, &session).await?;
    users::touch_last_login(&state.db, user.id, now).await?;
    user.last_login_at = Some(now);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(session.id, lifetime_secs))],
        Json(json!({
            "message": "Login successful",
            "data": {
                "user": user_props(&user),
                "redirectTo": "/dashboard",
            }
        })),
    )
        .into_response())
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> WebResult<Response> {
    sessions::delete_session(&state.db, current.session_id).await?;
    let mut response = inertia::see_other("/");
    response.headers_mut().insert(
        header::SET_COOKIE,
        clear_session_cookie()
            .parse()
            .map_err(|_| WebError::Internal("Cookie header construction failed".to_string()))?,
    );
    Ok(response)
}
