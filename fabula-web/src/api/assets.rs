//! Embedded client assets
//!
//! The shell, script and stylesheet are compiled into the binary. The
//! protocol's asset version is a hash of their contents, so a rebuild with
//! changed assets makes navigating clients refresh.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::hash::{Hash, Hasher};

pub const SHELL_HTML: &str = include_str!("../ui/index.html");
pub const APP_JS: &str = include_str!("../ui/app.js");
pub const APP_CSS: &str = include_str!("../ui/app.css");

/// Version tag derived from the embedded asset contents.
pub fn asset_version() -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    SHELL_HTML.hash(&mut hasher);
    APP_JS.hash(&mut hasher);
    APP_CSS.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// GET /assets/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        APP_JS,
    )
        .into_response()
}

/// GET /assets/app.css
pub async fn serve_app_css() -> Response {
    (StatusCode::OK, [("content-type", "text/css")], APP_CSS).into_response()
}
