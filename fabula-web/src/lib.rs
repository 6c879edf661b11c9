//! fabula-web library - catalog web application
//!
//! Serves the public catalog pages, the authenticated dashboard and the
//! login API over the Inertia-style page protocol. All state lives in the
//! SQLite database under the root folder; client assets are embedded in
//! the binary.

use axum::Router;
use fabula_common::config::{self, TomlConfig};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use sqlx::SqlitePool;
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod api;
pub mod covers;
pub mod error;
pub mod forms;
pub mod inertia;
pub mod lookup;
pub mod session;

/// Keyed limiter throttling login attempts per client address
pub type LoginLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Login attempts allowed per client address per minute
const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;

/// Outbound request timeout (TMDB, Open Library, cover downloads)
const HTTP_TIMEOUT_SECS: u64 = 10;

/// Request body cap, sized to fit a maximal cover upload plus form fields
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Root folder holding the database and stored covers
    pub root_folder: PathBuf,
    /// On-disk configuration (host/port/API key fallbacks)
    pub toml_config: TomlConfig,
    /// Client for outbound lookups and cover downloads
    pub http: reqwest::Client,
    /// Version tag of the embedded client assets
    pub asset_version: String,
    /// Per-address login throttle
    pub login_limiter: Arc<LoginLimiter>,
}

impl AppState {
    /// Create new application state
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be built (should not happen with
    /// valid config).
    pub fn new(db: SqlitePool, root_folder: PathBuf, toml_config: TomlConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        let quota = Quota::per_minute(
            NonZeroU32::new(LOGIN_ATTEMPTS_PER_MINUTE).expect("limit is non-zero"),
        );

        Self {
            db,
            root_folder,
            toml_config,
            http,
            asset_version: api::assets::asset_version(),
            login_limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Directory holding stored cover images
    pub fn covers_dir(&self) -> PathBuf {
        config::covers_dir(&self.root_folder)
    }
}

/// Build application router
///
/// The dashboard routes sit behind `require_auth`; everything rides on
/// `load_session`, which resolves the session cookie without ever
/// rejecting a request.
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::middleware;
    use axum::routing::{delete, get, post, put};
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;

    // Authenticated dashboard routes
    let protected = Router::new()
        .route("/logout", get(api::auth::logout))
        .route("/dashboard", get(api::dashboard::index))
        .route("/dashboard/series", get(api::series_admin::index))
        .route("/dashboard/series", post(api::series_admin::store))
        .route("/dashboard/series/create", get(api::series_admin::create))
        .route(
            "/dashboard/series/fetch-info",
            post(api::series_admin::fetch_info),
        )
        .route("/dashboard/series/:id/edit", get(api::series_admin::edit))
        .route("/dashboard/series/:id", put(api::series_admin::update))
        .route("/dashboard/series/:id", delete(api::series_admin::destroy))
        .route("/dashboard/novels", get(api::novels_admin::index))
        .route("/dashboard/novels", post(api::novels_admin::store))
        .route("/dashboard/novels/create", get(api::novels_admin::create))
        .route(
            "/dashboard/novels/fetch-info",
            post(api::novels_admin::fetch_info),
        )
        .route("/dashboard/novels/:id/edit", get(api::novels_admin::edit))
        .route("/dashboard/novels/:id", put(api::novels_admin::update))
        .route("/dashboard/novels/:id", delete(api::novels_admin::destroy))
        .layer(middleware::from_fn(session::require_auth));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/", get(api::pages::home))
        .route("/home", get(api::pages::home))
        .route("/login", get(api::pages::login_page))
        .route("/series", get(api::pages::series_index))
        .route("/series/:slug", get(api::pages::series_show))
        .route("/novels", get(api::pages::novels_index))
        .route("/novels/:slug", get(api::pages::novels_show))
        .route("/api/v1/auth/login", post(api::auth::login))
        .route("/health", get(api::health::health_check))
        .route("/assets/app.js", get(api::assets::serve_app_js))
        .route("/assets/app.css", get(api::assets::serve_app_css));

    let covers_dir = state.covers_dir();

    Router::new()
        .merge(protected)
        .merge(public)
        .nest_service("/uploads/covers", ServeDir::new(covers_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::load_session,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
