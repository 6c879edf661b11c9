//! Metadata lookup clients
//!
//! TMDB fills in series entries, Open Library fills in novels. Both map a
//! free-text query to a best-effort payload of form fields; the dashboard
//! pre-fills the entry form with whatever came back.

pub mod openlibrary;
pub mod tmdb;

use thiserror::Error;

use crate::error::WebError;

/// Failures the fetch-info endpoints translate into HTTP statuses
#[derive(Debug, Error)]
pub enum LookupError {
    /// No API key available (503)
    #[error("TMDB API key not configured")]
    NotConfigured,

    /// The query matched nothing (404)
    #[error("{0}")]
    NoResults(&'static str),

    /// The upstream service failed (400)
    #[error("{0}")]
    Upstream(String),
}

impl From<LookupError> for WebError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotConfigured => WebError::ServiceUnavailable(err.to_string()),
            LookupError::NoResults(msg) => WebError::NotFound(msg.to_string()),
            LookupError::Upstream(msg) => WebError::BadRequest(msg),
        }
    }
}

/// First `max` characters of a string, on char boundaries.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
