//! Open Library novel lookup
//!
//! Title search, then a work-detail fetch for the description. Open
//! Library's search payload is loosely typed (titles may be arrays,
//! numbers may arrive as floats), so the interesting fields are mapped
//! defensively from raw JSON instead of failing the whole lookup.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{truncate_chars, LookupError};

const OPEN_LIBRARY_SEARCH: &str = "https://openlibrary.org/search.json";
const OPEN_LIBRARY_BASE: &str = "https://openlibrary.org";

/// Pre-fill payload for the novel form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelLookup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchDoc {
    title: Option<Value>,
    cover_i: Option<Value>,
    key: Option<String>,
    first_publish_year: Option<Value>,
    subject: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkDescription {
    Text(String),
    Object { value: Option<String> },
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct WorkResponse {
    description: Option<WorkDescription>,
}

/// Look up a novel by title.
pub async fn fetch_novel(http: &Client, query: &str) -> Result<NovelLookup, LookupError> {
    let search: SearchResponse = http
        .get(OPEN_LIBRARY_SEARCH)
        .query(&[("title", query), ("limit", "5")])
        .send()
        .await
        .map_err(|_| LookupError::Upstream("Open Library search failed".to_string()))?
        .error_for_status()
        .map_err(|_| LookupError::Upstream("Open Library search failed".to_string()))?
        .json()
        .await
        .map_err(|_| LookupError::Upstream("Open Library search failed".to_string()))?;

    let doc = search
        .docs
        .into_iter()
        .next()
        .ok_or(LookupError::NoResults("No novel found"))?;

    // Work detail holds the description; any failure here is ignored.
    let long_description = match work_key(&doc) {
        Some(key) => fetch_description(http, &key).await,
        None => None,
    };

    Ok(map_doc(&doc, long_description))
}

async fn fetch_description(http: &Client, work_key: &str) -> Option<String> {
    let response = http
        .get(format!("{}{}.json", OPEN_LIBRARY_BASE, work_key))
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    let work: WorkResponse = response.json().await.ok()?;
    match work.description? {
        WorkDescription::Text(text) => non_empty(&text),
        WorkDescription::Object { value } => value.as_deref().and_then(non_empty),
        WorkDescription::Other(_) => None,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Work key with a guaranteed leading slash.
fn work_key(doc: &SearchDoc) -> Option<String> {
    let key = doc.key.as_deref().filter(|k| !k.is_empty())?;
    Some(if key.starts_with('/') {
        key.to_string()
    } else {
        format!("/{}", key)
    })
}

/// Map a search doc plus the fetched description onto the form payload.
pub(crate) fn map_doc(doc: &SearchDoc, long_description: Option<String>) -> NovelLookup {
    let title = match &doc.title {
        Some(Value::String(s)) => non_empty(s),
        Some(Value::Array(items)) => items
            .first()
            .and_then(Value::as_str)
            .and_then(non_empty),
        _ => None,
    };

    let cover_image_url = doc
        .cover_i
        .as_ref()
        .and_then(Value::as_i64)
        .map(|id| format!("https://covers.openlibrary.org/b/id/{}-L.jpg", id));

    let external_link = work_key(doc).map(|key| format!("{}{}", OPEN_LIBRARY_BASE, key));

    let release_year = doc
        .first_publish_year
        .as_ref()
        .and_then(Value::as_i64)
        .filter(|y| (1900..=2100).contains(y));

    let subjects: Vec<String> = doc
        .subject
        .iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let genre = (!subjects.is_empty()).then(|| {
        truncate_chars(
            &subjects
                .into_iter()
                .take(3)
                .collect::<Vec<_>>()
                .join(", "),
            100,
        )
    });

    NovelLookup {
        title,
        short_description: long_description
            .as_deref()
            .map(|d| truncate_chars(d, 500)),
        long_description,
        cover_image_url,
        external_link,
        genre,
        release_year,
    }
}
