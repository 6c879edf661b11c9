//! TMDB series lookup
//!
//! Search `query` on TMDB's TV search, then fetch the first hit's details
//! and videos concurrently. A failed videos response only loses the
//! trailer; a failed details response fails the lookup.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{truncate_chars, LookupError};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Pre-fill payload for the series form (camelCase on the wire, absent
/// fields omitted)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesLookup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TvDetails {
    name: Option<String>,
    overview: Option<String>,
    number_of_seasons: Option<i64>,
    vote_average: Option<f64>,
    poster_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VideosResponse {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Video {
    #[serde(rename = "type")]
    kind: Option<String>,
    key: Option<String>,
}

/// Look up a series by free-text query.
pub async fn fetch_series(
    http: &Client,
    api_key: &str,
    query: &str,
) -> Result<SeriesLookup, LookupError> {
    if api_key.trim().is_empty() {
        return Err(LookupError::NotConfigured);
    }

    let search: SearchResponse = http
        .get(format!("{}/search/tv", TMDB_BASE))
        .query(&[("api_key", api_key), ("query", query)])
        .send()
        .await
        .map_err(|_| LookupError::Upstream("TMDB search failed".to_string()))?
        .error_for_status()
        .map_err(|_| LookupError::Upstream("TMDB search failed".to_string()))?
        .json()
        .await
        .map_err(|_| LookupError::Upstream("TMDB search failed".to_string()))?;

    let id = search
        .results
        .first()
        .and_then(|hit| hit.id)
        .ok_or(LookupError::NoResults("No series found"))?;

    let details_request = http
        .get(format!("{}/tv/{}", TMDB_BASE, id))
        .query(&[("api_key", api_key)])
        .send();
    let videos_request = http
        .get(format!("{}/tv/{}/videos", TMDB_BASE, id))
        .query(&[("api_key", api_key)])
        .send();
    let (details_response, videos_response) = tokio::join!(details_request, videos_request);

    let details: TvDetails = details_response
        .map_err(|_| LookupError::Upstream("TMDB details failed".to_string()))?
        .error_for_status()
        .map_err(|_| LookupError::Upstream("TMDB details failed".to_string()))?
        .json()
        .await
        .map_err(|_| LookupError::Upstream("TMDB details failed".to_string()))?;

    // The trailer is optional; a failed videos call just leaves it out.
    let videos: Option<VideosResponse> = match videos_response {
        Ok(response) if response.status().is_success() => response.json().await.ok(),
        _ => None,
    };

    Ok(map_details(details, videos))
}

/// Map TMDB's details + videos responses onto the form payload.
pub(crate) fn map_details(details: TvDetails, videos: Option<VideosResponse>) -> SeriesLookup {
    let title = details
        .name
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let overview = details
        .overview
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string);

    let trailer_url = videos.and_then(|v| {
        v.results
            .into_iter()
            .find(|video| {
                matches!(video.kind.as_deref(), Some("Trailer") | Some("Teaser"))
            })
            .and_then(|video| video.key)
            .map(|key| format!("https://www.youtube.com/watch?v={}", key))
    });

    SeriesLookup {
        title,
        short_description: overview.as_deref().map(|o| truncate_chars(o, 500)),
        long_description: overview,
        rating: details.vote_average.filter(|r| r.is_finite()),
        number_of_seasons: details.number_of_seasons,
        trailer_url,
        cover_image_url: details
            .poster_path
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", TMDB_IMAGE_BASE, p)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(kind: &str, key: Option<&str>) -> Video {
        Video {
            kind: Some(kind.to_string()),
            key: key.map(str::to_string),
        }
    }

    #[test]
    fn test_map_full_details() {
        let details = TvDetails {
            name: Some("  Breaking Bad  ".to_string()),
            overview: Some("A chemistry teacher turns to crime.".to_string()),
            number_of_seasons: Some(5),
            vote_average: Some(8.9),
            poster_path: Some("/poster.jpg".to_string()),
        };
        let videos = VideosResponse {
            results: vec![video("Clip", Some("skip")), video("Trailer", Some("abc123"))],
        };

        let payload = map_details(details, Some(videos));
        assert_eq!(payload.title.as_deref(), Some("Breaking Bad"));
        assert_eq!(
            payload.long_description.as_deref(),
            Some("A chemistry teacher turns to crime.")
        );
        assert_eq!(payload.rating, Some(8.9));
        assert_eq!(payload.number_of_seasons, Some(5));
        assert_eq!(
            payload.trailer_url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );
        assert_eq!(
            payload.cover_image_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
    }

    #[test]
    fn test_short_description_is_first_500_chars() {
        let overview = "o".repeat(600);
        let details = TvDetails {
            overview: Some(overview.clone()),
            ..Default::default()
        };
        let payload = map_details(details, None);
        assert_eq!(payload.short_description.unwrap().len(), 500);
        assert_eq!(payload.long_description.unwrap(), overview);
    }

    #[test]
    fn test_empty_fields_stay_absent() {
        let details = TvDetails {
            name: Some("   ".to_string()),
            overview: Some("".to_string()),
            number_of_seasons: None,
            vote_average: Some(f64::NAN),
            poster_path: Some("".to_string()),
        };
        let payload = map_details(details, None);
        assert_eq!(payload, SeriesLookup::default());
    }

    #[test]
    fn test_teaser_counts_as_trailer() {
        let videos = VideosResponse {
            results: vec![video("Teaser", Some("tease"))],
        };
        let payload = map_details(TvDetails::default(), Some(videos));
        assert_eq!(
            payload.trailer_url.as_deref(),
            Some("https://www.youtube.com/watch?v=tease")
        );
    }

    #[test]
    fn test_first_matching_video_without_key_loses_trailer() {
        let videos = VideosResponse {
            results: vec![video("Trailer", None), video("Trailer", Some("later"))],
        };
        let payload = map_details(TvDetails::default(), Some(videos));
        assert_eq!(payload.trailer_url, None);
    }

    #[test]
    fn test_serializes_camel_case_and_omits_none() {
        let payload = SeriesLookup {
            title: Some("Dark".to_string()),
            number_of_seasons: Some(3),
            ..Default::default()
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["title"], "Dark");
        assert_eq!(value["numberOfSeasons"], 3);
        assert!(value.get("trailerUrl").is_none());
        assert!(value.get("rating").is_none());
    }
}
