//! Form collection and validation
//!
//! The catalog forms arrive as multipart (text fields plus an optional
//! `coverImage` file part). Numeric fields are deliberately lenient: an
//! empty or unparsable number becomes `None` rather than a field error, so
//! a half-filled form still saves. Only the title and the description
//! length produce user-facing errors.

use axum::body::Bytes;
use axum::extract::Multipart;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::error::{WebError, WebResult};

/// Per-field validation errors, flashed back to the form page
pub type FieldErrors = BTreeMap<String, String>;

/// An uploaded cover file from the multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Collected multipart body: text fields plus the optional cover part
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub cover: Option<UploadedFile>,
}

/// Drain a multipart body into text fields and the `coverImage` file part.
///
/// An empty file part (the browser sends one when no file was picked) counts
/// as no upload.
pub async fn collect(mut multipart: Multipart) -> WebResult<FormData> {
    let mut form = FormData::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("Malformed form data: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "coverImage" {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| WebError::BadRequest(format!("Malformed form data: {}", e)))?;
            if !bytes.is_empty() {
                form.cover = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| WebError::BadRequest(format!("Malformed form data: {}", e)))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Validated catalog entry form, shared by series and novels.
///
/// Fields that do not apply to a catalog (seasons for novels, chapters for
/// series) are simply never read by that catalog's handler.
#[derive(Debug, Clone, Default)]
pub struct CatalogForm {
    pub title: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub rating: Option<f64>,
    pub personal_review: Option<String>,
    pub trailer_url: Option<String>,
    pub external_link: Option<String>,
    pub number_of_seasons: Option<i64>,
    pub number_of_chapters: Option<i64>,
    pub tmdb_id: Option<i64>,
    pub backdrop_url: Option<String>,
    pub theme_url: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i64>,
    pub cover_image_url: Option<String>,
}

/// Validate the text fields of a catalog form.
pub fn validate_catalog(fields: &HashMap<String, String>) -> Result<CatalogForm, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = text(fields, "title").unwrap_or_default();
    if title.is_empty() {
        errors.insert("title".to_string(), "Title is required".to_string());
    } else if title.chars().count() > 255 {
        errors.insert("title".to_string(), "Title is too long".to_string());
    }

    let short_description = text(fields, "shortDescription");
    if let Some(desc) = &short_description {
        if desc.chars().count() > 500 {
            errors.insert(
                "shortDescription".to_string(),
                "Short description is too long".to_string(),
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(CatalogForm {
        title,
        short_description,
        long_description: text(fields, "longDescription"),
        rating: lenient_f64(fields.get("rating")),
        personal_review: text(fields, "personalReview"),
        trailer_url: text(fields, "trailerUrl"),
        external_link: text(fields, "externalLink"),
        number_of_seasons: lenient_i64(fields.get("numberOfSeasons")),
        number_of_chapters: lenient_i64(fields.get("numberOfChapters")),
        tmdb_id: lenient_i64(fields.get("tmdbId")),
        backdrop_url: text(fields, "backdropUrl"),
        theme_url: text(fields, "themeUrl"),
        genre: text(fields, "genre").filter(|g| g.chars().count() <= 100),
        release_year: lenient_year(fields.get("releaseYear")),
        cover_image_url: text(fields, "coverImageUrl"),
    })
}

/// Trimmed text field; empty becomes `None`.
fn text(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lenient float: missing, empty or unparsable is `None`, never an error.
fn lenient_f64(raw: Option<&String>) -> Option<f64> {
    raw.map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Lenient integer: accepts `5` and `5.0`, drops everything else.
fn lenient_i64(raw: Option<&String>) -> Option<i64> {
    let trimmed = raw.map(|v| v.trim()).filter(|v| !v.is_empty())?;
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

/// Lenient year, kept only within the plausible range.
fn lenient_year(raw: Option<&String>) -> Option<i64> {
    lenient_i64(raw).filter(|y| (1900..=2100).contains(y))
}

/// JSON body of `POST /api/v1/auth/login`
#[derive(Debug, Deserialize, Default)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
    pub remember: Option<bool>,
}

/// Validated login credentials
#[derive(Debug)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

/// Validate the login body: trimmed lowercased email of a plausible shape,
/// non-empty password.
pub fn validate_login(body: &LoginBody) -> Result<LoginForm, FieldErrors> {
    let mut errors = FieldErrors::new();

    let email = body
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    if email.is_empty() {
        errors.insert("email".to_string(), "Email is required".to_string());
    } else if !fabula_common::auth::plausible_email(&email) {
        errors.insert(
            "email".to_string(),
            "Enter a valid email address".to_string(),
        );
    }

    let password = body.password.clone().unwrap_or_default();
    if password.is_empty() {
        errors.insert("password".to_string(), "Password is required".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(LoginForm {
        email,
        password,
        remember: body.remember.unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_title_required() {
        let errors = validate_catalog(&fields(&[("title", "   ")])).unwrap_err();
        assert_eq!(errors["title"], "Title is required");

        let errors = validate_catalog(&HashMap::new()).unwrap_err();
        assert_eq!(errors["title"], "Title is required");
    }

    #[test]
    fn test_title_too_long() {
        let long = "x".repeat(256);
        let errors = validate_catalog(&fields(&[("title", &long)])).unwrap_err();
        assert_eq!(errors["title"], "Title is too long");

        let ok = "x".repeat(255);
        assert!(validate_catalog(&fields(&[("title", &ok)])).is_ok());
    }

    #[test]
    fn test_short_description_limit() {
        let long = "d".repeat(501);
        let errors =
            validate_catalog(&fields(&[("title", "Dune"), ("shortDescription", &long)]))
                .unwrap_err();
        assert!(errors.contains_key("shortDescription"));

        let ok = "d".repeat(500);
        let form =
            validate_catalog(&fields(&[("title", "Dune"), ("shortDescription", &ok)])).unwrap();
        assert_eq!(form.short_description.unwrap().len(), 500);
    }

    #[test]
    fn test_lenient_numbers_never_error() {
        let form = validate_catalog(&fields(&[
            ("title", "Dark"),
            ("rating", "not a number"),
            ("numberOfSeasons", ""),
            ("tmdbId", "3.5"),
            ("releaseYear", "1776"),
        ]))
        .unwrap();
        assert_eq!(form.rating, None);
        assert_eq!(form.number_of_seasons, None);
        assert_eq!(form.tmdb_id, None);
        assert_eq!(form.release_year, None);
    }

    #[test]
    fn test_numbers_parse_when_well_formed() {
        let form = validate_catalog(&fields(&[
            ("title", "Dark"),
            ("rating", "8.8"),
            ("numberOfSeasons", "3"),
            ("tmdbId", "70523"),
            ("releaseYear", "2017"),
            ("numberOfChapters", "24.0"),
        ]))
        .unwrap();
        assert_eq!(form.rating, Some(8.8));
        assert_eq!(form.number_of_seasons, Some(3));
        assert_eq!(form.tmdb_id, Some(70523));
        assert_eq!(form.release_year, Some(2017));
        assert_eq!(form.number_of_chapters, Some(24));
    }

    #[test]
    fn test_optional_text_trims_and_drops_empty() {
        let form = validate_catalog(&fields(&[
            ("title", "  Dark  "),
            ("longDescription", "  deep  "),
            ("trailerUrl", "   "),
            ("coverImageUrl", "https://img.example/poster.jpg"),
        ]))
        .unwrap();
        assert_eq!(form.title, "Dark");
        assert_eq!(form.long_description.as_deref(), Some("deep"));
        assert_eq!(form.trailer_url, None);
        assert_eq!(
            form.cover_image_url.as_deref(),
            Some("https://img.example/poster.jpg")
        );
    }

    #[test]
    fn test_overlong_genre_dropped_silently() {
        let long = "g".repeat(101);
        let form = validate_catalog(&fields(&[("title", "Dark"), ("genre", &long)])).unwrap();
        assert_eq!(form.genre, None);

        let form = validate_catalog(&fields(&[("title", "Dark"), ("genre", "Sci-Fi")])).unwrap();
        assert_eq!(form.genre.as_deref(), Some("Sci-Fi"));
    }

    #[test]
    fn test_login_validation() {
        let ok = validate_login(&LoginBody {
            email: Some("  Owner@Example.COM ".to_string()),
            password: Some("hunter2".to_string()),
            remember: Some(true),
        })
        .unwrap();
        assert_eq!(ok.email, "owner@example.com");
        assert!(ok.remember);

        let errors = validate_login(&LoginBody::default()).unwrap_err();
        assert_eq!(errors["email"], "Email is required");
        assert_eq!(errors["password"], "Password is required");

        let errors = validate_login(&LoginBody {
            email: Some("not-an-email".to_string()),
            password: Some("x".to_string()),
            remember: None,
        })
        .unwrap_err();
        assert_eq!(errors["email"], "Enter a valid email address");
    }
}
