//! Cover image storage
//!
//! Covers live as `<uuid>.<ext>` files under `<root>/covers/` and are
//! served back at `/uploads/covers/<file>`. The row stores a small JSON
//! reference (original name + public URL). A failed download or a rejected
//! upload never fails the save; the entry just has no cover.

use std::path::Path;

use fabula_common::db::catalog::CoverImage;
use tracing::warn;
use uuid::Uuid;

use crate::forms::UploadedFile;

/// Upload size cap (5 MiB)
pub const MAX_COVER_BYTES: usize = 5 * 1024 * 1024;

/// Fallback original name when the source had none (URL downloads)
const DEFAULT_NAME: &str = "cover.jpg";

/// File extension for an accepted content type.
///
/// JPEG, PNG and WebP are accepted; a missing content type is assumed JPEG.
/// Anything else is rejected.
fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
    match content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim()) {
        Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
        Some("image/png") => Some("png"),
        Some("image/webp") => Some("webp"),
        None => Some("jpg"),
        Some(_) => None,
    }
}

/// Pick the cover for a save: an uploaded file wins over a URL; the URL is
/// only fetched when no file was sent.
pub async fn resolve(
    http: &reqwest::Client,
    covers_dir: &Path,
    upload: Option<&UploadedFile>,
    url: Option<&str>,
) -> Option<CoverImage> {
    if let Some(file) = upload {
        return store_upload(covers_dir, file).await;
    }
    if let Some(url) = url {
        return download_url(http, covers_dir, url).await;
    }
    None
}

/// Store an uploaded cover file. Oversized or unsupported uploads are
/// dropped with a warning.
pub async fn store_upload(covers_dir: &Path, file: &UploadedFile) -> Option<CoverImage> {
    if file.bytes.len() > MAX_COVER_BYTES {
        warn!(
            "Rejecting cover upload of {} bytes (limit {})",
            file.bytes.len(),
            MAX_COVER_BYTES
        );
        return None;
    }
    let Some(ext) = extension_for(file.content_type.as_deref()) else {
        warn!(
            "Rejecting cover upload with unsupported content type {:?}",
            file.content_type
        );
        return None;
    };

    let name = file
        .filename
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    write_cover(covers_dir, &file.bytes, ext, name).await
}

/// Fetch a cover from a URL. Any failure is logged and ignored.
pub async fn download_url(
    http: &reqwest::Client,
    covers_dir: &Path,
    url: &str,
) -> Option<CoverImage> {
    let response = match http.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("Cover download failed for {}: {}", url, e);
            return None;
        }
    };
    if !response.status().is_success() {
        warn!("Cover download for {} returned {}", url, response.status());
        return None;
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let Some(ext) = extension_for(content_type.as_deref()) else {
        warn!(
            "Cover download for {} has unsupported content type {:?}",
            url, content_type
        );
        return None;
    };

    let bytes = match response.bytes().await {
        Ok(b) => b,
        Err(e) => {
            warn!("Cover download body failed for {}: {}", url, e);
            return None;
        }
    };
    if bytes.is_empty() || bytes.len() > MAX_COVER_BYTES {
        warn!("Cover download for {} has unusable size {}", url, bytes.len());
        return None;
    }

    write_cover(covers_dir, &bytes, ext, DEFAULT_NAME.to_string()).await
}

async fn write_cover(
    covers_dir: &Path,
    bytes: &[u8],
    ext: &str,
    name: String,
) -> Option<CoverImage> {
    let stored = format!("{}.{}", Uuid::new_v4(), ext);
    let path = covers_dir.join(&stored);
    if let Err(e) = tokio::fs::write(&path, bytes).await {
        warn!("Failed to store cover at {}: {}", path.display(), e);
        return None;
    }
    Some(CoverImage {
        name,
        url: format!("/uploads/covers/{}", stored),
    })
}

/// Delete a stored cover file. A file already gone is not an error.
pub async fn delete(covers_dir: &Path, cover: &CoverImage) {
    let Some(file_name) = cover.url.rsplit('/').next().filter(|n| !n.is_empty()) else {
        return;
    };
    let path = covers_dir.join(file_name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to delete cover {}: {}", path.display(), e),
    }
}
