//! Slug generation and LIKE-pattern escaping
//!
//! Slugs identify catalog entries in public URLs (`/series/breaking-bad`).
//! Uniqueness against the database is handled by
//! [`crate::db::catalog::ensure_unique_slug`]; this module only derives the
//! base slug from a title.

/// Derive a URL slug from a title.
///
/// ASCII alphanumerics are kept lowercased; apostrophes are dropped so a
/// possessive stays one word (`Philosopher's` slugs as `philosophers`);
/// every other character acts as a separator. Separator runs collapse to a
/// single `-` and the result carries no leading or trailing `-`. Titles
/// with no usable characters produce an empty string, so callers must
/// supply their own fallback.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else if c != '\'' && c != '\u{2019}' {
            pending_sep = true;
        }
    }

    out
}

/// Escape `\`, `%` and `_` for use inside a `LIKE ? ESCAPE '\'` pattern.
///
/// Without this a search for `100%` would match any title starting with
/// `100`.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
