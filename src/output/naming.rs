//! Filesystem-safe naming for the mirrored tree.
//!
//! Category folders and file names are derived from arbitrary page text and
//! URL path segments, so everything written to disk goes through [`slugify`]
//! or [`filename_from_url`] first.

use percent_encoding::percent_decode_str;
use url::Url;

/// Maximum length of a generated slug.
pub const SLUG_MAX_LEN: usize = 120;

/// Fallback slug when the input reduces to nothing.
const EMPTY_SLUG: &str = "untitled";

/// Extension assumed when a file URL has none.
const DEFAULT_EXTENSION: &str = ".mid";

/// Turns arbitrary text into a lowercase, hyphenated, filesystem-safe slug.
///
/// Whitespace runs and any character outside `[a-z0-9\-_.()]` collapse to a
/// single hyphen; leading/trailing hyphens are trimmed; the result is
/// truncated to `max_len` and falls back to `"untitled"` when empty.
/// Deterministic and pure.
pub fn slugify(text: &str, max_len: usize) -> String {
    let lowered = text.trim().to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut prev_hyphen = false;
    for ch in lowered.chars() {
        let mapped = match ch {
            'a'..='z' | '0'..='9' | '_' | '.' | '(' | ')' => ch,
            _ => '-',
        };
        if mapped == '-' {
            if !prev_hyphen {
                slug.push('-');
                prev_hyphen = true;
            }
        } else {
            slug.push(mapped);
            prev_hyphen = false;
        }
    }

    // Trim, then truncate; the slug is pure ASCII at this point
    let trimmed = slug.trim_matches('-');
    let truncated = &trimmed[..trimmed.len().min(max_len)];

    if truncated.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        truncated.to_string()
    }
}

/// Derives a safe local filename from a download URL.
///
/// Takes the URL's path basename, percent-decodes it, slugifies the root and
/// lowercases the extension, defaulting the extension to `.mid` when absent.
/// The result is non-empty for any syntactically valid URL.
pub fn filename_from_url(url: &Url) -> String {
    let basename = url
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or("");
    let decoded = percent_decode_str(basename).decode_utf8_lossy();

    let (root, ext) = split_extension(&decoded);
    let ext = match ext {
        Some(ext) => ext.to_lowercase(),
        None => DEFAULT_EXTENSION.to_string(),
    };

    format!("{}{}", slugify(root, SLUG_MAX_LEN), ext)
}

/// Splits a basename into root and `.ext`. A run of leading dots alone does
/// not count as an extension separator (`.hidden` has no extension).
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => (&name[..idx], Some(&name[idx..])),
        _ => (name, None),
    }
}
