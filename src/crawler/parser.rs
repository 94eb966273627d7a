//! Link extraction from catalog markup
//!
//! This module pulls the two link shapes the mirrorer cares about out of
//! raw HTML:
//! - category links on the index page (`/midis/<series>`)
//! - downloadable file links on a series page (`*.mid`, `*.midi`)
//!
//! Extraction is deliberately shallow: anchors are selected and filtered by
//! href shape, not by surrounding document structure, which is enough for
//! the two-level site this tool targets.

use crate::url::normalize_url;
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;
use url::Url;

/// A category ("series") page discovered on the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    /// Human-readable name derived from the href path segment; the
    /// coordinator later prefers the page's own `<h1>` when present
    pub name: String,

    /// Absolute, normalized page URL
    pub url: Url,
}

/// A downloadable file discovered on a category page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLink {
    /// Display name of the category the file belongs to
    pub category_name: String,

    /// Decoded basename of the file URL
    pub title: String,

    /// Absolute, normalized download URL
    pub url: Url,
}

/// Extracts category links from the index page
///
/// Keeps hrefs under the index URL's path prefix, dropping the bare index
/// path itself and any direct file links, so `/midis/evangelion` is a
/// category while `/midis` and `/midis/boo.mid` are not. Entries are
/// deduplicated by normalized URL and ordered by sorted raw href, which
/// makes the result deterministic regardless of markup order.
pub fn extract_category_links(
    index_html: &str,
    index_url: &Url,
    extensions: &[String],
) -> Vec<CategoryLink> {
    let index_path = index_url.path().trim_end_matches('/');
    let prefix = format!("{}/", index_path);

    // BTreeSet both dedups raw hrefs and yields them in sorted order
    let hrefs: BTreeSet<String> = collect_hrefs(index_html).into_iter().collect();

    let mut seen = HashSet::new();
    let mut categories = Vec::new();

    for href in &hrefs {
        if !href.starts_with(&prefix) {
            continue;
        }
        if has_file_extension(href, extensions) {
            continue;
        }

        let url = match normalize_url(href, index_url) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping unresolvable category href {}: {}", href, e);
                continue;
            }
        };
        if !seen.insert(url.to_string()) {
            continue;
        }

        let name = category_name_from_href(href, &prefix);
        categories.push(CategoryLink { name, url });
    }

    categories
}

/// Extracts downloadable file links from a category page
///
/// Keeps hrefs whose path ends in one of the target extensions
/// (case-insensitive, optionally followed by a query string), normalized to
/// absolute URLs and deduplicated by URL with first-seen order preserved.
pub fn extract_file_links(
    category_html: &str,
    category_name: &str,
    base: &Url,
    extensions: &[String],
) -> Vec<FileLink> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for href in collect_hrefs(category_html) {
        if !has_file_extension(&href, extensions) {
            continue;
        }

        let url = match normalize_url(&href, base) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping unresolvable file href {}: {}", href, e);
                continue;
            }
        };
        if !seen.insert(url.to_string()) {
            continue;
        }

        let title = title_from_url(&url);
        files.push(FileLink {
            category_name: category_name.to_string(),
            title,
            url,
        });
    }

    files
}

/// Extracts the first `<h1>` heading text from a page
///
/// Nested markup is stripped and surrounding whitespace trimmed; an absent
/// or empty heading yields `None` so callers can fall back to the
/// path-derived category name.
pub fn extract_heading(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects raw `href` attribute values from all anchors, in document order.
fn collect_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut hrefs = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href.to_string());
            }
        }
    }

    hrefs
}

/// True when the href points at one of the target file extensions,
/// either at the end of the href or right before a query string.
fn has_file_extension(href: &str, extensions: &[String]) -> bool {
    let lowered = href.to_lowercase();
    extensions.iter().any(|ext| {
        let suffix = format!(".{}", ext.to_lowercase());
        lowered.ends_with(&suffix) || lowered.contains(&format!("{}?", suffix))
    })
}

/// Readable provisional name from the path segment after the catalog prefix:
/// percent-decoded, hyphens to spaces, trimmed; falls back to the raw href.
fn category_name_from_href(href: &str, prefix: &str) -> String {
    let segment = href.strip_prefix(prefix).unwrap_or(href);
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    let name = decoded.replace('-', " ").trim().to_string();

    if name.is_empty() {
        href.to_string()
    } else {
        name
    }
}

fn title_from_url(url: &Url) -> String {
    let basename = url
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or("");
    percent_decode_str(basename).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_url() -> Url {
        Url::parse("https://example.com/midis").unwrap()
    }

    fn extensions() -> Vec<String> {
        vec!["mid".to_string(), "midi".to_string()]
    }

    #[test]
    fn test_categories_exclude_index_and_file_links() {
        let html = r#"<html><body>
            <a href="/midis">All series</a>
            <a href="/midis/evangelion">Evangelion</a>
            <a href="/midis/boo.mid">Boo</a>
        </body></html>"#;

        let categories = extract_category_links(html, &index_url(), &extensions());

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "evangelion");
        assert_eq!(
            categories[0].url.as_str(),
            "https://example.com/midis/evangelion"
        );
    }

    #[test]
    fn test_categories_ignore_links_outside_prefix() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="/midis/slayers">Slayers</a>
            <a href="https://elsewhere.com/midis/x">Elsewhere</a>
        </body></html>"#;

        let categories = extract_category_links(html, &index_url(), &extensions());
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "slayers");
    }

    #[test]
    fn test_categories_are_sorted_and_deduplicated() {
        let html = r#"<html><body>
            <a href="/midis/slayers">Slayers</a>
            <a href="/midis/evangelion">Eva</a>
            <a href="/midis/slayers">Slayers again</a>
        </body></html>"#;

        let categories = extract_category_links(html, &index_url(), &extensions());

        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["evangelion", "slayers"]);
    }

    #[test]
    fn test_category_name_decodes_and_despaces() {
        let html = r#"<a href="/midis/ah-my-goddess">x</a>
                      <a href="/midis/Cowboy%20Bebop">y</a>"#;

        let categories = extract_category_links(html, &index_url(), &extensions());

        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Cowboy Bebop", "ah my goddess"]);
    }

    #[test]
    fn test_categories_with_single_quoted_href() {
        let html = r#"<html><body><a href='/midis/trigun'>Trigun</a></body></html>"#;
        let categories = extract_category_links(html, &index_url(), &extensions());
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "trigun");
    }

    #[test]
    fn test_midi_extension_is_not_a_category() {
        let html = r#"<a href="/midis/song.MIDI">x</a><a href="/midis/song.mid?dl=1">y</a>"#;
        let categories = extract_category_links(html, &index_url(), &extensions());
        assert!(categories.is_empty());
    }

    #[test]
    fn test_file_links_basic() {
        let html = r#"<html><body>
            <a href="/midis/Evangelion%20-%20Angel%20Attack.mid">Angel Attack</a>
            <a href="/midis/evangelion">Back to series</a>
        </body></html>"#;

        let files = extract_file_links(html, "Evangelion", &index_url(), &extensions());

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].category_name, "Evangelion");
        assert_eq!(files[0].title, "Evangelion - Angel Attack.mid");
        assert_eq!(
            files[0].url.as_str(),
            "https://example.com/midis/Evangelion%20-%20Angel%20Attack.mid"
        );
    }

    #[test]
    fn test_duplicate_raw_and_encoded_hrefs_collapse() {
        // The same link appears once raw and once percent-encoded; both
        // normalize to one URL and the first occurrence wins
        let html = r#"<html><body>
            <a href="https://example.com/midis/Ah! My Goddess - Opening.mid">one</a>
            <a href="https://example.com/midis/Ah!%20My%20Goddess%20-%20Opening.mid">two</a>
        </body></html>"#;

        let files = extract_file_links(html, "Ah! My Goddess", &index_url(), &extensions());

        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0].url.as_str(),
            "https://example.com/midis/Ah!%20My%20Goddess%20-%20Opening.mid"
        );
        assert_eq!(files[0].title, "Ah! My Goddess - Opening.mid");
    }

    #[test]
    fn test_file_links_preserve_first_seen_order() {
        let html = r#"
            <a href="/midis/b.mid">b</a>
            <a href="/midis/a.mid">a</a>
            <a href="/midis/b.mid">b again</a>
        "#;

        let files = extract_file_links(html, "x", &index_url(), &extensions());

        let titles: Vec<&str> = files.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["b.mid", "a.mid"]);
    }

    #[test]
    fn test_file_extension_matching_is_case_insensitive_and_query_aware() {
        let html = r#"
            <a href="/midis/a.MID">a</a>
            <a href="/midis/b.midi?download=1">b</a>
            <a href="/midis/c.midx">not a midi</a>
            <a href="/midis/d.mid#intro">fragment does not count</a>
        "#;

        let files = extract_file_links(html, "x", &index_url(), &extensions());

        let titles: Vec<&str> = files.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["a.MID", "b.midi"]);
    }

    #[test]
    fn test_extract_heading() {
        let html = r#"<html><body><h1>Neon Genesis Evangelion</h1></body></html>"#;
        assert_eq!(
            extract_heading(html),
            Some("Neon Genesis Evangelion".to_string())
        );
    }

    #[test]
    fn test_extract_heading_strips_nested_markup() {
        let html = r#"<h1> <em>Ah!</em> My <b>Goddess</b> </h1>"#;
        assert_eq!(extract_heading(html), Some("Ah! My Goddess".to_string()));
    }

    #[test]
    fn test_extract_heading_missing_or_empty() {
        assert_eq!(extract_heading("<html><body>no heading</body></html>"), None);
        assert_eq!(extract_heading("<h1>   </h1>"), None);
    }

    #[test]
    fn test_extract_heading_takes_first() {
        let html = r#"<h1>First</h1><h1>Second</h1>"#;
        assert_eq!(extract_heading(html), Some("First".to_string()));
    }
}
