use crate::{UrlError, UrlResult};
use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters escaped in the path component. Everything non-alphanumeric is
/// escaped except the URL path separators and the punctuation the catalog
/// uses in file names.
const PATH_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'(')
    .remove(b')')
    .remove(b'!')
    .remove(b'.')
    .remove(b',')
    .remove(b';')
    .remove(b':')
    .remove(b'@')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Characters escaped in the query component; `=` and `&` stay raw so
/// key-value structure survives, spaces become `+` afterwards.
const QUERY_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'=')
    .remove(b'&')
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Characters escaped in the fragment component: everything but unreserved.
const FRAGMENT_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Normalizes a possibly relative, possibly half-encoded href into an
/// absolute, canonically percent-encoded URL.
///
/// Catalog pages contain hrefs like `/midis/Ah! My Goddess - Opening.mid`
/// (raw spaces and punctuation) as well as already-encoded forms of the same
/// link. Both are brought to one canonical form:
///
/// 1. Resolve the href against `base` (relative paths, `..` segments and
///    protocol-relative hrefs all resolve).
/// 2. Percent-decode path, query, and fragment, then re-encode each with a
///    strict allow-list ([`PATH_ESCAPES`], [`QUERY_ESCAPES`],
///    [`FRAGMENT_ESCAPES`]); the query keeps `+` for spaces.
///
/// The decode-then-encode pass makes the function idempotent: normalizing an
/// already-normalized URL yields the same URL. The encoding passes operate on
/// raw bytes and never fail; only an href that cannot be resolved into a
/// syntactically valid HTTP(S) URL returns an error, which callers treat as
/// a skippable link.
///
/// # Examples
///
/// ```
/// use midi_mirror::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/midis").unwrap();
/// let url = normalize_url("/midis/Ah! My Goddess - Opening.mid", &base).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://example.com/midis/Ah!%20My%20Goddess%20-%20Opening.mid"
/// );
/// ```
pub fn normalize_url(href: &str, base: &Url) -> UrlResult<Url> {
    let mut url = base.join(href).map_err(|source| UrlError::Join {
        href: href.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let path = encode_path(url.path());
    url.set_path(&path);

    let query = url
        .query()
        .filter(|q| !q.is_empty())
        .map(encode_query);
    url.set_query(query.as_deref());

    let fragment = url
        .fragment()
        .filter(|f| !f.is_empty())
        .map(encode_fragment);
    url.set_fragment(fragment.as_deref());

    Ok(url)
}

/// Decodes any existing percent-escapes, then re-encodes with the path
/// allow-list. Total over arbitrary byte sequences.
fn encode_path(raw: &str) -> String {
    let decoded: Vec<u8> = percent_decode_str(raw).collect();
    percent_encode(&decoded, PATH_ESCAPES).to_string()
}

/// Query normalization treats `+` as an encoded space on the way in and
/// produces `+` for spaces on the way out.
fn encode_query(raw: &str) -> String {
    let decoded: Vec<u8> = percent_decode_str(&raw.replace('+', " ")).collect();
    percent_encode(&decoded, QUERY_ESCAPES)
        .to_string()
        .replace("%20", "+")
}

fn encode_fragment(raw: &str) -> String {
    let decoded: Vec<u8> = percent_decode_str(raw).collect();
    percent_encode(&decoded, FRAGMENT_ESCAPES).to_string()
}
