use thiserror::Error;
use url::Url;

/// A URL that cannot be turned into an absolute request target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("invalid URL: {0}")]
    Invalid(#[from] url::ParseError),
}

/// Resolve `url` against `base` the way a browser resolves a link.
///
/// The result must be `http` or `https`; protocol-relative links take the
/// base's scheme.
pub fn resolve_url(base: &str, url: &str) -> Result<String, UrlError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(UrlError::Empty);
    }
    let joined = Url::parse(base)?.join(url)?;
    match joined.scheme() {
        "http" | "https" => Ok(joined.into()),
        other => Err(UrlError::UnsupportedScheme(other.to_string())),
    }
}

/// Parse an absolute URL, or a site-relative one such as `/series/x?page=2`.
fn parse_lenient(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://relative.invalid/")
            .and_then(|base| base.join(url))
            .ok(),
        Err(_) => None,
    }
}

/// Last non-empty path segment of a URL, still percent-encoded.
pub fn slug_from_url(url: &str) -> Option<String> {
    parse_lenient(url)?
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

/// Host part of an absolute URL, lower-cased.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_ascii_lowercase)
}

/// Path part of a URL, without query or fragment.
pub fn path_of(url: &str) -> Option<String> {
    parse_lenient(url).map(|u| u.path().to_string())
}

/// First non-empty, decoded value of query parameter `key`.
pub fn query_value(url: &str, key: &str) -> Option<String> {
    parse_lenient(url)?
        .query_pairs()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

/// `"the-office"` → `"The Office"`. Used when a listing carries no title.
pub fn title_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
