use url::{ParseError, Url};

pub fn to_url(raw: &str) -> Result<Url, ParseError> {
    Url::parse(raw.trim())
}

pub fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Last non-empty path segment, used to name the staged download.
pub fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(String::from)
}
