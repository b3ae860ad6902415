//! Request URLs under the bus-info API base.

use url::Url;

/// Parses the API base. URLs that cannot carry a path (`mailto:` and the like) are rejected.
pub fn parse_base(api_url: &str) -> Option<Url> {
    Url::parse(api_url)
        .ok()
        .filter(|url| !url.cannot_be_a_base())
}

/// Appends `segments` to the base path and `query` to its query string.
///
/// Segments are percent-encoded whole, so a `/`, `?` or `#` inside an id stays
/// part of that id.
pub fn endpoint(base: &Url, segments: &[&str], query: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    url
}
