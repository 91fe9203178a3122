//! Endpoint assembly
//!
//! `base url / version / namespace / id / action`, skipping empty parts.

/// Join the non-empty endpoint segments with single separators
///
/// Separators at segment edges are trimmed so the result never holds a
/// doubled or trailing `/`. The resource id is percent-encoded; the other
/// segments are used as given, so an action like `posts/recent` spans two
/// path segments.
pub fn assemble_endpoint(
    base_url: &str,
    version: Option<&str>,
    namespace: Option<&str>,
    id: Option<&str>,
    action: Option<&str>,
) -> String {
    let id = id
        .map(|id| id.trim_matches('/'))
        .filter(|id| !id.is_empty())
        .map(|id| urlencoding::encode(id).into_owned());

    let mut endpoint = base_url.trim_end_matches('/').to_string();

    for segment in [version, namespace, id.as_deref(), action]
        .into_iter()
        .flatten()
    {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        if !endpoint.is_empty() {
            endpoint.push('/');
        }
        endpoint.push_str(segment);
    }

    endpoint
}
