use url::Url;

/// Checks if a host matches a scope pattern
///
/// Two pattern forms are supported:
/// 1. Exact: `example.com` matches only `example.com`
/// 2. Wildcard: `*.example.com` matches `example.com` and every subdomain
///
/// Hosts are expected to be canonical (see [`crate::url::normalize`]), so the
/// comparison is case-sensitive.
///
/// # Examples
///
/// ```
/// use sumi_frontier::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base
            || candidate
                .strip_suffix(base)
                .is_some_and(|prefix| prefix.ends_with('.'))
    } else {
        candidate == pattern
    }
}

/// Returns true if the URL's host matches any of the scope patterns
pub fn in_scope(patterns: &[String], url: &Url) -> bool {
    match url.host_str() {
        Some(host) => patterns.iter().any(|p| matches_wildcard(p, host)),
        None => false,
    }
}
