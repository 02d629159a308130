//! URL handling module for Sumi-Frontier
//!
//! This module provides URL canonicalization, host validation, link
//! resolution, and host scope matching. Every URL is normalized before it
//! touches the store, which is what makes the store's one-record-per-URL
//! guarantee hold.

mod host;
mod matcher;
mod normalize;

pub use host::{is_domain_name, validate_host};
pub use matcher::{in_scope, matches_wildcard};
pub use normalize::{normalize, normalize_bytes, normalize_in_place};

use url::Url;

/// Schemes that never lead to a fetchable page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves a link href against the page it was found on and normalizes it
///
/// Returns `None` if the link should not be followed:
/// - empty or fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - anything the normalizer rejects
///
/// # Examples
///
/// ```
/// use sumi_frontier::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/index.html").unwrap();
/// let link = resolve(&base, "../about/#team").unwrap();
/// assert_eq!(link.as_str(), "https://example.com/about/");
/// ```
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    let mut joined = base.join(href).ok()?;
    match normalize_in_place(&mut joined) {
        Ok(()) => Some(joined),
        Err(e) => {
            tracing::debug!("Dropping link {} from {}: {}", href, base, e);
            None
        }
    }
}
