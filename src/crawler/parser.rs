//! HTML link extraction
//!
//! Collects the links to follow from `<a>` tags and canonical links.

use crate::crawler::response::Link;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the canonical outbound links of an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<link rel="stylesheet" ...>`, `<script src="...">`, `<img src="...">`
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Anything that fails URL normalization
///
/// `rel="nofollow"` links are followed. Links that normalize to the same URL
/// are returned once, with the anchor text of the first.
///
/// # Example
///
/// ```
/// use sumi_frontier::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links[0].url.as_str(), "https://example.com/page");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Link> {
    collect_links(&Html::parse_document(html), base_url)
}

fn collect_links(document: &Html, base_url: &Url) -> Vec<Link> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut push = |href: &str, anchor: Option<String>| {
        if let Some(url) = crate::url::resolve(base_url, href) {
            if seen.insert(url.as_str().to_string()) {
                links.push(Link { url, anchor });
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                push(href, anchor_text(&element));
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href, None);
            }
        }
    }

    links
}

fn anchor_text(element: &ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
