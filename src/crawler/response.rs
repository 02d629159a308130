//! Fetched pages and the links discovered on them

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

/// An outbound link discovered on a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Canonical target URL
    pub url: Url,

    /// Visible anchor text, if any
    pub anchor: Option<String>,
}

impl Link {
    pub fn new(url: Url) -> Self {
        Self { url, anchor: None }
    }
}

/// A successfully fetched page
///
/// Built by the fetch layer and consumed once by the scheduler, which drops it
/// after recording the visit and scheduling its links.
#[derive(Debug, Clone)]
pub struct Response {
    /// Canonical URL that was requested
    pub url: Url,

    /// When the response was received
    pub timestamp: DateTime<Utc>,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Page body
    pub body: String,

    /// Outbound links chosen by the policy
    pub links: Vec<Link>,
}

impl Response {
    /// Creates an empty response for `url` received now
    pub fn new(url: Url, status: u16) -> Self {
        Self {
            url,
            timestamp: Utc::now(),
            status,
            content_type: None,
            body: String::new(),
            links: Vec::new(),
        }
    }

    /// Returns true if the body is an HTML document
    ///
    /// A missing Content-Type is treated as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            })
            .unwrap_or(true)
    }

    /// Parses the body as an HTML document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// Returns the trimmed text of the first element matching `selector`
    pub fn find_text(&self, selector: &str) -> Option<String> {
        let selector = parse_selector(selector)?;
        let document = self.document();
        let text = document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string());
        text
    }

    /// Returns the value of `attr` on every element matching `selector`
    pub fn find_attr(&self, selector: &str, attr: &str) -> Vec<String> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let document = self.document();
        let values = document
            .select(&selector)
            .filter_map(|element| element.value().attr(attr).map(str::to_string))
            .collect();
        values
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!("Invalid CSS selector '{}': {:?}", selector, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Response {
        let mut response = Response::new(Url::parse("https://example.com/").unwrap(), 200);
        response.content_type = Some("text/html; charset=utf-8".to_string());
        response.body = body.to_string();
        response
    }

    #[test]
    fn test_find_text_and_attr() {
        let response = page(
            r#"<html><body>
            <div class="foo"> bar </div>
            <div id="hello" key="value">Hello, world!</div>
            </body></html>"#,
        );

        assert_eq!(response.find_text("div.foo"), Some("bar".to_string()));
        assert_eq!(response.find_attr("div#hello", "key"), vec!["value"]);
        assert_eq!(response.find_text("span"), None);
        assert!(response.find_attr("div.foo", "key").is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        let response = page("<p>x</p>");
        assert_eq!(response.find_text("<<<"), None);
        assert!(response.find_attr("<<<", "href").is_empty());
    }

    #[test]
    fn test_is_html() {
        let mut response = page("");
        assert!(response.is_html());

        response.content_type = Some("application/pdf".to_string());
        assert!(!response.is_html());

        response.content_type = None;
        assert!(response.is_html());
    }
}
