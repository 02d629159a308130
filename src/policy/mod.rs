//! Crawl policies
//!
//! A policy decides, for each URL the scheduler considers, whether it should be
//! fetched, not before when, and with what priority. It also chooses which
//! links of a fetched page are followed.

mod builtin;

pub use builtin::{HandleOnce, VisitOnce};

use crate::crawler::{extract_links, Link, Response};
use crate::state::UrlRecord;
use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;

/// Why the scheduler is asking for a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// A seed handed to the crawler
    Seed,
    /// A pending URL replayed from the store after a restart
    Recover,
    /// A link discovered on a fetched page
    New,
    /// The URL of a page that was just fetched
    Response,
}

impl fmt::Display for UrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrlKind::Seed => "seed",
            UrlKind::Recover => "recover",
            UrlKind::New => "new",
            UrlKind::Response => "response",
        };
        f.write_str(s)
    }
}

/// Everything a policy may look at when deciding about one URL
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub kind: UrlKind,
    pub url: &'a Url,
    /// Snapshot of the URL's record, after the visit was recorded for
    /// [`UrlKind::Response`]
    pub record: &'a UrlRecord,
    /// The page that triggered the decision, for `New` and `Response`
    pub response: Option<&'a Response>,
}

/// Outcome of a scheduling decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The URL needs no further fetching and is marked finished
    Done,
    /// Fetch the URL no earlier than `next`
    ///
    /// The scheduler moves `next` forward if it falls inside the minimum
    /// revisit delay.
    Visit { next: DateTime<Utc>, score: i64 },
}

impl Decision {
    /// Visit as soon as allowed with a neutral score
    pub fn now() -> Self {
        Decision::Visit {
            next: Utc::now(),
            score: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Decision::Done)
    }
}

/// Pluggable crawl decision logic
pub trait Policy: Send + Sync {
    /// Decides what happens to the URL in `ctx`
    fn schedule(&self, ctx: &Context<'_>) -> Decision;

    /// Collects the links of `response` that should be considered for crawling
    ///
    /// The default follows every `<a href>` and canonical link of HTML pages.
    fn handle(&self, response: &Response, links: &mut Vec<Link>) {
        if response.is_html() {
            links.extend(extract_links(&response.body, &response.url));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Everything;

    impl Policy for Everything {
        fn schedule(&self, _ctx: &Context<'_>) -> Decision {
            Decision::now()
        }
    }

    #[test]
    fn test_default_handle_extracts_html_links() {
        let mut response = Response::new(Url::parse("https://example.com/").unwrap(), 200);
        response.content_type = Some("text/html".to_string());
        response.body = r#"<a href="/a">A</a><a href="mailto:x@example.com">M</a>"#.to_string();

        let mut links = Vec::new();
        Everything.handle(&response, &mut links);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url.as_str(), "https://example.com/a");
    }

    #[test]
    fn test_default_handle_ignores_non_html() {
        let mut response = Response::new(Url::parse("https://example.com/f").unwrap(), 200);
        response.content_type = Some("application/json".to_string());
        response.body = r#"{"href": "<a href='/a'>"}"#.to_string();

        let mut links = Vec::new();
        Everything.handle(&response, &mut links);
        assert!(links.is_empty());
    }

    #[test]
    fn test_decision_now() {
        assert!(!Decision::now().is_done());
        assert!(Decision::Done.is_done());
        assert_eq!(UrlKind::Recover.to_string(), "recover");
    }
}
