//! Built-in policies

use crate::crawler::{Link, Response};
use crate::policy::{Context, Decision, Policy};
use crate::url::in_scope;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fetches every URL exactly once
///
/// With a non-empty scope, only URLs whose host matches one of the patterns
/// (`example.com` or `*.example.com`) are fetched; all others are done
/// immediately.
#[derive(Debug, Clone, Default)]
pub struct VisitOnce {
    scope: Vec<String>,
}

impl VisitOnce {
    /// Visits everything reachable, on any host
    pub fn new() -> Self {
        Self::default()
    }

    /// Visits only hosts matching `scope`
    ///
    /// Patterns are lower-cased to match canonical hosts.
    pub fn with_scope(scope: Vec<String>) -> Self {
        Self {
            scope: scope.into_iter().map(|p| p.to_ascii_lowercase()).collect(),
        }
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }
}

impl Policy for VisitOnce {
    fn schedule(&self, ctx: &Context<'_>) -> Decision {
        if ctx.record.visit_count >= 1 {
            return Decision::Done;
        }

        if !self.scope.is_empty() && !in_scope(&self.scope, ctx.url) {
            tracing::trace!("{} is out of scope", ctx.url);
            return Decision::Done;
        }

        Decision::now()
    }
}

/// Runs the inner policy's link handling for the first response only
///
/// Scheduling is delegated unchanged. Useful for fetching a set of pages
/// without following what they link to beyond the first.
#[derive(Debug, Default)]
pub struct HandleOnce<P> {
    inner: P,
    handled: AtomicBool,
}

impl<P: Policy> HandleOnce<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            handled: AtomicBool::new(false),
        }
    }
}

impl<P: Policy> Policy for HandleOnce<P> {
    fn schedule(&self, ctx: &Context<'_>) -> Decision {
        self.inner.schedule(ctx)
    }

    fn handle(&self, response: &Response, links: &mut Vec<Link>) {
        if !self.handled.swap(true, Ordering::SeqCst) {
            self.inner.handle(response, links);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::UrlKind;
    use crate::state::UrlRecord;
    use url::Url;

    fn decide(policy: &dyn Policy, url: &str, visit_count: u32) -> Decision {
        let url = Url::parse(url).unwrap();
        let mut record = UrlRecord::new(url.clone());
        record.visit_count = visit_count;
        policy.schedule(&Context {
            kind: UrlKind::New,
            url: &url,
            record: &record,
            response: None,
        })
    }

    #[test]
    fn test_visit_once() {
        let policy = VisitOnce::new();
        assert!(!decide(&policy, "https://example.com/", 0).is_done());
        assert!(decide(&policy, "https://example.com/", 1).is_done());
        assert!(!decide(&policy, "https://anywhere.org/", 0).is_done());
    }

    #[test]
    fn test_visit_once_scope() {
        let policy = VisitOnce::with_scope(vec!["*.example.com".to_string()]);
        assert!(!decide(&policy, "https://example.com/", 0).is_done());
        assert!(!decide(&policy, "https://blog.example.com/x", 0).is_done());
        assert!(decide(&policy, "https://example.org/", 0).is_done());
    }

    #[test]
    fn test_scope_patterns_are_case_insensitive() {
        let policy =
            VisitOnce::with_scope(vec!["Example.COM".to_string(), "*.Docs.Example.org".to_string()]);
        assert_eq!(policy.scope(), ["example.com", "*.docs.example.org"]);

        assert!(!decide(&policy, "https://EXAMPLE.com/", 0).is_done());
        assert!(!decide(&policy, "https://api.docs.example.org/", 0).is_done());
        assert!(decide(&policy, "https://example.org/", 0).is_done());
    }

    #[test]
    fn test_handle_once() {
        let policy = HandleOnce::new(VisitOnce::new());
        let mut response = Response::new(Url::parse("https://example.com/").unwrap(), 200);
        response.body = r#"<a href="/a">A</a>"#.to_string();

        let mut first = Vec::new();
        policy.handle(&response, &mut first);
        assert_eq!(first.len(), 1);

        let mut second = Vec::new();
        policy.handle(&response, &mut second);
        assert!(second.is_empty());

        assert!(decide(&policy, "https://example.com/", 1).is_done());
    }
}
