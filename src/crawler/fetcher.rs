//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent
//! - GET requests for ready URLs
//! - Classifying each outcome as a page, a permanent miss, or a retry
//! - The worker pool that feeds outcomes back to the scheduler

use crate::config::FetcherConfig;
use crate::crawler::scheduler::SchedulerHandle;
use crate::crawler::Response;
use crate::policy::Policy;
use reqwest::{redirect, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was fetched; links are not extracted yet
    Fetched(Response),

    /// The URL will never yield a page (404, 410 and other client errors)
    Gone {
        /// The HTTP status code
        status_code: u16,
    },

    /// A transient failure worth retrying (429, 5xx, network errors)
    Retry {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sumi_frontier::config::FetcherConfig;
/// use sumi_frontier::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 2xx | Fetched |
/// | HTTP 429 | Retry |
/// | Other 4xx | Gone |
/// | HTTP 5xx | Retry |
/// | Timeout, connection or body error | Retry |
/// | Anything else | Gone |
///
/// Redirects are followed, but the response keeps the requested URL since
/// that is the URL the scheduler tracks.
pub async fn fetch_url(client: &Client, url: &Url) -> FetchOutcome {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            return FetchOutcome::Retry { error };
        }
    };

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return FetchOutcome::Retry {
            error: format!("HTTP {}", status.as_u16()),
        };
    }

    if !status.is_success() {
        return FetchOutcome::Gone {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match response.text().await {
        Ok(body) => {
            let mut page = Response::new(url.clone(), status.as_u16());
            page.content_type = content_type;
            page.body = body;
            FetchOutcome::Fetched(page)
        }
        Err(e) => FetchOutcome::Retry {
            error: format!("Failed to read body: {}", e),
        },
    }
}

/// Spawns `count` fetch workers sharing the ready stream
///
/// Workers exit when the stream closes, when the scheduler stops accepting
/// results, or when `shutdown` fires.
pub fn spawn_fetchers(
    count: usize,
    client: Client,
    policy: Arc<dyn Policy>,
    ready: mpsc::Receiver<Url>,
    scheduler: SchedulerHandle,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let ready = Arc::new(Mutex::new(ready));

    (0..count.max(1))
        .map(|id| {
            tokio::spawn(run_fetcher(
                id,
                client.clone(),
                policy.clone(),
                ready.clone(),
                scheduler.clone(),
                shutdown.clone(),
            ))
        })
        .collect()
}

async fn run_fetcher(
    id: usize,
    client: Client,
    policy: Arc<dyn Policy>,
    ready: Arc<Mutex<mpsc::Receiver<Url>>>,
    scheduler: SchedulerHandle,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            url = async { ready.lock().await.recv().await } => url,
        };
        let Some(url) = next else { break };

        tracing::debug!("Fetcher {} fetching {}", id, url);
        let outcome = tokio::select! {
            _ = shutdown.cancelled() => break,
            outcome = fetch_url(&client, &url) => outcome,
        };

        let sent = match outcome {
            FetchOutcome::Fetched(mut response) => {
                let mut links = Vec::new();
                policy.handle(&response, &mut links);
                tracing::info!(
                    "Fetched {} ({}, {} links)",
                    url,
                    response.status,
                    links.len()
                );
                response.links = links;
                scheduler.response(response).await
            }
            FetchOutcome::Gone { status_code } => {
                tracing::info!("{} returned HTTP {}, not retrying", url, status_code);
                scheduler.done(url).await
            }
            FetchOutcome::Retry { error } => {
                tracing::warn!("Failed to fetch {}: {}", url, error);
                scheduler.error(url).await
            }
        };

        if sent.is_err() {
            break;
        }
    }

    tracing::debug!("Fetcher {} stopped", id);
}
