//! Crawler module for scheduling, fetching and link extraction
//!
//! This module contains the core crawling logic, including:
//! - The frontier scheduler and its event loop
//! - HTTP fetching with outcome classification
//! - HTML parsing and link extraction
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod response;
mod scheduler;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, fetch_url, spawn_fetchers, FetchOutcome};
pub use parser::extract_links;
pub use response::{Link, Response};
pub use scheduler::{Scheduler, SchedulerHandle, SeedingGuard};

use crate::config::Config;
use crate::policy::{Policy, VisitOnce};
use crate::storage::Store;
use crate::FrontierError;
use std::sync::Arc;

/// Builds the built-in policy described by the configuration
///
/// `VisitOnce` restricted to the configured scope, or to the hosts of the
/// seeds when no scope is configured.
pub fn default_policy(config: &Config) -> Arc<dyn Policy> {
    let scope = if config.policy.scope.is_empty() {
        let mut hosts: Vec<String> = config
            .seeds
            .iter()
            .filter_map(|seed| crate::url::normalize(seed).ok())
            .filter_map(|url| url.host_str().map(str::to_string))
            .collect();
        hosts.sort();
        hosts.dedup();
        hosts
    } else {
        config.policy.scope.clone()
    };

    Arc::new(VisitOnce::with_scope(scope))
}

/// Runs a complete crawl of the configured seeds
///
/// This is the main entry point used by the binary. It will:
/// 1. Start the scheduler and fetch pool on `store`
/// 2. Recover any URLs left pending by a previous run
/// 3. Seed the configured URLs
/// 4. Wait until no pending URL remains, or until ctrl-c
pub async fn crawl(config: &Config, store: Arc<dyn Store>) -> Result<(), FrontierError> {
    if config.seeds.is_empty() && store.is_finished()? {
        tracing::warn!("No seeds configured and nothing pending, nothing to crawl");
        return Ok(());
    }

    let crawler = Crawler::start(config, store, default_policy(config))?;

    let token = crawler.shutdown_token();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    tracing::warn!("Interrupted, stopping crawl; pending URLs are kept");
                }
                token.cancel();
            }
        }
    });

    let seeding = crawler.handle().hold();
    for seed in &config.seeds {
        if let Err(e) = crawler.crawl(seed).await {
            tracing::error!("Failed to seed {}: {}", seed, e);
        }
    }
    drop(seeding);

    crawler.wait().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Context, UrlKind};
    use crate::state::UrlRecord;
    use url::Url;

    #[test]
    fn test_default_policy_scopes_to_seed_hosts() {
        let config = Config {
            seeds: vec![
                "https://Example.com/".to_string(),
                "https://example.com/docs".to_string(),
            ],
            ..Config::default()
        };
        let policy = default_policy(&config);

        let decide = |s: &str| {
            let url = Url::parse(s).unwrap();
            let record = UrlRecord::new(url.clone());
            policy.schedule(&Context {
                kind: UrlKind::New,
                url: &url,
                record: &record,
                response: None,
            })
        };

        assert!(!decide("https://example.com/other").is_done());
        assert!(decide("https://elsewhere.org/").is_done());
    }
}
