use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Frontier
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    /// URLs to start crawling from
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Scheduler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerConfig {
    /// Capacity of each scheduler input channel; the ready output holds four
    /// times as many URLs
    #[serde(default = "default_scheduler_workers")]
    pub workers: usize,

    /// Minimum time between two visits of the same URL (milliseconds)
    #[serde(default = "default_min_revisit_delay")]
    pub min_revisit_delay: u64,

    /// Delay before a failed fetch is retried (milliseconds)
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Number of failed fetches after which a URL is given up on
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,

    /// Expected number of items waiting in the wait queue at once
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl SchedulerConfig {
    pub fn min_revisit_delay(&self) -> chrono::Duration {
        delay_from_millis(self.min_revisit_delay)
    }

    pub fn retry_delay(&self) -> chrono::Duration {
        delay_from_millis(self.retry_delay)
    }

    /// Capacity of the ready output stream
    pub fn output_capacity(&self) -> usize {
        self.workers * 4
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_scheduler_workers(),
            min_revisit_delay: default_min_revisit_delay(),
            retry_delay: default_retry_delay(),
            max_retry: default_max_retry(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Saturates at the largest representable delay
fn delay_from_millis(ms: u64) -> chrono::Duration {
    i64::try_from(ms)
        .ok()
        .and_then(chrono::Duration::try_milliseconds)
        .unwrap_or(chrono::Duration::MAX)
}

/// HTTP fetch pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Number of concurrent fetch workers
    #[serde(default = "default_fetcher_workers")]
    pub workers: usize,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            workers: default_fetcher_workers(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Path to the SQLite database file; records are kept in memory when unset
    pub database_path: Option<String>,
}

/// Built-in policy configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    /// Host patterns (e.g. "example.com" or "*.example.com") the crawl may
    /// visit; the seed hosts when empty
    #[serde(default)]
    pub scope: Vec<String>,
}

fn default_scheduler_workers() -> usize {
    4
}

fn default_min_revisit_delay() -> u64 {
    1000
}

fn default_retry_delay() -> u64 {
    10_000
}

fn default_max_retry() -> u32 {
    5
}

fn default_queue_capacity() -> usize {
    4096
}

fn default_fetcher_workers() -> usize {
    4
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    30
}
