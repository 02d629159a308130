//! Sumi-Frontier: the frontier-management core of a polite web crawler
//!
//! This crate decides, for every discovered URL, whether, when, and in what
//! order it is fetched. It enforces revisit delays, retry limits, and global
//! termination, and canonicalizes URLs so that every resource has exactly one
//! record in the store.

pub mod config;
pub mod crawler;
pub mod output;
pub mod policy;
pub mod queue;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Frontier operations
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Wait queue error: {0}")]
    QueueError(#[from] queue::QueueError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scheduler is no longer accepting {0}")]
    SchedulerClosed(&'static str),

    #[error("Scheduled time out of range: {0}")]
    TimeOutOfRange(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL validation errors produced by the normalizer
///
/// These are always recoverable: the offending URL is simply never scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("normalize URL: invalid UTF-8 string: {0:?}")]
    InvalidEncoding(String),

    #[error("normalize URL: failed to parse: {0}")]
    Parse(String),

    #[error("normalize URL: unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("normalize URL: empty host")]
    EmptyHost,

    #[error("normalize URL: invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("normalize URL: malformed: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Frontier operations
pub type Result<T> = std::result::Result<T, FrontierError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, Link, Response};
pub use policy::{Context, Decision, Policy, UrlKind};
pub use state::{UrlRecord, UrlStatus};
pub use crate::url::{normalize, normalize_bytes};
