//! Output module for crawl statistics
//!
//! This module reads the store after (or during) a crawl and reports how many
//! URLs ended up in each status.

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
