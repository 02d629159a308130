//! Statistics generation from the URL store
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::UrlStatus;
use crate::storage::Store;
use crate::FrontierError;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Total number of URLs known to the store
    pub total_urls: u64,

    /// Count of URLs by status
    pub urls_by_status: HashMap<UrlStatus, u64>,

    /// Number of successfully fetched pages
    pub visits: u64,
}

impl CrawlStatistics {
    pub fn count(&self, status: UrlStatus) -> u64 {
        self.urls_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Returns true if nothing is left to fetch
    pub fn is_complete(&self) -> bool {
        self.count(UrlStatus::Pending) == 0
    }
}

/// Loads statistics from the store
pub fn load_statistics(store: &dyn Store) -> Result<CrawlStatistics, FrontierError> {
    let mut stats = CrawlStatistics {
        visits: store.visit_count()?,
        ..CrawlStatistics::default()
    };

    for status in UrlStatus::all_statuses() {
        let count = store.count_by_status(status)?;
        stats.total_urls += count;
        if count > 0 {
            stats.urls_by_status.insert(status, count);
        }
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total URLs: {}", stats.total_urls);
    println!("  Pages fetched: {}", stats.visits);
    println!();

    println!("URLs by Status:");
    for status in UrlStatus::all_statuses() {
        let count = stats.count(status);
        let percentage = if stats.total_urls > 0 {
            (count as f64 / stats.total_urls as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    if stats.is_complete() {
        println!("Crawl complete.");
    } else {
        println!(
            "{} URLs still pending; run again to resume.",
            stats.count(UrlStatus::Pending)
        );
    }
}
