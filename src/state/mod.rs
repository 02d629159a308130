//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlStatus`: lifecycle of a canonical URL (pending, finished, error)
//! - `UrlRecord`: per-URL visit metadata kept by the store

mod record;
mod url_status;

// Re-export main types
pub use record::{checked_offset, UrlRecord};
pub use url_status::UrlStatus;
