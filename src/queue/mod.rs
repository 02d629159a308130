//! Priority wait queue
//!
//! The wait queue holds items that are not yet due and releases each one's
//! URL once its scheduled time has passed. The scheduler talks to it only
//! through three channels:
//! - an ingress for new items
//! - an egress of due URLs, which closes when the queue shuts down
//! - an error egress for fatal internal failures

mod timer;

pub use timer::TimerQueue;

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

/// Errors reported by a wait queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Wait queue channels were already taken")]
    ChannelsTaken,

    #[error("Wait queue failure: {0}")]
    Internal(String),
}

/// A URL waiting for its scheduled time
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// The canonical URL
    pub url: Url,

    /// The item must not be released before this time
    pub next: DateTime<Utc>,

    /// Policy-assigned priority; higher scores are released first among items
    /// due at the same time
    pub score: i64,
}

impl QueueItem {
    pub fn new(url: Url, next: DateTime<Utc>, score: i64) -> Self {
        Self { url, next, score }
    }

    /// Returns true if the item may be released at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next <= now
    }
}

// Ordering for the max-heap: the earliest `next` is greatest, then the highest
// score, then the URL for a stable order.
impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .next
            .cmp(&self.next)
            .then_with(|| self.score.cmp(&other.score))
            .then_with(|| other.url.as_str().cmp(self.url.as_str()))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

/// The channel ends a wait queue hands to its single consumer
#[derive(Debug)]
pub struct QueueChannels {
    /// Items not yet due
    pub ingress: mpsc::Sender<QueueItem>,

    /// URLs whose time has come; `None` from `recv` means the queue shut down
    pub egress: mpsc::Receiver<Url>,

    /// Fatal internal failures
    pub errors: mpsc::Receiver<QueueError>,
}

/// Contract for a priority wait queue
///
/// Implementations manage their own timing (a timer, a periodic scan, or an
/// external service). They must tolerate one producer and one consumer.
pub trait WaitQueue: Send {
    /// Hands out the queue's channels; may only succeed once
    fn channels(&mut self) -> Result<QueueChannels, QueueError>;

    /// Shuts the queue down, abandoning pending items and closing the egress
    ///
    /// Calling this more than once is harmless.
    fn close(&mut self) -> Result<(), QueueError>;
}
