//! Timer-heap wait queue
//!
//! A tokio task owns a binary heap of pending items and sleeps until the
//! earliest one is due.

use crate::queue::{QueueChannels, QueueError, QueueItem, WaitQueue};
use chrono::Utc;
use std::collections::BinaryHeap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Depth of the ingress and egress channels
const CHANNEL_DEPTH: usize = 64;

/// In-process wait queue driven by a tokio timer
pub struct TimerQueue {
    channels: Option<QueueChannels>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TimerQueue {
    /// Spawns the queue task
    ///
    /// `capacity` is a hint for the number of items expected to wait at once.
    /// Must be called from within a tokio runtime.
    pub fn spawn(capacity: usize) -> Self {
        let (in_tx, in_rx) = mpsc::channel(CHANNEL_DEPTH);
        let (out_tx, out_rx) = mpsc::channel(CHANNEL_DEPTH);
        let (err_tx, err_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_queue(capacity, in_rx, out_tx, err_tx, cancel.clone()));

        Self {
            channels: Some(QueueChannels {
                ingress: in_tx,
                egress: out_rx,
                errors: err_rx,
            }),
            cancel,
            task: Some(task),
        }
    }
}

impl WaitQueue for TimerQueue {
    fn channels(&mut self) -> Result<QueueChannels, QueueError> {
        self.channels.take().ok_or(QueueError::ChannelsTaken)
    }

    fn close(&mut self) -> Result<(), QueueError> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            tracing::trace!("Wait queue task signalled to stop (finished: {})", task.is_finished());
        }
        Ok(())
    }
}

impl Drop for TimerQueue {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_queue(
    capacity: usize,
    mut ingress: mpsc::Receiver<QueueItem>,
    egress: mpsc::Sender<Url>,
    // Held so the consumer only sees the error channel close when the queue ends
    _errors: mpsc::Sender<QueueError>,
    cancel: CancellationToken,
) {
    let mut heap: BinaryHeap<QueueItem> = BinaryHeap::with_capacity(capacity);

    loop {
        let deadline = heap.peek().map(|item| {
            let wait = (item.next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            Instant::now() + wait
        });

        tokio::select! {
            _ = cancel.cancelled() => break,
            received = ingress.recv() => match received {
                Some(item) => heap.push(item),
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let now = Utc::now();
                while heap.peek().is_some_and(|item| item.is_due(now)) {
                    let Some(item) = heap.pop() else { break };
                    tokio::select! {
                        sent = egress.send(item.url) => {
                            if sent.is_err() {
                                tracing::debug!("Wait queue consumer went away");
                                return;
                            }
                        }
                        _ = cancel.cancelled() => return,
                    }
                }
            }
        }
    }

    if !heap.is_empty() {
        tracing::debug!("Wait queue closed with {} pending items abandoned", heap.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tokio::time::timeout;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com/{}", path)).unwrap()
    }

    #[tokio::test]
    async fn test_releases_due_item() {
        let mut queue = TimerQueue::spawn(16);
        let mut channels = queue.channels().unwrap();

        channels
            .ingress
            .send(QueueItem::new(url("now"), Utc::now(), 0))
            .await
            .unwrap();

        let released = timeout(std::time::Duration::from_secs(2), channels.egress.recv())
            .await
            .unwrap();
        assert_eq!(released, Some(url("now")));
    }

    #[tokio::test]
    async fn test_holds_item_until_due() {
        let mut queue = TimerQueue::spawn(16);
        let mut channels = queue.channels().unwrap();

        let next = Utc::now() + ChronoDuration::milliseconds(300);
        channels
            .ingress
            .send(QueueItem::new(url("later"), next, 0))
            .await
            .unwrap();

        let early = timeout(std::time::Duration::from_millis(100), channels.egress.recv()).await;
        assert!(early.is_err(), "item released before it was due");

        let released = timeout(std::time::Duration::from_secs(2), channels.egress.recv())
            .await
            .unwrap();
        assert_eq!(released, Some(url("later")));
        assert!(Utc::now() >= next);
    }

    #[tokio::test]
    async fn test_releases_in_time_then_score_order() {
        let mut queue = TimerQueue::spawn(16);
        let mut channels = queue.channels().unwrap();

        let at = Utc::now() + ChronoDuration::milliseconds(150);
        for (path, score) in [("low", 1), ("high", 5), ("mid", 3)] {
            channels
                .ingress
                .send(QueueItem::new(url(path), at, score))
                .await
                .unwrap();
        }

        let mut order = Vec::new();
        for _ in 0..3 {
            let u = timeout(std::time::Duration::from_secs(2), channels.egress.recv())
                .await
                .unwrap()
                .unwrap();
            order.push(u.path().to_string());
        }
        assert_eq!(order, vec!["/high", "/mid", "/low"]);
    }

    #[tokio::test]
    async fn test_close_ends_egress() {
        let mut queue = TimerQueue::spawn(16);
        let mut channels = queue.channels().unwrap();

        channels
            .ingress
            .send(QueueItem::new(
                url("abandoned"),
                Utc::now() + ChronoDuration::hours(1),
                0,
            ))
            .await
            .unwrap();

        queue.close().unwrap();
        queue.close().unwrap();

        let end = timeout(std::time::Duration::from_secs(2), channels.egress.recv())
            .await
            .unwrap();
        assert_eq!(end, None);
        let errors = timeout(std::time::Duration::from_secs(2), channels.errors.recv())
            .await
            .unwrap();
        assert!(errors.is_none());
    }

    #[tokio::test]
    async fn test_closing_ingress_ends_egress() {
        let mut queue = TimerQueue::spawn(16);
        let QueueChannels {
            ingress,
            mut egress,
            ..
        } = queue.channels().unwrap();

        drop(ingress);
        let end = timeout(std::time::Duration::from_secs(2), egress.recv())
            .await
            .unwrap();
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_channels_taken_once() {
        let mut queue = TimerQueue::spawn(16);
        assert!(queue.channels().is_ok());
        assert!(matches!(queue.channels(), Err(QueueError::ChannelsTaken)));
    }
}
