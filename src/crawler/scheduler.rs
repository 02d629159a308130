//! Scheduler for the crawl frontier
//!
//! The scheduler is a single task that owns every decision about when a URL
//! is fetched. It merges five inputs:
//! - seeds
//! - URLs recovered from the store
//! - fetched responses
//! - done notifications
//! - error notifications
//!
//! It feeds not-yet-due items into the wait queue and hands due URLs to the
//! fetch layer. After each processed event it asks the store whether any
//! pending URL remains and shuts the crawl down once none does.

use crate::config::SchedulerConfig;
use crate::crawler::Response;
use crate::policy::{Context, Decision, Policy, UrlKind};
use crate::queue::{QueueChannels, QueueError, QueueItem, WaitQueue};
use crate::state::{checked_offset, UrlStatus};
use crate::storage::Store;
use crate::FrontierError;
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Sending side of the scheduler's inputs
///
/// Cheap to clone; every fetch worker holds one.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    seed_tx: mpsc::Sender<Url>,
    recover_tx: mpsc::Sender<Url>,
    response_tx: mpsc::Sender<Response>,
    done_tx: mpsc::Sender<Url>,
    error_tx: mpsc::Sender<Url>,
    holds: Arc<Holds>,
}

/// Outstanding seeding guards
#[derive(Debug, Default)]
struct Holds {
    count: AtomicUsize,
    released: Notify,
}

/// Keeps the crawl from finishing while seeds are still being submitted
///
/// Seeds arrive one at a time, so without a guard a seed the policy rejects
/// can end the crawl before the next one is sent.
#[derive(Debug)]
#[must_use = "the crawl may finish as soon as the guard is dropped"]
pub struct SeedingGuard {
    holds: Arc<Holds>,
}

impl Drop for SeedingGuard {
    fn drop(&mut self) {
        if self.holds.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.holds.released.notify_one();
        }
    }
}

impl SchedulerHandle {
    /// Defers completion until the returned guard is dropped
    pub fn hold(&self) -> SeedingGuard {
        self.holds.count.fetch_add(1, Ordering::AcqRel);
        SeedingGuard {
            holds: self.holds.clone(),
        }
    }

    /// Submits a canonical seed URL
    pub async fn seed(&self, url: Url) -> Result<(), FrontierError> {
        self.seed_tx
            .send(url)
            .await
            .map_err(|_| FrontierError::SchedulerClosed("seeds"))
    }

    /// Submits a pending URL recovered from the store
    pub async fn recover(&self, url: Url) -> Result<(), FrontierError> {
        self.recover_tx
            .send(url)
            .await
            .map_err(|_| FrontierError::SchedulerClosed("recovered URLs"))
    }

    /// Submits a successfully fetched page
    pub async fn response(&self, response: Response) -> Result<(), FrontierError> {
        self.response_tx
            .send(response)
            .await
            .map_err(|_| FrontierError::SchedulerClosed("responses"))
    }

    /// Reports that a URL needs no further fetching
    pub async fn done(&self, url: Url) -> Result<(), FrontierError> {
        self.done_tx
            .send(url)
            .await
            .map_err(|_| FrontierError::SchedulerClosed("done notifications"))
    }

    /// Reports a failed fetch, to be retried
    pub async fn error(&self, url: Url) -> Result<(), FrontierError> {
        self.error_tx
            .send(url)
            .await
            .map_err(|_| FrontierError::SchedulerClosed("error notifications"))
    }
}

enum Event {
    Seed(Url),
    Recover(Url),
    Response(Response),
    Done(Url),
    Error(Url),
    Released(Url),
    Forwarded,
    Unheld,
    QueueClosed,
    QueueFailed(QueueError),
    OutputClosed,
    Stopped,
}

/// What the loop does after an event
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    /// Skip the completion check
    Continue,
    /// Check whether the crawl is finished
    Check,
    Stop,
}

/// The frontier scheduler
pub struct Scheduler {
    config: SchedulerConfig,
    store: Arc<dyn Store>,
    policy: Arc<dyn Policy>,

    seed_rx: mpsc::Receiver<Url>,
    recover_rx: mpsc::Receiver<Url>,
    response_rx: mpsc::Receiver<Response>,
    done_rx: mpsc::Receiver<Url>,
    error_rx: mpsc::Receiver<Url>,
    out_tx: mpsc::Sender<Url>,

    queue: Box<dyn WaitQueue>,
    queue_in: mpsc::Sender<QueueItem>,
    queue_out: mpsc::Receiver<Url>,
    queue_err: mpsc::Receiver<QueueError>,

    shutdown: CancellationToken,
    holds: Arc<Holds>,

    /// URLs somewhere between admission and their final decision
    in_flight: HashSet<String>,
}

impl Scheduler {
    /// Creates a scheduler around a wait queue
    ///
    /// Returns the scheduler, the handle for its inputs, and the stream of URLs
    /// ready to fetch. The stream closes when the crawl ends.
    pub fn new(
        config: SchedulerConfig,
        store: Arc<dyn Store>,
        policy: Arc<dyn Policy>,
        mut queue: Box<dyn WaitQueue>,
        shutdown: CancellationToken,
    ) -> Result<(Self, SchedulerHandle, mpsc::Receiver<Url>), FrontierError> {
        let QueueChannels {
            ingress,
            egress,
            errors,
        } = queue.channels()?;

        let capacity = config.workers.max(1);
        let (seed_tx, seed_rx) = mpsc::channel(capacity);
        let (recover_tx, recover_rx) = mpsc::channel(capacity);
        let (response_tx, response_rx) = mpsc::channel(capacity);
        let (done_tx, done_rx) = mpsc::channel(capacity);
        let (error_tx, error_rx) = mpsc::channel(capacity);
        let (out_tx, out_rx) = mpsc::channel(config.output_capacity().max(1));
        let holds = Arc::new(Holds::default());

        let scheduler = Self {
            config,
            store,
            policy,
            seed_rx,
            recover_rx,
            response_rx,
            done_rx,
            error_rx,
            out_tx,
            queue,
            queue_in: ingress,
            queue_out: egress,
            queue_err: errors,
            shutdown,
            holds: holds.clone(),
            in_flight: HashSet::new(),
        };

        let handle = SchedulerHandle {
            seed_tx,
            recover_tx,
            response_tx,
            done_tx,
            error_tx,
            holds,
        };

        Ok((scheduler, handle, out_rx))
    }

    /// Runs the event loop until the crawl finishes, fails, or is stopped
    pub async fn run(mut self) {
        let mut waiting: VecDeque<QueueItem> = VecDeque::new();
        let mut ready: VecDeque<Url> = VecDeque::new();
        let holds = self.holds.clone();

        tracing::debug!("Scheduler started");

        loop {
            let event = tokio::select! {
                // Input
                Some(url) = self.seed_rx.recv() => Event::Seed(url),
                Some(url) = self.recover_rx.recv() => Event::Recover(url),
                Some(response) = self.response_rx.recv() => Event::Response(response),
                Some(url) = self.done_rx.recv() => Event::Done(url),
                Some(url) = self.error_rx.recv() => Event::Error(url),
                released = self.queue_out.recv() => match released {
                    Some(url) => Event::Released(url),
                    None => Event::QueueClosed,
                },

                // Output
                permit = self.queue_in.reserve(), if !waiting.is_empty() => match permit {
                    Ok(permit) => {
                        if let Some(item) = waiting.pop_front() {
                            permit.send(item);
                        }
                        Event::Forwarded
                    }
                    Err(_) => Event::QueueClosed,
                },
                permit = self.out_tx.reserve(), if !ready.is_empty() => match permit {
                    Ok(permit) => {
                        if let Some(url) = ready.pop_front() {
                            permit.send(url);
                        }
                        Event::Forwarded
                    }
                    Err(_) => Event::OutputClosed,
                },

                // Control
                failure = self.queue_err.recv() => match failure {
                    Some(err) => Event::QueueFailed(err),
                    None => Event::QueueClosed,
                },
                _ = holds.released.notified() => Event::Unheld,
                _ = self.shutdown.cancelled() => Event::Stopped,
            };

            let flow = match self.process(event, &mut waiting, &mut ready) {
                Ok(flow) => flow,
                Err(e) => {
                    tracing::error!("Scheduler failed: {}", e);
                    break;
                }
            };

            match flow {
                Flow::Continue => continue,
                Flow::Stop => break,
                Flow::Check => match self.is_finished() {
                    Ok(true) => {
                        tracing::info!("No pending URLs remain, crawl finished");
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!("Scheduler failed: {}", e);
                        break;
                    }
                },
            }
        }

        if !waiting.is_empty() || !ready.is_empty() {
            tracing::debug!(
                "Scheduler stopping with {} waiting and {} ready URLs",
                waiting.len(),
                ready.len()
            );
        }
        self.finish();
    }

    fn process(
        &mut self,
        event: Event,
        waiting: &mut VecDeque<QueueItem>,
        ready: &mut VecDeque<Url>,
    ) -> Result<Flow, FrontierError> {
        match event {
            Event::Seed(url) => self.admit(&url, UrlKind::Seed, None, waiting),
            Event::Recover(url) => self.admit(&url, UrlKind::Recover, None, waiting),
            Event::Response(response) => self.on_response(response, waiting),
            Event::Done(url) => {
                let record = self.store.get(&url)?;
                if !record.status.is_terminal() {
                    self.store.update_status(&url, UrlStatus::Finished)?;
                }
                self.in_flight.remove(url.as_str());
                tracing::debug!("{} done", url);
                Ok(Flow::Check)
            }
            Event::Error(url) => self.on_error(url, waiting),
            Event::Released(url) => {
                ready.push_back(url);
                Ok(Flow::Check)
            }
            Event::Forwarded | Event::Unheld => Ok(Flow::Check),
            Event::QueueClosed => {
                tracing::debug!("Wait queue closed");
                Ok(Flow::Stop)
            }
            Event::QueueFailed(err) => Err(err.into()),
            Event::OutputClosed => {
                tracing::warn!("No fetch workers are consuming ready URLs");
                Ok(Flow::Stop)
            }
            Event::Stopped => {
                tracing::debug!("Scheduler received stop signal");
                Ok(Flow::Stop)
            }
        }
    }

    /// Runs a decision for a seed, recovered or newly discovered URL
    fn admit(
        &mut self,
        url: &Url,
        kind: UrlKind,
        response: Option<&Response>,
        waiting: &mut VecDeque<QueueItem>,
    ) -> Result<Flow, FrontierError> {
        if self.in_flight.contains(url.as_str()) {
            tracing::trace!("{} already in the frontier", url);
            return Ok(Flow::Check);
        }

        match self.schedule_url(response, url, kind)? {
            Some(item) => {
                tracing::debug!("Scheduled {} {} for {}", kind, url, item.next);
                self.in_flight.insert(url.as_str().to_string());
                waiting.push_back(item);
                Ok(Flow::Continue)
            }
            None => Ok(Flow::Check),
        }
    }

    fn on_response(
        &mut self,
        response: Response,
        waiting: &mut VecDeque<QueueItem>,
    ) -> Result<Flow, FrontierError> {
        self.store.inc_visit_count()?;

        for link in &response.links {
            self.admit(&link.url, UrlKind::New, Some(&response), waiting)?;
        }

        let url = response.url.clone();
        let own = self.schedule_url(Some(&response), &url, UrlKind::Response);
        drop(response);

        match own? {
            Some(item) => {
                tracing::debug!("Revisit of {} scheduled for {}", url, item.next);
                self.in_flight.insert(url.as_str().to_string());
                waiting.push_back(item);
                Ok(Flow::Continue)
            }
            None => {
                self.in_flight.remove(url.as_str());
                Ok(Flow::Check)
            }
        }
    }

    fn on_error(
        &mut self,
        url: Url,
        waiting: &mut VecDeque<QueueItem>,
    ) -> Result<Flow, FrontierError> {
        let mut record = self.store.get(&url)?;
        if record.status.is_terminal() {
            self.in_flight.remove(url.as_str());
            return Ok(Flow::Check);
        }

        record.error_count += 1;
        if record.error_count >= self.config.max_retry {
            record.status = UrlStatus::Error;
            self.store.update(&record)?;
            self.in_flight.remove(url.as_str());
            tracing::warn!(
                "Giving up on {} after {} failed fetches",
                url,
                record.error_count
            );
            return Ok(Flow::Check);
        }

        self.store.update(&record)?;
        let next = checked_offset(Utc::now(), self.config.retry_delay())?;
        tracing::debug!(
            "Fetch of {} failed ({} of {}), retrying at {}",
            url,
            record.error_count,
            self.config.max_retry,
            next
        );
        self.in_flight.insert(url.as_str().to_string());
        waiting.push_back(QueueItem::new(url, next, record.score));
        Ok(Flow::Continue)
    }

    /// Asks the policy about one URL and returns the item to enqueue, if any
    ///
    /// A response decision records the visit before the policy sees the
    /// record. The returned item never precedes the URL's revisit floor.
    fn schedule_url(
        &self,
        response: Option<&Response>,
        url: &Url,
        kind: UrlKind,
    ) -> Result<Option<QueueItem>, FrontierError> {
        let mut record = self.store.get(url)?;

        // Terminal states never transition
        if record.status.is_terminal() {
            return Ok(None);
        }

        if kind == UrlKind::Response {
            record.visit_count += 1;
            record.last = Some(response.map_or_else(Utc::now, |r| r.timestamp));
            self.store.update(&record)?;
        }

        let floor = record.revisit_floor(self.config.min_revisit_delay())?;
        let ctx = Context {
            kind,
            url,
            record: &record,
            response,
        };

        match self.policy.schedule(&ctx) {
            Decision::Done => {
                self.store.update_status(url, UrlStatus::Finished)?;
                Ok(None)
            }
            Decision::Visit { next, score } => {
                let next = match floor {
                    Some(floor) if next < floor => floor,
                    _ => next,
                };
                if record.score != score {
                    record.score = score;
                    self.store.update(&record)?;
                }
                Ok(Some(QueueItem::new(url.clone(), next, score)))
            }
        }
    }

    /// The crawl is over once no URL is pending, no input is queued and no
    /// seeding guard is alive
    fn is_finished(&self) -> Result<bool, FrontierError> {
        if self.holds.count.load(Ordering::Acquire) > 0 {
            return Ok(false);
        }
        let inputs_idle = self.seed_rx.is_empty()
            && self.recover_rx.is_empty()
            && self.response_rx.is_empty()
            && self.done_rx.is_empty()
            && self.error_rx.is_empty();
        Ok(inputs_idle && self.store.is_finished()?)
    }

    fn finish(self) {
        let Scheduler {
            mut queue,
            queue_in,
            out_tx,
            shutdown,
            ..
        } = self;

        drop(out_tx);
        drop(queue_in);
        if let Err(e) = queue.close() {
            tracing::error!("Failed to close wait queue: {}", e);
        }
        shutdown.cancel();
        tracing::debug!("Scheduler stopped");
    }
}
