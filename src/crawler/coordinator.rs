//! Crawler coordinator
//!
//! Wires the store, the policy, the wait queue, the scheduler and the fetch
//! pool together, and replays pending URLs from the store so an interrupted
//! crawl picks up where it left off.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, spawn_fetchers};
use crate::crawler::scheduler::{Scheduler, SchedulerHandle};
use crate::policy::Policy;
use crate::queue::TimerQueue;
use crate::storage::Store;
use crate::FrontierError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running crawl
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sumi_frontier::policy::VisitOnce;
/// use sumi_frontier::storage::MemoryStore;
/// use sumi_frontier::{Config, Crawler};
///
/// # async fn run() -> sumi_frontier::Result<()> {
/// let crawler = Crawler::start(
///     &Config::default(),
///     Arc::new(MemoryStore::new()),
///     Arc::new(VisitOnce::new()),
/// )?;
/// crawler.crawl("https://example.com/").await?;
/// crawler.wait().await;
/// # Ok(())
/// # }
/// ```
pub struct Crawler {
    handle: SchedulerHandle,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Crawler {
    /// Starts the scheduler and fetch pool and begins recovering pending URLs
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: &Config,
        store: Arc<dyn Store>,
        policy: Arc<dyn Policy>,
    ) -> Result<Self, FrontierError> {
        let shutdown = CancellationToken::new();
        let client = build_http_client(&config.fetcher)?;
        let pending = store.pending()?;

        let queue = Box::new(TimerQueue::spawn(config.scheduler.queue_capacity));
        let (scheduler, handle, ready) = Scheduler::new(
            config.scheduler.clone(),
            store,
            policy.clone(),
            queue,
            shutdown.clone(),
        )?;

        let mut tasks = vec![tokio::spawn(scheduler.run())];
        tasks.extend(spawn_fetchers(
            config.fetcher.workers,
            client,
            policy,
            ready,
            handle.clone(),
            shutdown.clone(),
        ));

        if !pending.is_empty() {
            tracing::info!("Recovering {} pending URLs", pending.len());
            let recover = handle.clone();
            tasks.push(tokio::spawn(async move {
                for url in pending {
                    if let Err(e) = recover.recover(url).await {
                        tracing::debug!("Stopped recovering: {}", e);
                        break;
                    }
                }
            }));
        }

        Ok(Self {
            handle,
            shutdown,
            tasks,
        })
    }

    /// Normalizes `url` and submits it as a seed
    pub async fn crawl(&self, url: &str) -> Result<(), FrontierError> {
        let url = crate::url::normalize(url)?;
        tracing::info!("Seeding {}", url);
        self.handle.seed(url).await
    }

    /// Returns a handle to the scheduler's inputs
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Returns the token that stops the crawl when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops the crawl; pending URLs stay pending in the store
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Waits until the crawl finishes or is stopped
    pub async fn wait(self) {
        let Crawler { handle, tasks, .. } = self;
        // The scheduler must not wait on inputs held only by us
        drop(handle);

        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!("Crawler task failed: {}", e);
            }
        }
    }
}
