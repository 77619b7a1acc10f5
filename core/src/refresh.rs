//! Periodic corpus refresh driving [`SearchEngine::ingest`].
//!
//! The loop retries quickly until the first snapshot is published, then
//! settles on the regular refresh interval. Failures are logged and the
//! engine keeps serving its last good snapshot.

use crate::engine::SearchEngine;
use crate::error::{FetchError, RefreshError};
use crate::Document;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Where a corpus comes from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Document>, FetchError>;

    /// Cheap lookup of the source size used to skip unchanged refreshes.
    /// `None` means the source cannot tell.
    async fn remote_total(&self) -> Result<Option<usize>, FetchError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published { version: u64, documents: usize },
    Unchanged { total: usize },
}

pub struct Refresher {
    engine: Arc<SearchEngine>,
    source: Arc<dyn DocumentSource>,
    interval: Duration,
    retry_interval: Duration,
    last_total: Mutex<Option<usize>>, // also serializes refreshes
}

impl Refresher {
    pub fn new(engine: Arc<SearchEngine>, source: Arc<dyn DocumentSource>) -> Self {
        let cfg = engine.config();
        let (interval, retry_interval) = (cfg.refresh_interval, cfg.startup_retry_interval);
        Self { engine, source, interval, retry_interval, last_total: Mutex::new(None) }
    }

    pub fn engine(&self) -> &Arc<SearchEngine> { &self.engine }

    pub fn interval(&self) -> Duration { self.interval }

    /// Fetch, build and publish one corpus.
    ///
    /// Without `force`, a ready engine skips the rebuild when the source
    /// reports the same total as the last successful load.
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome, RefreshError> {
        let mut last_total = self.last_total.lock().await;

        if !force && self.engine.is_ready() {
            match self.source.remote_total().await {
                Ok(Some(total)) if Some(total) == *last_total => {
                    tracing::info!(total, "no changes detected, skipping refresh");
                    return Ok(RefreshOutcome::Unchanged { total });
                }
                Ok(remote) => {
                    let local = *last_total;
                    tracing::info!(?remote, ?local, "changes detected, refreshing corpus");
                }
                Err(err) => {
                    tracing::warn!(%err, "could not read source size, refreshing anyway");
                }
            }
        }

        let documents = self.source.fetch().await?;
        let count = documents.len();
        let engine = Arc::clone(&self.engine);
        let version = tokio::task::spawn_blocking(move || engine.ingest(documents)).await??;

        *last_total = Some(count);
        tracing::info!(version, documents = count, "refresh complete");
        Ok(RefreshOutcome::Published { version, documents: count })
    }

    /// Refresh immediately, then forever on the configured cadence.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "background refresh started");
        let mut force = true;
        loop {
            match self.refresh(force).await {
                Ok(_) => force = false,
                Err(err) => tracing::error!(%err, ready = self.engine.is_ready(), "refresh failed"),
            }
            let wait = if self.engine.is_ready() { self.interval } else { self.retry_interval };
            tokio::time::sleep(wait).await;
        }
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("interval", &self.interval)
            .field("retry_interval", &self.retry_interval)
            .finish()
    }
}
