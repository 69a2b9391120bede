//! The poll loop: one cycle immediately on startup, then one per interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use gigwatch_core::Config;
use gigwatch_notify::format::MessageLimits;
use gigwatch_notify::Notifier;
use gigwatch_source::ListingSource;
use gigwatch_store::ListingStore;

use crate::cycle::{self, CycleContext, CycleError, CycleOutcome};
use crate::retry::RetryPolicy;

/// Everything the poll loop needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    /// Channel that receives listing broadcasts.
    pub channel: String,
    pub page_offset: u32,
    pub page_count: u32,
    pub store_cap: usize,
    pub description_max_chars: usize,
}

impl WatcherOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.watcher.poll_interval_secs.max(1)),
            retry: RetryPolicy::from_config(&config.watcher),
            channel: config.telegram.channel.clone(),
            page_offset: config.source.page_offset,
            page_count: config.source.page_count,
            store_cap: config.store.cap,
            description_max_chars: config.message.description_max_chars,
        }
    }
}

/// Drives ingestion cycles against a source, store, and notifier.
pub struct Watcher {
    source: Arc<dyn ListingSource>,
    store: ListingStore,
    notifier: Arc<dyn Notifier>,
    options: WatcherOptions,
    limits: MessageLimits,
}

impl Watcher {
    pub fn new(
        source: Arc<dyn ListingSource>,
        store: ListingStore,
        notifier: Arc<dyn Notifier>,
        options: WatcherOptions,
    ) -> Self {
        let limits = MessageLimits { description_max_chars: options.description_max_chars };
        Self { source, store, notifier, options, limits }
    }

    fn context(&self) -> CycleContext<'_> {
        CycleContext {
            source: self.source.as_ref(),
            store: &self.store,
            notifier: self.notifier.as_ref(),
            channel: &self.options.channel,
            page_offset: self.options.page_offset,
            page_count: self.options.page_count,
            store_cap: self.options.store_cap,
            limits: &self.limits,
        }
    }

    /// Run one cycle under the retry policy.
    ///
    /// Returns the last attempt's error once the budget is exhausted. Also
    /// the entry point for `--once` runs and tests, with no timer involved.
    pub async fn run_once(&self) -> Result<CycleOutcome, CycleError> {
        let ctx = self.context();
        let mut attempt: u32 = 1;
        loop {
            match cycle::run_attempt(&ctx).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < self.options.retry.max_attempts => {
                    let delay = self.options.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "cycle attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll until shutdown: one cycle immediately, then one per interval.
    ///
    /// Cycles are serialized; the ticker is not polled while a cycle runs,
    /// and ticks that pile up behind a slow cycle collapse into one.
    pub async fn run(&self, shutdown: Arc<Notify>) {
        let shutdown_fut = shutdown.notified();
        tokio::pin!(shutdown_fut);
        // Register the waiter up front so a signal arriving mid-cycle is not lost.
        shutdown_fut.as_mut().enable();

        info!(
            interval_secs = self.options.poll_interval.as_secs(),
            source = self.source.source_name(),
            "watcher started, running initial cycle"
        );
        self.tick().await;

        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Skip the immediate first tick (the initial cycle already ran)
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = &mut shutdown_fut => {
                    info!("watcher shutting down");
                    break;
                }
            }
        }
    }

    async fn tick(&self) {
        if let Err(e) = self.run_once().await {
            error!(
                attempts = self.options.retry.max_attempts,
                error = %e,
                "cycle failed after all retry attempts, waiting for next tick"
            );
        }
    }
}
