//! One ingestion pass: fetch, dedup, persist, broadcast.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use gigwatch_notify::format::{render_listing, MessageLimits};
use gigwatch_notify::Notifier;
use gigwatch_source::{ListingSource, SourceError};
use gigwatch_store::{compute_new, merge, ListingStore, StoreError};

/// Failures that abort a cycle attempt. Both are transient by nature
/// (network, filesystem), so the watcher retries them.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What one completed cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub fetched: usize,
    pub new_listings: usize,
    pub notified: usize,
    pub notify_failures: usize,
}

/// Collaborators and knobs for one cycle attempt.
pub(crate) struct CycleContext<'a> {
    pub source: &'a dyn ListingSource,
    pub store: &'a ListingStore,
    pub notifier: &'a dyn Notifier,
    pub channel: &'a str,
    pub page_offset: u32,
    pub page_count: u32,
    pub store_cap: usize,
    pub limits: &'a MessageLimits,
}

/// Run one cycle attempt end to end.
///
/// The snapshot is persisted before any broadcast goes out: if the save
/// fails, the attempt errors with nothing sent, and the retried attempt
/// re-deduplicates against the old snapshot, so no listing is announced
/// twice. Individual delivery failures are logged and counted but never
/// fail the cycle; those listings are already persisted and will not be
/// re-announced.
pub(crate) async fn run_attempt(ctx: &CycleContext<'_>) -> Result<CycleOutcome, CycleError> {
    let fetched = ctx.source.fetch_page(ctx.page_offset, ctx.page_count).await?;
    let existing = ctx.store.load();
    let fresh = compute_new(&fetched, &existing);

    if fresh.is_empty() {
        info!(fetched = fetched.len(), source = ctx.source.source_name(), "no new listings found");
        return Ok(CycleOutcome { fetched: fetched.len(), ..Default::default() });
    }

    ctx.store.save(&merge(&fresh, &existing, ctx.store_cap))?;
    info!(count = fresh.len(), "new listings persisted");

    let mut notified = 0usize;
    let mut notify_failures = 0usize;
    for listing in &fresh {
        let message = render_listing(listing, ctx.limits);
        let started = Instant::now();
        match ctx.notifier.send(ctx.channel, &message).await {
            Ok(()) => {
                notified += 1;
                debug!(
                    listing_id = %listing.id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "listing broadcast delivered"
                );
            }
            Err(e) => {
                notify_failures += 1;
                warn!(
                    listing_id = %listing.id,
                    channel = %ctx.channel,
                    error = %e,
                    "listing broadcast failed"
                );
            }
        }
    }
    info!(new = fresh.len(), notified, notify_failures, "cycle complete");

    Ok(CycleOutcome {
        fetched: fetched.len(),
        new_listings: fresh.len(),
        notified,
        notify_failures,
    })
}
