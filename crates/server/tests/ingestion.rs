//! End-to-end ingestion scenarios against a scripted source, a recording
//! notifier, and a real store in a temp directory.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use gigwatch_core::{Listing, Pricing, Skill};
use gigwatch_notify::{ChannelMessage, Notifier, NotifyError};
use gigwatch_server::cycle::CycleError;
use gigwatch_server::retry::RetryPolicy;
use gigwatch_server::watcher::{Watcher, WatcherOptions};
use gigwatch_source::{ListingSource, SourceError};
use gigwatch_store::ListingStore;

fn listing(id: &str) -> Listing {
    Listing {
        id: id.to_string(),
        title: format!("Job {id}"),
        description: "Scrape things.".to_string(),
        skills: vec![Skill { label: "Web Scraping".to_string() }],
        pricing: Pricing::Fixed,
        listing_ref: format!("~{id}"),
        published_at: None,
    }
}

fn listings(ids: &[&str]) -> Vec<Listing> {
    ids.iter().map(|id| listing(id)).collect()
}

// ── Scripted source ─────────────────────────────────────────────────

/// Serves scripted pages in order; the last entry repeats forever.
#[derive(Clone)]
enum Script {
    Fail,
    Page(Vec<Listing>),
}

struct ScriptedSource {
    script: Mutex<Vec<Script>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(script: Vec<Script>) -> Arc<Self> {
        Arc::new(Self { script: Mutex::new(script), calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    async fn fetch_page(&self, _offset: u32, _count: u32) -> Result<Vec<Listing>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().await;
        let step = if script.len() > 1 { script.remove(0) } else { script[0].clone() };
        match step {
            Script::Fail => Err(SourceError::MalformedResponse("scripted failure".to_string())),
            Script::Page(listings) => Ok(listings),
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

// ── Recording notifier ──────────────────────────────────────────────

struct RecordingNotifier {
    sent: Mutex<Vec<(String, ChannelMessage)>>,
    /// Reject any message whose text contains this fragment.
    fail_when_contains: Option<String>,
}

impl RecordingNotifier {
    fn new() -> Arc<Self> {
        Arc::new(Self { sent: Mutex::new(Vec::new()), fail_when_contains: None })
    }

    fn failing_on(fragment: &str) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_when_contains: Some(fragment.to_string()),
        })
    }

    async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, channel: &str, message: &ChannelMessage) -> Result<(), NotifyError> {
        if let Some(fragment) = &self.fail_when_contains {
            if message.text.contains(fragment.as_str()) {
                return Err(NotifyError::Api("scripted rejection".to_string()));
            }
        }
        self.sent.lock().await.push((channel.to_string(), message.clone()));
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "recording"
    }
}

// ── Harness ─────────────────────────────────────────────────────────

fn watcher(
    source: Arc<ScriptedSource>,
    notifier: Arc<RecordingNotifier>,
    store_path: PathBuf,
) -> Watcher {
    watcher_with_interval(source, notifier, store_path, Duration::from_secs(180))
}

fn watcher_with_interval(
    source: Arc<ScriptedSource>,
    notifier: Arc<RecordingNotifier>,
    store_path: PathBuf,
    poll_interval: Duration,
) -> Watcher {
    Watcher::new(
        source,
        ListingStore::new(store_path),
        notifier,
        WatcherOptions {
            poll_interval,
            retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(5),
                backoff_factor: 2.0,
            },
            channel: "@test_channel".to_string(),
            page_offset: 0,
            page_count: 10,
            store_cap: 50,
            description_max_chars: 3600,
        },
    )
}

fn store_ids(path: &PathBuf) -> Vec<String> {
    ListingStore::new(path.clone())
        .load()
        .into_iter()
        .map(|listing| listing.id)
        .collect()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn first_cycle_broadcasts_every_listing() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("latest.json");
    let source = ScriptedSource::new(vec![Script::Page(listings(&["a", "b", "c"]))]);
    let notifier = RecordingNotifier::new();

    let outcome = watcher(source.clone(), notifier.clone(), path.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(outcome.fetched, 3);
    assert_eq!(outcome.new_listings, 3);
    assert_eq!(outcome.notified, 3);
    assert_eq!(outcome.notify_failures, 0);

    let sent = notifier.sent.lock().await;
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|(channel, _)| channel == "@test_channel"));
    assert!(sent[0].1.text.contains("Job a"));

    assert_eq!(store_ids(&path), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn known_listings_are_not_rebroadcast() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("latest.json");

    // A full history of 50, three of which come back in the next fetch.
    let old_ids: Vec<String> = (0..50).map(|i| format!("old-{i}")).collect();
    let history: Vec<Listing> = old_ids.iter().map(|id| listing(id)).collect();
    ListingStore::new(path.clone()).save(&history).unwrap();

    let fetched = listings(&[
        "new-0", "old-1", "new-1", "new-2", "old-7", "new-3", "new-4", "old-30", "new-5", "new-6",
    ]);
    let source = ScriptedSource::new(vec![Script::Page(fetched)]);
    let notifier = RecordingNotifier::new();

    let outcome = watcher(source, notifier.clone(), path.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(outcome.fetched, 10);
    assert_eq!(outcome.new_listings, 7);
    assert_eq!(outcome.notified, 7);
    assert_eq!(notifier.sent_count().await, 7);

    let ids = store_ids(&path);
    assert_eq!(ids.len(), 50);
    assert_eq!(
        &ids[..7],
        &["new-0", "new-1", "new-2", "new-3", "new-4", "new-5", "new-6"]
    );
    // Oldest entries fall off the end.
    assert_eq!(ids[7], "old-0");
    assert_eq!(ids[49], "old-42");
}

#[tokio::test]
async fn second_cycle_with_same_page_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("latest.json");
    let source = ScriptedSource::new(vec![Script::Page(listings(&["a", "b"]))]);
    let notifier = RecordingNotifier::new();
    let watcher = watcher(source, notifier.clone(), path.clone());

    watcher.run_once().await.unwrap();
    assert_eq!(notifier.sent_count().await, 2);
    let written_at = std::fs::metadata(&path).unwrap().modified().unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    let outcome = watcher.run_once().await.unwrap();
    assert_eq!(outcome.new_listings, 0);
    assert_eq!(outcome.notified, 0);
    assert_eq!(notifier.sent_count().await, 2);

    // No new listings, no rewrite.
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(modified, written_at);
}

#[tokio::test]
async fn transient_fetch_failures_are_retried() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("latest.json");
    let source = ScriptedSource::new(vec![
        Script::Fail,
        Script::Fail,
        Script::Page(listings(&["a"])),
    ]);
    let notifier = RecordingNotifier::new();

    let outcome = watcher(source.clone(), notifier.clone(), path.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(source.calls(), 3);
    assert_eq!(outcome.notified, 1);
    assert_eq!(store_ids(&path), vec!["a"]);
}

#[tokio::test]
async fn retry_budget_is_bounded() {
    let tmp = tempfile::tempdir().unwrap();
    let source = ScriptedSource::new(vec![Script::Fail]);
    let notifier = RecordingNotifier::new();

    let result = watcher(source.clone(), notifier.clone(), tmp.path().join("latest.json"))
        .run_once()
        .await;

    assert!(matches!(result, Err(CycleError::Source(_))));
    assert_eq!(source.calls(), 3);
    assert_eq!(notifier.sent_count().await, 0);
}

#[tokio::test]
async fn persist_failure_suppresses_all_broadcasts() {
    let tmp = tempfile::tempdir().unwrap();
    // A file where the store expects its parent directory.
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let path = blocker.join("latest.json");

    let source = ScriptedSource::new(vec![Script::Page(listings(&["a", "b"]))]);
    let notifier = RecordingNotifier::new();

    let result = watcher(source.clone(), notifier.clone(), path).run_once().await;

    assert!(matches!(result, Err(CycleError::Store(_))));
    // The whole cycle is retried, and nothing is ever broadcast.
    assert_eq!(source.calls(), 3);
    assert_eq!(notifier.sent_count().await, 0);
}

#[tokio::test]
async fn delivery_failure_does_not_fail_the_cycle() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("latest.json");
    let source = ScriptedSource::new(vec![Script::Page(listings(&["a", "b", "c"]))]);
    let notifier = RecordingNotifier::failing_on("Job b");

    let outcome = watcher(source.clone(), notifier.clone(), path.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(outcome.new_listings, 3);
    assert_eq!(outcome.notified, 2);
    assert_eq!(outcome.notify_failures, 1);
    // One fetch, no retry: delivery failures are not cycle failures.
    assert_eq!(source.calls(), 1);

    // The failed listing is persisted anyway and never re-announced.
    assert_eq!(store_ids(&path), vec!["a", "b", "c"]);
    let second = watcher(source, notifier.clone(), path).run_once().await.unwrap();
    assert_eq!(second.new_listings, 0);
}

#[tokio::test]
async fn poll_loop_ticks_and_shuts_down() {
    let tmp = tempfile::tempdir().unwrap();
    let source = ScriptedSource::new(vec![Script::Page(listings(&["a"]))]);
    let notifier = RecordingNotifier::new();
    let watcher = Arc::new(watcher_with_interval(
        source.clone(),
        notifier.clone(),
        tmp.path().join("latest.json"),
        Duration::from_millis(50),
    ));
    let shutdown = Arc::new(Notify::new());

    let handle = tokio::spawn({
        let watcher = watcher.clone();
        let shutdown = shutdown.clone();
        async move { watcher.run(shutdown).await }
    });

    // Initial cycle plus at least one tick.
    tokio::time::sleep(Duration::from_millis(130)).await;
    shutdown.notify_waiters();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("watcher should stop after shutdown")
        .expect("watcher task should not panic");

    assert!(source.calls() >= 2, "expected ≥2 cycles, got {}", source.calls());
    // Only the first cycle found anything new.
    assert_eq!(notifier.sent_count().await, 1);
}
