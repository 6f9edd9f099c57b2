//! Coordinator tests against an in-process fake remote.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{DownloadCoordinator, ItemResult};
use crate::catalog::{CatalogItem, RawCatalog};
use crate::progress::{DownloadOutcome, ProgressTracker, SkipReason};
use crate::rate_limit::RateLimiter;
use crate::remote::{Fetcher, RemoteClient};
use crate::retry::{FetchError, RetryPolicy};
use crate::run_log::RunLog;

/// Serves `body-of-<url>` after a latency derived from the URL; URLs containing
/// "/fail/" answer HTTP 500. Tracks peak concurrency.
#[derive(Default)]
struct FakeRemote {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

fn latency_for(url: &str) -> Duration {
    // Cheap deterministic scatter (FNV-1a) so workers finish out of order.
    let mut h: u64 = 0xcbf29ce484222325;
    for b in url.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    Duration::from_millis(h % 8)
}

impl RemoteClient for FakeRemote {
    fn fetch_catalog(&self, _credential: &str) -> Result<RawCatalog, FetchError> {
        Ok(RawCatalog::default())
    }

    fn fetch_asset(&self, url: &str, credential: &str) -> Result<Vec<u8>, FetchError> {
        assert_eq!(credential, "tok");
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(latency_for(url));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if url.contains("/fail/") {
            return Err(FetchError::Remote(500));
        }
        Ok(format!("body-of-{}", url).into_bytes())
    }
}

fn coordinator(
    remote: Arc<FakeRemote>,
    dir: &std::path::Path,
    concurrency: usize,
) -> Arc<DownloadCoordinator> {
    let policy = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    };
    Arc::new(DownloadCoordinator::new(
        Fetcher::new(remote, "tok", policy),
        RateLimiter::disabled(),
        dir.to_path_buf(),
        "mp3",
        concurrency,
        Arc::new(RunLog::detached("test")),
    ))
}

#[test]
fn hundred_items_five_workers_every_item_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    let coord = coordinator(Arc::clone(&remote), dir.path(), 5);

    let items: Vec<CatalogItem> = (0..100)
        .map(|i| {
            let item = CatalogItem::new(format!("item-{}", i));
            if i % 4 == 3 {
                item
            } else {
                item.with_audio_url(format!("http://cdn.test/{}.mp3", i))
            }
        })
        .collect();
    let expected_ids: HashSet<String> = items.iter().map(|i| i.id.clone()).collect();

    let tracker = Arc::new(ProgressTracker::new(items.len() as u64));
    let results = coord.download_batch(items, &tracker, None);

    assert_eq!(results.len(), 100);
    let got_ids: HashSet<String> = results.iter().map(|r| r.id.clone()).collect();
    assert_eq!(got_ids, expected_ids, "no duplicate or missing ids");

    let snap = tracker.snapshot();
    assert_eq!(snap.total, 100);
    assert_eq!(snap.skipped, 25);
    assert_eq!(snap.downloaded, 75);
    assert_eq!(snap.failed, 0);
    assert_eq!(snap.processed(), snap.total);

    assert_eq!(remote.calls.load(Ordering::SeqCst), 75);
    let peak = remote.peak.load(Ordering::SeqCst);
    assert!(peak <= 5, "peak concurrency {}", peak);

    let body = std::fs::read(dir.path().join("item-0.mp3")).unwrap();
    assert_eq!(body, b"body-of-http://cdn.test/0.mp3");
    assert!(!dir.path().join("item-3.mp3").exists());
}

#[test]
fn remote_error_is_failed_and_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    let coord = coordinator(Arc::clone(&remote), dir.path(), 3);

    let items = vec![
        CatalogItem::new("d").with_audio_url("http://cdn.test/fail/d.mp3"),
        CatalogItem::new("e").with_audio_url("http://cdn.test/e.mp3"),
    ];
    let tracker = Arc::new(ProgressTracker::new(2));
    let results = coord.download_batch(items, &tracker, None);

    let d = results.iter().find(|r| r.id == "d").unwrap();
    assert_eq!(d.outcome, DownloadOutcome::Failed("HTTP 500".to_string()));
    // Remote errors are not retried.
    assert_eq!(remote.calls.load(Ordering::SeqCst), 2);

    let errors = tracker.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id, "d");
    assert!(!dir.path().join("d.mp3").exists());
    assert!(dir.path().join("e.mp3").exists());
}

#[test]
fn unusable_items_fail_or_skip_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    let coord = coordinator(Arc::clone(&remote), dir.path(), 2);

    let items = vec![
        CatalogItem::new("c"),
        CatalogItem::new("blank").with_audio_url(""),
        CatalogItem::new("bad-url").with_audio_url("::not a url::"),
        CatalogItem::new("../..").with_audio_url("http://cdn.test/x.mp3"),
    ];
    let tracker = Arc::new(ProgressTracker::new(4));
    let mut results = coord.download_batch(items, &tracker, None);
    results.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    let outcome = |id: &str| -> DownloadOutcome {
        results
            .iter()
            .find(|r: &&ItemResult| r.id == id)
            .map(|r| r.outcome.clone())
            .unwrap()
    };
    assert_eq!(outcome("c"), DownloadOutcome::Skipped(SkipReason::NoUrl));
    assert_eq!(outcome("blank"), DownloadOutcome::Skipped(SkipReason::NoUrl));
    assert!(matches!(outcome("bad-url"), DownloadOutcome::Failed(_)));
    assert!(matches!(outcome("../.."), DownloadOutcome::Failed(_)));
    assert_eq!(tracker.snapshot().processed(), 4);
}

#[test]
fn progress_channel_receives_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    let coord = coordinator(remote, dir.path(), 1);

    let items: Vec<CatalogItem> = (0..4)
        .map(|i| CatalogItem::new(format!("p{}", i)).with_audio_url(format!("http://cdn.test/p{}", i)))
        .collect();
    let tracker = Arc::new(ProgressTracker::new(4));
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    coord.download_batch(items, &tracker, Some(tx));

    let mut last = None;
    while let Ok(s) = rx.try_recv() {
        assert!(s.processed() <= s.total);
        last = Some(s);
    }
    assert_eq!(last.unwrap().downloaded, 4);
}

#[test]
fn empty_batch_returns_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let coord = coordinator(Arc::new(FakeRemote::default()), dir.path(), 3);
    let tracker = Arc::new(ProgressTracker::new(0));
    assert!(coord.download_batch(Vec::new(), &tracker, None).is_empty());
    assert_eq!(coord.concurrency(), 3);
}

#[test]
fn ids_with_the_same_sanitized_stem_keep_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    let coord = coordinator(Arc::clone(&remote), dir.path(), 1);

    let items = vec![
        CatalogItem::new("a b").with_audio_url("http://cdn.test/space.mp3"),
        CatalogItem::new("a/b").with_audio_url("http://cdn.test/slash.mp3"),
        CatalogItem::new("a_b").with_audio_url("http://cdn.test/plain.mp3"),
    ];
    let tracker = Arc::new(ProgressTracker::new(3));
    let results = coord.download_batch(items, &tracker, None);
    assert!(results.iter().all(|r| r.outcome == DownloadOutcome::Downloaded));
    assert_eq!(tracker.snapshot().downloaded, 3);

    let mut files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files.len(), 3, "{:?}", files);
    assert!(files.contains(&"a_b.mp3".to_string()));

    let bodies: HashSet<Vec<u8>> = files
        .iter()
        .map(|f| std::fs::read(dir.path().join(f)).unwrap())
        .collect();
    assert_eq!(bodies.len(), 3);
}
