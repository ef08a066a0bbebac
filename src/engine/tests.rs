//! Tests for engine module

use super::*;
use crate::error::Error;
use crate::output::JsonlSink;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

// ============================================================================
// Test doubles
// ============================================================================

/// In-memory catalog of `{"id": n}` records served page by page
#[derive(Default)]
struct FakeCatalog {
    total: u64,
    page_size: u32,
    /// Remaining failures per page
    failures: Mutex<HashMap<u32, u32>>,
    /// Pages that come back with no records
    empty_pages: HashSet<u32>,
    /// Every page number requested, in order
    calls: Mutex<Vec<u32>>,
}

impl FakeCatalog {
    fn new(total: u64, page_size: u32) -> Self {
        Self {
            total,
            page_size,
            ..Self::default()
        }
    }

    fn failing(self, page: u32, times: u32) -> Self {
        self.failures.lock().unwrap().insert(page, times);
        self
    }

    fn empty_at(mut self, page: u32) -> Self {
        self.empty_pages.insert(page);
        self
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }

    fn records_for(&self, page: u32) -> Vec<Record> {
        let start = u64::from(page - 1) * u64::from(self.page_size);
        let end = (start + u64::from(self.page_size)).min(self.total);
        (start..end).map(|i| json!({"id": i + 1})).collect()
    }
}

#[async_trait]
impl PageFetcher for Arc<FakeCatalog> {
    async fn fetch(&self, request: PageRequest) -> Result<PageResponse> {
        let page = request.page_number;
        self.calls.lock().unwrap().push(page);

        if let Some(remaining) = self.failures.lock().unwrap().get_mut(&page) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::http_status(503, "unavailable"));
            }
        }

        let records = if self.empty_pages.contains(&page) {
            Vec::new()
        } else {
            self.records_for(page)
        };
        Ok(PageResponse::new(records, self.total, self.page_size))
    }
}

/// Sink that fails on a given append call, then delegates
struct FailingSink {
    inner: JsonlSink,
    appends: u32,
    fail_on: u32,
}

#[async_trait]
impl RecordSink for FailingSink {
    async fn reset(&mut self) -> Result<()> {
        self.inner.reset().await
    }

    async fn append(&mut self, records: &[Record]) -> Result<()> {
        self.appends += 1;
        if self.appends == self.fail_on {
            return Err(Error::output("disk full"));
        }
        self.inner.append(records).await
    }
}

fn fast_config(page_size: u32) -> EngineConfig {
    EngineConfig::new()
        .with_page_size(page_size)
        .with_page_delay(Duration::ZERO)
        .with_retry(RetryPolicy::new(1, Duration::ZERO))
}

fn engine_for(
    catalog: &Arc<FakeCatalog>,
    output: &Path,
) -> ExportEngine<Arc<FakeCatalog>, JsonlSink> {
    ExportEngine::new(
        Arc::clone(catalog),
        JsonlSink::new(output),
        ProgressTracker::for_output(output),
    )
    .with_config(fast_config(catalog.page_size))
}

fn read_ids(output: &Path) -> Vec<u64> {
    std::fs::read_to_string(output)
        .unwrap()
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["id"].as_u64().unwrap()
        })
        .collect()
}

fn ids_for_pages(catalog: &FakeCatalog, pages: &[u32]) -> Vec<u64> {
    pages
        .iter()
        .flat_map(|p| catalog.records_for(*p))
        .map(|r| r["id"].as_u64().unwrap())
        .collect()
}

/// Write pages `1..=pages` and their marker as a previous run would have
async fn seed_committed(catalog: &FakeCatalog, output: &Path, pages: u32) {
    let mut sink = JsonlSink::new(output);
    for page in 1..=pages {
        sink.append(&catalog.records_for(page)).await.unwrap();
    }
    ProgressTracker::for_output(output).save(pages).await.unwrap();
}

fn marker(output: &Path) -> Option<String> {
    std::fs::read_to_string(ProgressTracker::for_output(output).path()).ok()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_engine_config_default() {
    let config = EngineConfig::default();
    assert_eq!(config.page_size, 40);
    assert_eq!(config.page_delay, Duration::from_millis(100));
    assert_eq!(config.retry.max_retries, 1);
    assert_eq!(config.retry.retry_delay, Duration::from_secs(5));
}

#[test]
fn test_retry_policy_attempts() {
    assert_eq!(RetryPolicy::default().max_attempts(), 2);
    assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    assert_eq!(RetryPolicy::new(u32::MAX, Duration::ZERO).max_attempts(), u32::MAX);
}

#[test]
fn test_report_starts_at_resume_point() {
    let report = ExportReport::new(ResumePoint::Fresh);
    assert_eq!(report.last_committed_page, None);
    assert_eq!(report.outcome, ExportOutcome::Completed);

    let report = ExportReport::new(ResumePoint::Resume { last_committed: 4 });
    assert_eq!(report.last_committed_page, Some(4));
    assert!(report.skipped_pages.is_empty());
}

// ============================================================================
// Fresh run
// ============================================================================

#[tokio::test]
async fn test_full_export() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(95, 10));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.outcome, ExportOutcome::Completed);
    assert_eq!(report.total_results, 95);
    assert_eq!(report.total_pages, 10);
    assert_eq!(report.pages_committed, 10);
    assert_eq!(report.records_written, 95);
    assert_eq!(report.last_committed_page, Some(10));
    assert_eq!(report.stats.requests, 10);
    assert!(report.skipped_pages.is_empty());

    assert_eq!(read_ids(&output), (1..=95).collect::<Vec<_>>());
    assert_eq!(marker(&output), Some("10".to_string()));
    assert_eq!(catalog.calls(), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_single_page_export() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(3, 40));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.total_pages, 1);
    assert_eq!(read_ids(&output), vec![1, 2, 3]);
    assert_eq!(marker(&output), Some("1".to_string()));
    assert_eq!(catalog.calls(), vec![1]);
}

#[tokio::test]
async fn test_fresh_run_truncates_stale_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    std::fs::write(&output, "{\"id\":999}\n{\"id\":998}\n").unwrap();
    let catalog = Arc::new(FakeCatalog::new(4, 2));

    engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(read_ids(&output), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_corrupt_marker_restarts_from_page_one() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    std::fs::write(&output, "{\"id\":999}\n").unwrap();
    std::fs::write(ProgressTracker::for_output(&output).path(), "garbage").unwrap();
    let catalog = Arc::new(FakeCatalog::new(4, 2));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.resume, ResumePoint::Fresh);
    assert_eq!(read_ids(&output), vec![1, 2, 3, 4]);
    assert_eq!(marker(&output), Some("2".to_string()));
}

#[tokio::test]
async fn test_empty_catalog_writes_nothing() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    std::fs::write(&output, "{\"id\":999}\n").unwrap();
    let catalog = Arc::new(FakeCatalog::new(0, 40));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.outcome, ExportOutcome::Empty);
    assert_eq!(report.pages_committed, 0);
    assert!(output.exists());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    assert_eq!(marker(&output), None);
    assert_eq!(catalog.calls(), vec![1]);
}

// ============================================================================
// Early stop / retry / skip
// ============================================================================

#[tokio::test]
async fn test_empty_page_stops_early() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(50, 10).empty_at(3));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.total_pages, 5);
    assert_eq!(report.outcome, ExportOutcome::StoppedEarly { empty_page: 3 });
    assert_eq!(read_ids(&output), ids_for_pages(&catalog, &[1, 2]));
    assert_eq!(marker(&output), Some("2".to_string()));
    assert_eq!(catalog.calls(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_transient_failure_is_retried_once() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(30, 10).failing(2, 1));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.outcome, ExportOutcome::Completed);
    assert!(report.skipped_pages.is_empty());
    assert_eq!(report.stats.fetch_failures, 1);
    assert_eq!(read_ids(&output), (1..=30).collect::<Vec<_>>());
    assert_eq!(catalog.calls(), vec![1, 2, 2, 3]);
}

#[tokio::test]
async fn test_page_failing_twice_is_skipped() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(60, 10).failing(4, 2));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.outcome, ExportOutcome::Completed);
    assert_eq!(report.skipped_pages, vec![4]);
    assert_eq!(report.pages_committed, 5);
    assert_eq!(report.last_committed_page, Some(6));
    assert_eq!(
        read_ids(&output),
        ids_for_pages(&catalog, &[1, 2, 3, 5, 6])
    );
    assert_eq!(marker(&output), Some("6".to_string()));
    assert_eq!(catalog.calls(), vec![1, 2, 3, 4, 4, 5, 6]);
}

#[tokio::test]
async fn test_skipped_last_page_keeps_previous_marker() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(30, 10).failing(3, 2));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.skipped_pages, vec![3]);
    assert_eq!(marker(&output), Some("2".to_string()));
}

#[tokio::test]
async fn test_retry_count_is_configurable() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(20, 10).failing(2, 3));

    let config = fast_config(10).with_retry(RetryPolicy::new(3, Duration::ZERO));
    let report = engine_for(&catalog, &output)
        .with_config(config)
        .run()
        .await
        .unwrap();

    assert!(report.skipped_pages.is_empty());
    assert_eq!(catalog.calls(), vec![1, 2, 2, 2, 2]);
    assert_eq!(read_ids(&output), (1..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_no_retry_policy_skips_immediately() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(30, 10).failing(2, 1));

    let config = fast_config(10).with_retry(RetryPolicy::new(0, Duration::ZERO));
    let report = engine_for(&catalog, &output)
        .with_config(config)
        .run()
        .await
        .unwrap();

    assert_eq!(report.skipped_pages, vec![2]);
    assert_eq!(catalog.calls(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_retry_that_returns_empty_page_stops() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(40, 10).failing(3, 1).empty_at(3));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.outcome, ExportOutcome::StoppedEarly { empty_page: 3 });
    assert_eq!(marker(&output), Some("2".to_string()));
    assert_eq!(catalog.calls(), vec![1, 2, 3, 3]);
}

#[tokio::test]
async fn test_initial_fetch_failure_aborts() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(30, 10).failing(1, 5));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert!(matches!(report.outcome, ExportOutcome::Aborted { .. }));
    assert_eq!(report.pages_committed, 0);
    assert_eq!(marker(&output), None);
    // Page 1 is not retried
    assert_eq!(catalog.calls(), vec![1]);
}

// ============================================================================
// Resume
// ============================================================================

#[tokio::test]
async fn test_resume_refetches_page_one_for_metadata_only() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(50, 10));

    seed_committed(&catalog, &output, 3).await;

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.resume, ResumePoint::Resume { last_committed: 3 });
    assert_eq!(report.pages_committed, 2);
    assert_eq!(read_ids(&output), (1..=50).collect::<Vec<_>>());
    assert_eq!(marker(&output), Some("5".to_string()));
    assert_eq!(catalog.calls(), vec![1, 4, 5]);
}

#[tokio::test]
async fn test_resume_after_interruption_matches_uninterrupted_run() {
    let catalog = Arc::new(FakeCatalog::new(73, 10));

    let clean_dir = tempdir().unwrap();
    let clean = clean_dir.path().join("products.jsonl");
    engine_for(&catalog, &clean).run().await.unwrap();

    for committed in 1..8u32 {
        let dir = tempdir().unwrap();
        let output = dir.path().join("products.jsonl");

        // First run dies while writing page `committed + 1`
        let mut crashing = ExportEngine::new(
            Arc::clone(&catalog),
            FailingSink {
                inner: JsonlSink::new(&output),
                appends: 0,
                fail_on: committed + 1,
            },
            ProgressTracker::for_output(&output),
        )
        .with_config(fast_config(10));
        let err = crashing.run().await.unwrap_err();
        assert!(matches!(err, Error::Output { .. }));
        assert_eq!(marker(&output), Some(committed.to_string()));

        engine_for(&catalog, &output).run().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            std::fs::read_to_string(&clean).unwrap(),
            "interrupted after page {committed}"
        );
    }
}

#[tokio::test]
async fn test_resume_past_end_does_nothing() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(30, 10));

    engine_for(&catalog, &output).run().await.unwrap();
    let before = std::fs::read_to_string(&output).unwrap();

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert_eq!(report.outcome, ExportOutcome::Completed);
    assert_eq!(report.pages_committed, 0);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), before);
    assert_eq!(marker(&output), Some("3".to_string()));
}

#[tokio::test]
async fn test_resume_initial_failure_leaves_output_untouched() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    std::fs::write(&output, "{\"id\":1}\n").unwrap();
    ProgressTracker::for_output(&output).save(1).await.unwrap();
    let catalog = Arc::new(FakeCatalog::new(30, 1).failing(1, 1));

    let report = engine_for(&catalog, &output).run().await.unwrap();

    assert!(matches!(report.outcome, ExportOutcome::Aborted { .. }));
    assert_eq!(report.last_committed_page, Some(1));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "{\"id\":1}\n");
    assert_eq!(marker(&output), Some("1".to_string()));
}

#[tokio::test]
async fn test_unreadable_marker_keeps_committed_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    std::fs::write(&output, "{\"id\":1}\n{\"id\":2}\n").unwrap();
    std::fs::create_dir(ProgressTracker::for_output(&output).path()).unwrap();
    let catalog = Arc::new(FakeCatalog::new(30, 1));

    let err = engine_for(&catalog, &output).run().await.unwrap_err();

    assert!(matches!(err, Error::Progress { .. }), "got {err:?}");
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "{\"id\":1}\n{\"id\":2}\n"
    );
    assert!(catalog.calls().is_empty());
}

// ============================================================================
// Ordering guarantees
// ============================================================================

#[tokio::test]
async fn test_sink_failure_does_not_advance_marker() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let catalog = Arc::new(FakeCatalog::new(30, 10));

    let mut engine = ExportEngine::new(
        Arc::clone(&catalog),
        FailingSink {
            inner: JsonlSink::new(&output),
            appends: 0,
            fail_on: 2,
        },
        ProgressTracker::for_output(&output),
    )
    .with_config(fast_config(10));

    assert!(engine.run().await.is_err());
    assert_eq!(marker(&output), Some("1".to_string()));
    assert_eq!(read_ids(&output), ids_for_pages(&catalog, &[1]));
    // Nothing was fetched after the failed append
    assert_eq!(catalog.calls(), vec![1, 2]);
}

#[tokio::test]
async fn test_total_pages_fixed_from_first_response() {
    struct ShrinkingCatalog {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl PageFetcher for ShrinkingCatalog {
        async fn fetch(&self, request: PageRequest) -> Result<PageResponse> {
            *self.calls.lock().unwrap() += 1;
            // Page 1 claims 3 pages; later pages claim only 1
            let total = if request.page_number == 1 { 30 } else { 10 };
            let records = vec![json!({"page": request.page_number})];
            Ok(PageResponse::new(records, total, 10))
        }
    }

    let dir = tempdir().unwrap();
    let output = dir.path().join("products.jsonl");
    let fetcher = ShrinkingCatalog {
        calls: Mutex::new(0),
    };

    let mut engine = ExportEngine::new(
        fetcher,
        JsonlSink::new(&output),
        ProgressTracker::for_output(&output),
    )
    .with_config(fast_config(10));
    let report = engine.run().await.unwrap();

    assert_eq!(report.total_pages, 3);
    assert_eq!(report.pages_committed, 3);
    assert_eq!(marker(&output), Some("3".to_string()));
}
