//! Execution engine module
//!
//! The export loop: fetch, append, checkpoint, pace.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ExportEngine` - Drives a paged export into a record sink with resumption
//! - `EngineConfig` / `RetryPolicy` - Page size, pacing and retry settings
//! - `ExportReport` - What a run did and how it ended
//!
//! Pages are processed strictly one at a time. For every page the records
//! are appended to the sink before the progress marker is saved, so a
//! marker of `P` always means pages `1..=P` are in the output.

mod types;

pub use types::{EngineConfig, ExportOutcome, ExportReport, ExportStats, RetryPolicy};

use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::output::RecordSink;
use crate::pagination::{total_pages, ResumePoint};
use crate::state::ProgressTracker;
use crate::types::{PageRequest, PageResponse, Record};
use indicatif::ProgressBar;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Export engine for paged listings
pub struct ExportEngine<F, S> {
    /// Page source
    fetcher: F,
    /// Record destination
    sink: S,
    /// Progress marker
    tracker: ProgressTracker,
    /// Run configuration
    config: EngineConfig,
    /// Operator-facing progress display
    progress: ProgressBar,
}

impl<F: PageFetcher, S: RecordSink> ExportEngine<F, S> {
    /// Create a new export engine
    pub fn new(fetcher: F, sink: S, tracker: ProgressTracker) -> Self {
        Self {
            fetcher,
            sink,
            tracker,
            config: EngineConfig::default(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Set engine configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Report page progress on `bar`
    #[must_use]
    pub fn with_progress_bar(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    /// Run the export.
    ///
    /// Fetch failures never escape: a failed first page ends the run as
    /// `ExportOutcome::Aborted`, later pages are retried and then skipped.
    /// Errors from the sink or the tracker are returned as-is, with nothing
    /// after the failed step committed. An unreadable marker fails the run
    /// before the output is touched.
    pub async fn run(&mut self) -> Result<ExportReport> {
        let started = Instant::now();
        let resume = ResumePoint::from_marker(self.tracker.load().await?);
        let mut report = ExportReport::new(resume);

        match resume {
            ResumePoint::Fresh => {
                info!("No progress marker, starting a fresh export");
                self.sink.reset().await?;
            }
            ResumePoint::Resume { last_committed } => {
                info!("Resuming export after page {last_committed}");
            }
        }

        // Page 1 carries the total count; on resume it is only used for that.
        report.stats.requests += 1;
        let first = match self
            .fetcher
            .fetch(PageRequest::new(1, self.config.page_size))
            .await
        {
            Ok(page) => page,
            Err(e) => {
                error!("Initial fetch failed: {e}");
                report.stats.fetch_failures += 1;
                report.outcome = ExportOutcome::Aborted {
                    reason: e.to_string(),
                };
                return Ok(self.finish(report, started));
            }
        };

        report.total_results = first.total_result_count;
        let Some(total) = total_pages(first.total_result_count, first.effective_page_size) else {
            info!("No records found or total count unavailable");
            report.outcome = ExportOutcome::Empty;
            return Ok(self.finish(report, started));
        };
        report.total_pages = total;
        info!(
            "Found {} records across {} pages",
            first.total_result_count, total
        );

        let mut start_page = resume.start_page();
        self.progress.set_length(u64::from(total));
        self.progress
            .set_position(u64::from(start_page.saturating_sub(1).min(total)));

        if resume.is_fresh() {
            self.commit(1, &first.records, &mut report).await?;
            start_page = 2;
        }

        info!("Starting from page {start_page} of {total}");

        for page in start_page..=total {
            let Some(response) = self.fetch_with_retry(page, &mut report).await else {
                report.skipped_pages.push(page);
                continue;
            };

            if response.is_empty() {
                info!("No more records found at page {page}, stopping");
                report.outcome = ExportOutcome::StoppedEarly { empty_page: page };
                break;
            }

            self.commit(page, &response.records, &mut report).await?;

            if page < total && !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
        }

        Ok(self.finish(report, started))
    }

    /// Fetch a page, retrying per the retry policy. `None` means give up.
    async fn fetch_with_retry(
        &self,
        page: u32,
        report: &mut ExportReport,
    ) -> Option<PageResponse> {
        let request = PageRequest::new(page, self.config.page_size);
        let policy = self.config.retry;
        let mut attempt = 1;

        loop {
            report.stats.requests += 1;
            match self.fetcher.fetch(request).await {
                Ok(response) => return Some(response),
                Err(e) => {
                    report.stats.fetch_failures += 1;
                    if attempt >= policy.max_attempts() {
                        error!(
                            "Page {page} failed after {attempt} attempt(s): {e}; continuing to next page"
                        );
                        return None;
                    }
                    warn!(
                        "Error on page {page}: {e}; retrying in {:?} (attempt {}/{})",
                        policy.retry_delay,
                        attempt + 1,
                        policy.max_attempts()
                    );
                    tokio::time::sleep(policy.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Append a page's records, then advance the marker
    async fn commit(
        &mut self,
        page: u32,
        records: &[Record],
        report: &mut ExportReport,
    ) -> Result<()> {
        self.sink.append(records).await?;
        self.tracker.save(page).await?;

        report.pages_committed += 1;
        report.records_written += records.len();
        report.last_committed_page = Some(page);
        self.progress.inc(1);

        debug!(page, records = records.len(), "Committed page");
        Ok(())
    }

    fn finish(&self, mut report: ExportReport, started: Instant) -> ExportReport {
        report.stats.duration_ms = started.elapsed().as_millis() as u64;
        self.progress.finish();

        if !report.skipped_pages.is_empty() {
            warn!(
                "Skipped {} page(s): {:?}",
                report.skipped_pages.len(),
                report.skipped_pages
            );
        }
        info!(
            pages = report.pages_committed,
            records = report.records_written,
            requests = report.stats.requests,
            duration_ms = report.stats.duration_ms,
            "Export finished: {:?}",
            report.outcome
        );
        report
    }
}

#[cfg(test)]
mod tests;
