//! Engine types
//!
//! Configuration, retry policy and run reports for the export engine.

use crate::pagination::ResumePoint;
use std::time::Duration;

/// Bounded retry policy for page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Wait before each retry
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Total attempts allowed per page
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Configuration for an export run
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Requested records per page
    pub page_size: u32,
    /// Pause between committed pages
    pub page_delay: Duration,
    /// Retry policy for failed page fetches
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: 40,
            page_delay: Duration::from_millis(100),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new engine config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the pause between pages
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Every page up to the total was attempted
    Completed,
    /// A page came back empty before the computed total was reached
    StoppedEarly {
        /// The empty page
        empty_page: u32,
    },
    /// The first response reported no results
    Empty,
    /// The metadata fetch of page 1 failed; nothing new was written
    Aborted {
        /// Error message of the failed fetch
        reason: String,
    },
}

/// Request statistics for a run
#[derive(Debug, Clone, Default)]
pub struct ExportStats {
    /// Fetch attempts made, including retries
    pub requests: u32,
    /// Fetch attempts that failed
    pub fetch_failures: u32,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Summary of an export run
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Where the run started
    pub resume: ResumePoint,
    /// Total results reported by page 1
    pub total_results: u64,
    /// Total pages derived from page 1
    pub total_pages: u32,
    /// Pages committed during this run
    pub pages_committed: u32,
    /// Records written during this run
    pub records_written: usize,
    /// Pages given up on after retries
    pub skipped_pages: Vec<u32>,
    /// Progress marker value at the end of the run
    pub last_committed_page: Option<u32>,
    /// How the run ended
    pub outcome: ExportOutcome,
    /// Request statistics
    pub stats: ExportStats,
}

impl ExportReport {
    /// Create an empty report for a run starting at `resume`
    pub fn new(resume: ResumePoint) -> Self {
        let last_committed_page = match resume {
            ResumePoint::Fresh => None,
            ResumePoint::Resume { last_committed } => Some(last_committed),
        };
        Self {
            resume,
            total_results: 0,
            total_pages: 0,
            pages_committed: 0,
            records_written: 0,
            skipped_pages: Vec::new(),
            last_committed_page,
            outcome: ExportOutcome::Completed,
            stats: ExportStats::default(),
        }
    }
}
