//! # catalog-export
//!
//! Resumable export of a paged catalog API into an append-only JSON Lines
//! file.
//!
//! ## Features
//!
//! - **Resumable**: a progress marker next to the output records the last
//!   committed page; an interrupted run continues after it
//! - **Retry then skip**: a failed page is retried, then skipped so one bad
//!   page never stalls the export
//! - **Early stop**: an empty page ends the run even if more pages were
//!   announced
//! - **Configurable**: base URL, credentials, page size, delays and field
//!   names from a JSON file, the environment or flags
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_export::config::ExportConfig;
//! use catalog_export::cli::{Cli, Runner};
//!
//! #[tokio::main]
//! async fn main() -> catalog_export::Result<()> {
//!     let cli = Cli::parse_from(["catalog-export", "export", "--app-id", "my-app"]);
//!     let report = Runner::new(cli).export(false).await?;
//!     println!("{} records", report.records_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         ExportEngine                            │
//! │  resume point → page 1 → pages start..=total → report           │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │    Decode     │   State   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Basic    │ GET       │ Records       │ Marker    │ JSON Lines  │
//! │          │ Timeout   │ Total count   │ Atomic    │ Append +    │
//! │          │ Status    │ Page size     │ rename    │ rollback    │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication
pub mod auth;

/// HTTP client
pub mod http;

/// Response decoding
pub mod decode;

/// Page fetchers
pub mod fetch;

/// Page arithmetic and resume points
pub mod pagination;

/// Progress marker
pub mod state;

/// JSON Lines output
pub mod output;

/// Main execution engine
pub mod engine;

/// Export configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::ExportConfig;
pub use engine::{EngineConfig, ExportEngine, ExportOutcome, ExportReport, RetryPolicy};
pub use fetch::{ApiPageFetcher, PageFetcher};
pub use output::{JsonlSink, RecordSink};
pub use state::ProgressTracker;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
