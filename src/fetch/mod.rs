//! Page fetcher module
//!
//! The fetcher is the only component that talks to the network. It issues
//! exactly one request per call and never retries: retry policy belongs to
//! the export engine.

mod api;
mod types;

pub use api::{ApiPageFetcher, QueryParams};
pub use types::PageFetcher;
