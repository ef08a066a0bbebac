//! Fetcher trait

use crate::error::Result;
use crate::types::{PageRequest, PageResponse};
use async_trait::async_trait;

/// Source of pages for the export engine
///
/// Implementations return `Err` for any transport, authentication,
/// status or decoding failure. One call is one outbound request.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a single page
    async fn fetch(&self, request: PageRequest) -> Result<PageResponse>;
}
