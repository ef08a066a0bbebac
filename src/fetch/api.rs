//! Fetcher backed by the catalog listing endpoint

use super::types::PageFetcher;
use crate::decode::PageDecoder;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::types::{JsonValue, PageRequest, PageResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Names of the paging query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Parameter carrying the 1-based page number
    pub page: String,
    /// Parameter carrying the page size
    pub size: String,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            page: "page".to_string(),
            size: "size".to_string(),
        }
    }
}

/// Fetches pages from a paged listing endpoint over HTTP
#[derive(Debug)]
pub struct ApiPageFetcher {
    client: HttpClient,
    endpoint: String,
    params: QueryParams,
    decoder: PageDecoder,
}

impl ApiPageFetcher {
    /// Create a fetcher for `endpoint`, resolved against the client's base URL
    pub fn new(client: HttpClient, endpoint: impl Into<String>, decoder: PageDecoder) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            params: QueryParams::default(),
            decoder,
        }
    }

    /// Use custom paging parameter names
    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }
}

#[async_trait]
impl PageFetcher for ApiPageFetcher {
    async fn fetch(&self, request: PageRequest) -> Result<PageResponse> {
        let config = RequestConfig::new()
            .query(&self.params.page, request.page_number)
            .query(&self.params.size, request.page_size)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        let body: JsonValue = self
            .client
            .get_json_with_config(&self.endpoint, config)
            .await?;
        let page = self.decoder.decode(&body, request)?;

        debug!(
            page = request.page_number,
            records = page.len(),
            total = page.total_result_count,
            "Fetched page"
        );
        Ok(page)
    }
}
