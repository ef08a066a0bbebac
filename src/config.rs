//! Export configuration
//!
//! All settings for a run live in one explicit `ExportConfig`, built from
//! defaults, an optional JSON file and command-line/environment overrides,
//! then validated before anything touches the network or disk.

use crate::auth::AuthConfig;
use crate::decode::ResponseFields;
use crate::engine::{EngineConfig, RetryPolicy};
use crate::error::{Error, Result, ResultExt};
use crate::fetch::QueryParams;
use crate::http::HttpClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.s24.com/v3/";

/// Complete configuration for an export run
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// API base URL; the endpoint is `{base_url}{app_id}/{resource}`
    pub base_url: String,
    /// Application id (basic auth username)
    pub app_id: Option<String>,
    /// Application key (basic auth password)
    pub app_key: Option<String>,
    /// Listed resource (e.g. "products")
    pub resource: String,
    /// Output JSON Lines file
    pub output: PathBuf,
    /// Requested records per page
    pub page_size: u32,
    /// Pause between pages in milliseconds
    pub page_delay_ms: u64,
    /// Wait before a retry in milliseconds
    pub retry_delay_ms: u64,
    /// Retries per failed page
    pub max_retries: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Paging query parameter names
    pub query: QueryParams,
    /// Response field names
    pub response: ResponseFields,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id: None,
            app_key: None,
            resource: "products".to_string(),
            output: PathBuf::from("data/products.jsonl"),
            page_size: 40,
            page_delay_ms: 100,
            retry_delay_ms: 5_000,
            max_retries: 1,
            timeout_secs: 30,
            query: QueryParams::default(),
            response: ResponseFields::default(),
        }
    }
}

impl ExportConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON file; absent keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&contents)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid config JSON: {e}")))
    }

    /// Set credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        self.app_id = Some(app_id.into());
        self.app_key = Some(app_key.into());
        self
    }

    /// Check that the config can drive a run
    pub fn validate(&self) -> Result<()> {
        require(self.app_id.as_deref(), "app_id")?;
        require(self.app_key.as_deref(), "app_key")?;

        let base = Url::parse(&self.base_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::invalid_value(
                "base_url",
                format!("'{}' cannot be used as a base URL", self.base_url),
            ));
        }

        if self.resource.trim().is_empty() {
            return Err(Error::invalid_value("resource", "must not be empty"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::missing_field("output"));
        }

        for (field, value) in [
            ("response.records", &self.response.records),
            ("response.total_results", &self.response.total_results),
            ("response.page_elements", &self.response.page_elements),
            ("query.page", &self.query.page),
            ("query.size", &self.query.size),
        ] {
            if value.trim().is_empty() {
                return Err(Error::invalid_value(field, "must not be empty"));
            }
        }

        Ok(())
    }

    /// Endpoint path relative to the base URL
    pub fn endpoint_path(&self) -> String {
        format!(
            "{}/{}",
            self.app_id.as_deref().unwrap_or_default().trim_matches('/'),
            self.resource.trim_matches('/')
        )
    }

    /// Basic auth from the application id and key
    pub fn auth(&self) -> AuthConfig {
        match (&self.app_id, &self.app_key) {
            (Some(id), Some(key)) => AuthConfig::basic(id, key),
            _ => AuthConfig::None,
        }
    }

    /// HTTP client settings
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }

    /// Engine settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new()
            .with_page_size(self.page_size)
            .with_page_delay(Duration::from_millis(self.page_delay_ms))
            .with_retry(RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.retry_delay_ms),
            ))
    }
}

// Keeps the application key out of logs.
impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("app_key", &self.app_key.as_ref().map(|_| "***"))
            .field("resource", &self.resource)
            .field("output", &self.output)
            .field("page_size", &self.page_size)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .field("query", &self.query)
            .field("response", &self.response)
            .finish()
    }
}

fn require(value: Option<&str>, field: &str) -> Result<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(Error::missing_field(field)),
    }
}
