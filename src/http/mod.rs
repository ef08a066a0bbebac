//! HTTP client module
//!
//! Provides a thin HTTP client over reqwest: base URL joining, default
//! headers, authentication and error classification.
//!
//! Every call is a single attempt. Retry policy belongs to the caller
//! (see the export engine), so nothing here sleeps or loops.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
