//! Common types used throughout catalog-export
//!
//! This module contains shared type definitions, type aliases,
//! and the page request/response values passed between components.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// One catalog item, passed through to the output unmodified
///
/// Key order and number text survive a decode/encode round trip.
pub type Record = JsonValue;

// ============================================================================
// Page Types
// ============================================================================

/// Parameters for a single paged request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page_number: u32,
    /// Requested number of records per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
        }
    }
}

/// A decoded page of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResponse {
    /// Records in response order
    pub records: Vec<Record>,
    /// Total number of results across all pages
    pub total_result_count: u64,
    /// Page size the server actually applied
    pub effective_page_size: u32,
}

impl PageResponse {
    /// Create a new page response
    pub fn new(records: Vec<Record>, total_result_count: u64, effective_page_size: u32) -> Self {
        Self {
            records,
            total_result_count,
            effective_page_size,
        }
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
