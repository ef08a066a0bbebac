//! Decoder configuration types

use serde::{Deserialize, Serialize};

/// Names of the fields carrying page data in a listing response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseFields {
    /// Path to the record array
    pub records: String,
    /// Path to the total result count
    pub total_results: String,
    /// Path to the page size the server applied
    pub page_elements: String,
}

impl Default for ResponseFields {
    fn default() -> Self {
        Self {
            records: "products".to_string(),
            total_results: "totalResults".to_string(),
            page_elements: "pageElements".to_string(),
        }
    }
}
