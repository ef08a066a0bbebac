//! Page decoder implementation

use super::types::ResponseFields;
use crate::error::{Error, Result};
use crate::types::{PageRequest, PageResponse};
use serde_json::Value;

/// Decodes listing responses into pages
#[derive(Debug, Clone, Default)]
pub struct PageDecoder {
    fields: ResponseFields,
}

impl PageDecoder {
    /// Create a decoder for the given field names
    pub fn new(fields: ResponseFields) -> Self {
        Self { fields }
    }

    /// Decode a response body fetched for `request`.
    ///
    /// A missing total count decodes as 0 and a missing record array as an
    /// empty page. A missing or zero page size falls back to the requested
    /// size so page arithmetic never divides by zero.
    pub fn decode(&self, body: &Value, request: PageRequest) -> Result<PageResponse> {
        if !body.is_object() {
            return Err(Error::decode(format!(
                "Expected a JSON object, got {}",
                type_name(body)
            )));
        }

        let records = match lookup(body, &self.fields.records) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(Error::decode(format!(
                    "Field '{}' should be an array, got {}",
                    self.fields.records,
                    type_name(other)
                )))
            }
        };

        let total_result_count = lookup(body, &self.fields.total_results)
            .and_then(as_count)
            .unwrap_or(0);

        let effective_page_size = lookup(body, &self.fields.page_elements)
            .and_then(as_count)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(request.page_size);

        Ok(PageResponse::new(
            records,
            total_result_count,
            effective_page_size,
        ))
    }
}

/// Follow a dotted path through nested objects
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    path.split('.')
        .try_fold(value, |current, part| current.get(part))
}

/// Read a non-negative count from a number or numeric string
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
