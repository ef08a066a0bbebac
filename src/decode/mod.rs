//! Response decoder module
//!
//! Turns the JSON body of a paged listing response into a `PageResponse`.
//!
//! # Overview
//!
//! The listing endpoint returns an object carrying the total result count,
//! the page size the server applied, and the record array. Field names are
//! configurable through `ResponseFields` and may be dotted paths
//! (e.g. `"data.items"`).

mod decoder;
mod types;

pub use decoder::PageDecoder;
pub use types::ResponseFields;
