//! Output module
//!
//! Handles writing exported records to durable storage.
//!
//! # Overview
//!
//! This module provides:
//! - `RecordSink` - the append/reset contract the export engine writes through
//! - `JsonlSink` - a JSON Lines file sink (one record per line, UTF-8)

mod writer;

pub use writer::{encode_lines, JsonlSink, RecordSink};
