//! State management module
//!
//! Handles the progress marker that makes exports resumable.
//!
//! # Overview
//!
//! The marker is a single decimal page number stored next to the output
//! file (`<output>.progress`). If it holds `P`, pages `1..=P` are fully
//! written to the output. It is overwritten, never appended, after each
//! committed page.

mod tracker;

pub use tracker::{ProgressTracker, PROGRESS_SUFFIX};
