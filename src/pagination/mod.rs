//! Pagination module
//!
//! Page-number arithmetic for 1-based paged listings.
//!
//! # Overview
//!
//! - `total_pages` derives the page count from the first response
//! - `ResumePoint` turns a persisted progress marker into the first page
//!   still to be written

mod types;

pub use types::{total_pages, ResumePoint};
