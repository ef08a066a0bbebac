//! CLI module
//!
//! Command-line interface for running exports.
//!
//! # Commands
//!
//! - `export` - Fetch every page into the output file (default)
//! - `check` - Fetch page 1 and report the catalog size
//! - `status` - Show the progress marker and output size

mod commands;
mod progress;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use progress::SuspendingWriter;
pub use runner::Runner;
