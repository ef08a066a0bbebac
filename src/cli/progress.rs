//! Page progress display
//!
//! The bar and the log output share stderr. Log lines go through
//! `SuspendingWriter`, which clears the bar, writes, then redraws it.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

const PAGE_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({eta})";

/// Bar counting committed pages, or a hidden one
pub fn page_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template(PAGE_TEMPLATE)
        .map(|s| s.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Log writer that keeps a progress bar intact
#[derive(Clone)]
pub struct SuspendingWriter<M> {
    bar: ProgressBar,
    inner: M,
}

impl<M> SuspendingWriter<M> {
    /// Wrap `inner`, suspending `bar` around every write
    pub fn new(bar: ProgressBar, inner: M) -> Self {
        Self { bar, inner }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for SuspendingWriter<M> {
    type Writer = Suspended<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        Suspended {
            bar: self.bar.clone(),
            inner: self.inner.make_writer(),
        }
    }
}

/// A single log write with the bar cleared
pub struct Suspended<W> {
    bar: ProgressBar,
    inner: W,
}

impl<W: Write> Write for Suspended<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| self.inner.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.bar.suspend(|| self.inner.write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
