//! Pagination types

/// Number of pages needed to cover `total_results` at `page_size` per page.
///
/// Returns `None` when there is nothing to page through: no results, or a
/// page size of zero.
pub fn total_pages(total_results: u64, page_size: u32) -> Option<u32> {
    if total_results == 0 || page_size == 0 {
        return None;
    }
    let pages = total_results.div_ceil(u64::from(page_size));
    Some(u32::try_from(pages).unwrap_or(u32::MAX))
}

/// Where a run starts, derived from the progress marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePoint {
    /// Nothing committed: truncate the output and start at page 1
    Fresh,
    /// Pages `1..=last_committed` are already in the output
    Resume {
        /// Highest committed page
        last_committed: u32,
    },
}

impl ResumePoint {
    /// Build a resume point from a loaded marker. A marker of 0 means
    /// nothing was committed.
    pub fn from_marker(marker: Option<u32>) -> Self {
        match marker {
            None | Some(0) => Self::Fresh,
            Some(last_committed) => Self::Resume { last_committed },
        }
    }

    /// First page that still needs fetching and writing
    pub fn start_page(self) -> u32 {
        match self {
            Self::Fresh => 1,
            Self::Resume { last_committed } => last_committed.saturating_add(1),
        }
    }

    /// Check if this is a fresh run
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}
