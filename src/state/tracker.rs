//! Progress tracker implementation
//!
//! Provides file-based marker persistence with atomic writes.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Suffix appended to the output path to name the progress file
pub const PROGRESS_SUFFIX: &str = ".progress";

/// Persists and restores the last committed page number
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    /// Path to the progress file
    path: PathBuf,
}

impl ProgressTracker {
    /// Create a tracker storing its marker at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create the tracker belonging to an output file
    pub fn for_output(output: impl AsRef<Path>) -> Self {
        let mut name = OsString::from(output.as_ref().as_os_str());
        name.push(PROGRESS_SUFFIX);
        Self::new(PathBuf::from(name))
    }

    /// Get the progress file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the marker, treating a corrupt file like a missing one.
    ///
    /// Any other read failure is returned: the caller must not mistake an
    /// unreadable marker for a fresh start and truncate committed output.
    pub async fn load(&self) -> Result<Option<u32>> {
        match self.try_load().await {
            Err(e @ Error::ProgressCorrupt { .. }) => {
                warn!("{e}; starting from page 1");
                Ok(None)
            }
            other => other,
        }
    }

    /// Load the marker, reporting a corrupt file as an error
    pub async fn try_load(&self) -> Result<Option<u32>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::progress(format!(
                    "Failed to read progress file {}: {e}",
                    self.path.display()
                )))
            }
        };

        contents
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| Error::ProgressCorrupt {
                path: self.path.clone(),
                contents,
            })
    }

    /// Durably overwrite the marker with `page`
    pub async fn save(&self, page: u32) -> Result<()> {
        // Write to temp file first, then rename for atomicity
        let temp_path = self.temp_path();
        write_synced(&temp_path, page.to_string().as_bytes())
            .await
            .map_err(|e| Error::progress(format!("Failed to write progress file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::progress(format!("Failed to rename progress file: {e}")))?;

        Ok(())
    }

    /// Remove the marker so the next run starts fresh
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::progress(format!(
                "Failed to remove progress file {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}
