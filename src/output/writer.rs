//! JSON Lines writer
//!
//! Appends batches of records to a file, one JSON object per line.

use crate::error::{Error, Result};
use crate::types::Record;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

/// Destination for exported records
#[async_trait]
pub trait RecordSink: Send {
    /// Truncate the destination to empty
    async fn reset(&mut self) -> Result<()>;

    /// Append records in order. Either the whole batch lands or the
    /// destination is left as it was.
    async fn append(&mut self, records: &[Record]) -> Result<()>;
}

/// Encode records as JSON Lines, each line terminated by `\n`
pub fn encode_lines(records: &[Record]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

/// Record sink writing a JSON Lines file
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a sink for the file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Count the lines currently in the output; a missing file has none
    pub async fn line_count(&self) -> Result<u64> {
        let file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut lines = BufReader::new(file).lines();
        let mut count = 0;
        while lines.next_line().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::output(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn reset(&mut self) -> Result<()> {
        self.ensure_parent().await?;
        File::create(&self.path).await.map_err(|e| {
            Error::output(format!(
                "Failed to truncate {}: {e}",
                self.path.display()
            ))
        })?;
        debug!("Reset output {}", self.path.display());
        Ok(())
    }

    async fn append(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Encode everything before touching the file
        let buf = encode_lines(records)?;

        self.ensure_parent().await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::output(format!("Failed to open {}: {e}", self.path.display())))?;
        let original_len = file.metadata().await?.len();

        let written = async {
            file.write_all(&buf).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = written {
            // Drop any partial batch
            if let Err(trunc) = file.set_len(original_len).await {
                warn!(
                    "Failed to roll back partial write to {}: {trunc}",
                    self.path.display()
                );
            }
            return Err(Error::output(format!(
                "Failed to append to {}: {e}",
                self.path.display()
            )));
        }

        debug!(
            records = records.len(),
            bytes = buf.len(),
            "Appended to {}",
            self.path.display()
        );
        Ok(())
    }
}
