//! Append-only JSONL dataset sink.
//!
//! One JSON object per line, written with a tokio mutex around the append
//! so concurrent finalizers never interleave partial lines. The parent
//! directory is created on first write.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::trace;

use zakazflow_core::sinks::{DatasetRecord, DatasetSink};
use zakazflow_types::error::SinkError;

pub struct JsonlDatasetSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlDatasetSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }
}

impl DatasetSink for JsonlDatasetSink {
    async fn append(&self, record: DatasetRecord) -> Result<(), SinkError> {
        let mut line =
            serde_json::to_string(&record).map_err(|e| SinkError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| SinkError::Transport(e.to_string()))?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        trace!(path = %self.path.display(), "dataset record appended");
        Ok(())
    }
}
