//! JSONL file-backed relation sink (append-only, survives restarts).

use coherence_types::{EdgeRecord, RelationSink, SinkError};
use tokio::io::AsyncWriteExt;

/// Appends one JSON line per relation. The file is never read back at
/// runtime; it only feeds an external graph rebuild after a restart.
pub struct JsonlRelationSink {
    path: std::path::PathBuf,
    append_lock: tokio::sync::Mutex<()>,
}

impl JsonlRelationSink {
    pub fn new(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            append_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait::async_trait]
impl RelationSink for JsonlRelationSink {
    async fn append(&self, relations: &[EdgeRecord]) -> Result<(), SinkError> {
        if relations.is_empty() {
            return Ok(());
        }
        let _guard = self.append_lock.lock().await;
        let mut buf = String::new();
        for record in relations {
            let line =
                serde_json::to_string(record).map_err(|e| SinkError::Other(e.to_string()))?;
            buf.push_str(&line);
            buf.push('\n');
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SinkError::Other(e.to_string()))?;
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| SinkError::Other(e.to_string()))?;
        Ok(())
    }
}
