//! In-memory relation sink (process lifetime only).

use coherence_types::{EdgeRecord, RelationSink, SinkError};
use tokio::sync::RwLock;

/// Keeps appended relations in a vec; used in tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryRelationSink {
    records: RwLock<Vec<EdgeRecord>>,
}

impl MemoryRelationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything appended so far, in append order.
    pub async fn records(&self) -> Vec<EdgeRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait::async_trait]
impl RelationSink for MemoryRelationSink {
    async fn append(&self, relations: &[EdgeRecord]) -> Result<(), SinkError> {
        self.records.write().await.extend_from_slice(relations);
        Ok(())
    }
}
