//! Trait seams for the external collaborators.

use crate::{EdgeRecord, SimilarHit};
use async_trait::async_trait;

/// Embedding-based nearest-neighbor search, treated as an opaque oracle.
///
/// Implementations exclude the query id from the result and apply their own
/// minimum-score floor before returning a candidate.
#[async_trait]
pub trait SimilarityOracle: Send + Sync {
    async fn top_similar(
        &self,
        node_id: &str,
        limit: usize,
    ) -> Result<Vec<SimilarHit>, OracleError>;
}

/// Append-only durable mirror for discovered relationships.
///
/// Never read back at runtime; it exists so an external process can rebuild
/// the graph after a restart.
#[async_trait]
pub trait RelationSink: Send + Sync {
    async fn append(&self, relations: &[EdgeRecord]) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("similarity oracle error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("relation sink error: {0}")]
    Other(String),
}
