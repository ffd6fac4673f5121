//! Fixture oracle for tests: canned hits, no network.

use coherence_types::{OracleError, SimilarHit, SimilarityOracle};
use std::collections::HashMap;

/// Oracle backed by a fixed table of hits per node id. Queries for unknown
/// ids return nothing, matching a real oracle with no close neighbors.
#[derive(Default)]
pub struct StaticSimilarityOracle {
    hits: HashMap<String, Vec<SimilarHit>>,
}

impl StaticSimilarityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, node_id: &str, hits: Vec<(&str, f64)>) -> Self {
        self.hits.insert(
            node_id.to_string(),
            hits.into_iter()
                .map(|(id, score)| SimilarHit {
                    id: id.to_string(),
                    score,
                })
                .collect(),
        );
        self
    }
}

#[async_trait::async_trait]
impl SimilarityOracle for StaticSimilarityOracle {
    async fn top_similar(
        &self,
        node_id: &str,
        limit: usize,
    ) -> Result<Vec<SimilarHit>, OracleError> {
        let mut hits = self.hits.get(node_id).cloned().unwrap_or_default();
        hits.retain(|h| h.id != node_id);
        hits.truncate(limit);
        Ok(hits)
    }
}
