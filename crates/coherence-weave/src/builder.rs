//! Connection builder: runs the three relationship signals for one node and
//! commits the discovered edges to the graph and the durable mirror as a unit.

use chrono::Utc;
use coherence_graph::{GraphError, KnowledgeGraph};
use coherence_types::{
    EdgeKind, EdgeRecord, NodeRecord, OracleError, RelationSink, SimilarityOracle, SinkError,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Nearest-neighbor candidates requested from the oracle per build.
const SIMILAR_LIMIT: usize = 5;
/// Minimum entity-overlap ratio that becomes an edge.
const ENTITY_OVERLAP_THRESHOLD: f64 = 0.3;
/// Entries closer together than this window (seconds) are temporally related.
const TEMPORAL_WINDOW_SECS: i64 = 86_400;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("similarity oracle failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("relation sink failed: {0}")]
    Sink(#[from] SinkError),
}

impl ConnectError {
    /// Upstream failures may be retried by the caller; the rest are misuse.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectError::Oracle(_) | ConnectError::Sink(_))
    }
}

/// Discovers similarity/entity/temporal edges for one node. The entity and
/// temporal scans walk every other node; linear in corpus size by design.
pub struct ConnectionBuilder {
    oracle: Arc<dyn SimilarityOracle>,
    sink: Arc<dyn RelationSink>,
    similar_limit: usize,
}

impl ConnectionBuilder {
    pub fn new(oracle: Arc<dyn SimilarityOracle>, sink: Arc<dyn RelationSink>) -> Self {
        Self {
            oracle,
            sink,
            similar_limit: SIMILAR_LIMIT,
        }
    }

    pub fn with_similar_limit(mut self, limit: usize) -> Self {
        self.similar_limit = limit;
        self
    }

    /// Run all three signal sources for `id` and commit the resulting edges.
    ///
    /// Nothing reaches the graph unless the oracle call and the mirror write
    /// both succeed, and the edges then land in one write section, so readers
    /// never observe a partial edge set. An unknown id produces no edges.
    pub async fn connect(
        &self,
        graph: &KnowledgeGraph,
        id: &str,
    ) -> Result<Vec<EdgeRecord>, ConnectError> {
        let nodes = graph.snapshot_nodes().await;
        let Some(node) = nodes.iter().find(|n| n.id == id) else {
            return Ok(Vec::new());
        };
        let others: Vec<&NodeRecord> = nodes.iter().filter(|n| n.id != id).collect();

        let (similar, entity, temporal) = tokio::join!(
            self.oracle.top_similar(id, self.similar_limit),
            async { entity_candidates(node, &others) },
            async { temporal_candidates(node, &others) },
        );
        let similar = similar?;

        let now = Utc::now();
        let mut edges: Vec<EdgeRecord> = Vec::new();
        for hit in similar {
            if hit.id == id || !others.iter().any(|n| n.id == hit.id) {
                continue;
            }
            edges.push(EdgeRecord {
                source: id.to_string(),
                target: hit.id,
                weight: hit.score.clamp(0.0, 1.0),
                kind: EdgeKind::Similarity,
                created_at: now,
            });
        }
        for (target, weight) in entity {
            edges.push(EdgeRecord {
                source: id.to_string(),
                target,
                weight,
                kind: EdgeKind::Entity,
                created_at: now,
            });
        }
        for (target, weight) in temporal {
            edges.push(EdgeRecord {
                source: id.to_string(),
                target,
                weight,
                kind: EdgeKind::Temporal,
                created_at: now,
            });
        }

        if edges.is_empty() {
            tracing::debug!(node = id, "no connection candidates");
            return Ok(Vec::new());
        }

        // Mirror first: a sink failure must abort before the graph changes.
        self.sink.append(&edges).await?;
        let committed = graph.apply_edges(&edges).await?;
        tracing::debug!(node = id, edges = committed, "connections committed");
        Ok(edges)
    }
}

/// Entity overlap: |shared mention texts| / max(|a|, |b|), kept only above the
/// overlap threshold. Pairs sharing nothing are skipped before any ratio math.
fn entity_candidates(node: &NodeRecord, others: &[&NodeRecord]) -> Vec<(String, f64)> {
    let texts: BTreeSet<&str> = node.entities.iter().map(|m| m.text.as_str()).collect();
    if texts.is_empty() {
        return Vec::new();
    }
    let mut candidates = Vec::new();
    for other in others {
        let other_texts: BTreeSet<&str> = other.entities.iter().map(|m| m.text.as_str()).collect();
        let shared = texts.intersection(&other_texts).count();
        if shared == 0 {
            continue;
        }
        let weight = shared as f64 / texts.len().max(other_texts.len()) as f64;
        if weight > ENTITY_OVERLAP_THRESHOLD {
            candidates.push((other.id.clone(), weight));
        }
    }
    candidates
}

/// Temporal proximity: linear decay from 1.0 at Δt = 0 to nothing at the
/// 24-hour boundary.
fn temporal_candidates(node: &NodeRecord, others: &[&NodeRecord]) -> Vec<(String, f64)> {
    let mut candidates = Vec::new();
    for other in others {
        let delta = (node.created_at - other.created_at).num_seconds().abs();
        if delta < TEMPORAL_WINDOW_SECS {
            candidates.push((
                other.id.clone(),
                1.0 - delta as f64 / TEMPORAL_WINDOW_SECS as f64,
            ));
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use coherence_graph::SubgraphExtractor;
    use coherence_oracle::StaticSimilarityOracle;
    use coherence_store::MemoryRelationSink;
    use coherence_types::{EntityMention, SimilarHit};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_714_521_600 + secs, 0).unwrap()
    }

    fn mentions(texts: &[&str]) -> BTreeSet<EntityMention> {
        texts
            .iter()
            .map(|t| EntityMention::new(*t, "concept"))
            .collect()
    }

    fn node(id: &str, at: i64, entities: &[&str]) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            label: id.to_string(),
            created_at: ts(at),
            categories: BTreeSet::new(),
            entities: mentions(entities),
            view_count: 0,
        }
    }

    async fn upsert(graph: &KnowledgeGraph, record: &NodeRecord) {
        graph
            .upsert_node(
                &record.id,
                &record.label,
                record.created_at,
                record.categories.clone(),
                record.entities.clone(),
            )
            .await;
    }

    struct FailingOracle;

    #[async_trait::async_trait]
    impl SimilarityOracle for FailingOracle {
        async fn top_similar(
            &self,
            _node_id: &str,
            _limit: usize,
        ) -> Result<Vec<SimilarHit>, OracleError> {
            Err(OracleError::Other("oracle offline".to_string()))
        }
    }

    struct FailingSink;

    #[async_trait::async_trait]
    impl RelationSink for FailingSink {
        async fn append(&self, _relations: &[EdgeRecord]) -> Result<(), SinkError> {
            Err(SinkError::Other("disk full".to_string()))
        }
    }

    fn quiet_builder() -> (ConnectionBuilder, Arc<MemoryRelationSink>) {
        let sink = Arc::new(MemoryRelationSink::new());
        let builder = ConnectionBuilder::new(Arc::new(StaticSimilarityOracle::new()), sink.clone());
        (builder, sink)
    }

    #[test]
    fn entity_weight_is_monotone_in_shared_count() {
        let base = node("a", 0, &["x", "y", "z"]);
        let mut last = 0.0;
        for shared in [&["x"][..], &["x", "y"][..], &["x", "y", "z"][..]] {
            let mut texts = shared.to_vec();
            // Pad to keep both sets at three entries.
            for filler in ["p", "q"] {
                if texts.len() < 3 {
                    texts.push(filler);
                }
            }
            let other = node("b", 0, &texts);
            let others = vec![&other];
            let weight = entity_candidates(&base, &others)
                .pop()
                .map(|(_, w)| w)
                .unwrap_or(0.0);
            assert!(weight >= last);
            last = weight;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn zero_shared_entities_produce_no_candidate() {
        let a = node("a", 0, &["x", "y"]);
        let b = node("b", 0, &["p", "q"]);
        let others = vec![&b];
        assert!(entity_candidates(&a, &others).is_empty());

        let bare = node("c", 0, &[]);
        let others = vec![&a];
        assert!(entity_candidates(&bare, &others).is_empty());
    }

    #[test]
    fn weak_overlap_stays_below_the_threshold() {
        // 1 shared of max(4, 4) = 0.25, under the 0.3 floor.
        let a = node("a", 0, &["x", "y", "z", "w"]);
        let b = node("b", 0, &["x", "p", "q", "r"]);
        let others = vec![&b];
        assert!(entity_candidates(&a, &others).is_empty());
    }

    #[test]
    fn temporal_weight_strictly_decays_and_stops_at_the_window() {
        let base = node("a", 0, &[]);
        let mut last = f64::INFINITY;
        for (id, offset) in [("b", 0), ("c", 3_600), ("d", 43_200), ("e", 86_399)] {
            let other = node(id, offset, &[]);
            let others = vec![&other];
            let weight = temporal_candidates(&base, &others)[0].1;
            assert!(weight < last);
            last = weight;
        }

        let boundary = node("f", 86_400, &[]);
        let others = vec![&boundary];
        assert!(temporal_candidates(&base, &others).is_empty());
    }

    #[tokio::test]
    async fn unknown_node_builds_nothing() {
        let graph = KnowledgeGraph::new();
        let (builder, sink) = quiet_builder();
        let edges = builder.connect(&graph, "ghost").await.unwrap();
        assert!(edges.is_empty());
        assert!(sink.records().await.is_empty());
    }

    #[tokio::test]
    async fn oracle_hits_become_similarity_edges() {
        let graph = KnowledgeGraph::new();
        for record in [node("a", 0, &[]), node("b", 500_000, &[])] {
            upsert(&graph, &record).await;
        }
        let oracle =
            StaticSimilarityOracle::new().with_hits("a", vec![("b", 0.91), ("missing", 0.99)]);
        let sink = Arc::new(MemoryRelationSink::new());
        let builder = ConnectionBuilder::new(Arc::new(oracle), sink.clone());

        let edges = builder.connect(&graph, "a").await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "b");
        assert_eq!(edges[0].kind, EdgeKind::Similarity);
        assert_eq!(edges[0].weight, 0.91);

        // Graph and mirror saw the same single edge.
        assert_eq!(graph.edge_count().await, 1);
        assert_eq!(sink.records().await.len(), 1);
    }

    #[tokio::test]
    async fn scenario_three_entries_two_signals() {
        let graph = KnowledgeGraph::new();
        upsert(&graph, &node("a", 0, &["x", "y"])).await;
        upsert(&graph, &node("b", 3_600, &["x", "z"])).await;
        upsert(&graph, &node("c", 200_000, &[])).await;

        let (builder, sink) = quiet_builder();
        let edges = builder.connect(&graph, "a").await.unwrap();

        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.target == "b"));
        let entity = edges.iter().find(|e| e.kind == EdgeKind::Entity).unwrap();
        assert_eq!(entity.weight, 0.5);
        let temporal = edges.iter().find(|e| e.kind == EdgeKind::Temporal).unwrap();
        assert!((temporal.weight - 0.9583).abs() < 1e-4);
        assert_eq!(sink.records().await.len(), 2);

        let extractor = SubgraphExtractor::new(graph.clone());
        let loose = extractor.extract(Some("a"), 1, 0.4).await.unwrap();
        assert_eq!(loose.nodes.len(), 2);
        assert_eq!(loose.edges.len(), 2);

        let tight = extractor.extract(Some("a"), 1, 0.6).await.unwrap();
        assert_eq!(tight.nodes.len(), 2);
        assert_eq!(tight.edges.len(), 1);
        assert_eq!(tight.edges[0].kind, EdgeKind::Temporal);
    }

    #[tokio::test]
    async fn oracle_failure_aborts_before_anything_is_written() {
        let graph = KnowledgeGraph::new();
        upsert(&graph, &node("a", 0, &["x"])).await;
        upsert(&graph, &node("b", 60, &["x"])).await;

        let sink = Arc::new(MemoryRelationSink::new());
        let builder = ConnectionBuilder::new(Arc::new(FailingOracle), sink.clone());
        let err = builder.connect(&graph, "a").await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(graph.edge_count().await, 0);
        assert!(sink.records().await.is_empty());
    }

    #[tokio::test]
    async fn sink_failure_leaves_the_graph_untouched() {
        let graph = KnowledgeGraph::new();
        upsert(&graph, &node("a", 0, &["x"])).await;
        upsert(&graph, &node("b", 60, &["x"])).await;

        let builder = ConnectionBuilder::new(
            Arc::new(StaticSimilarityOracle::new()),
            Arc::new(FailingSink),
        );
        let err = builder.connect(&graph, "a").await.unwrap_err();

        assert!(matches!(err, ConnectError::Sink(_)));
        assert!(err.is_retryable());
        assert_eq!(graph.edge_count().await, 0);
    }

    #[tokio::test]
    async fn rebuilding_connections_only_reweights_existing_edges() {
        let graph = KnowledgeGraph::new();
        upsert(&graph, &node("a", 0, &["x", "y"])).await;
        upsert(&graph, &node("b", 3_600, &["x", "z"])).await;

        let (builder, _) = quiet_builder();
        builder.connect(&graph, "a").await.unwrap();
        assert_eq!(graph.edge_count().await, 2);

        // Same signals again: same identities, so the edge count is stable.
        builder.connect(&graph, "a").await.unwrap();
        assert_eq!(graph.edge_count().await, 2);
    }

    #[tokio::test]
    async fn out_of_range_oracle_scores_are_clamped() {
        let graph = KnowledgeGraph::new();
        upsert(&graph, &node("a", 0, &[])).await;
        upsert(&graph, &node("b", 500_000, &[])).await;

        let oracle = StaticSimilarityOracle::new().with_hits("a", vec![("b", 1.7)]);
        let builder =
            ConnectionBuilder::new(Arc::new(oracle), Arc::new(MemoryRelationSink::new()));
        let edges = builder.connect(&graph, "a").await.unwrap();
        assert_eq!(edges[0].weight, 1.0);
    }
}
