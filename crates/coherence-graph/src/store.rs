//! In-memory graph store: entry nodes plus weighted typed edges.

use crate::GraphError;
use chrono::{DateTime, Utc};
use coherence_types::{EdgeKind, EdgeRecord, EntityMention, NodeRecord};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Key of an edge relative to one endpoint: (other endpoint id, kind).
pub(crate) type EdgeSlot = (String, EdgeKind);

/// All graph data behind one lock, so every mutation and every whole traversal
/// serializes through a single exclusion scope.
#[derive(Default)]
pub(crate) struct GraphState {
    /// node id -> record.
    pub(crate) nodes: HashMap<String, NodeRecord>,
    /// source id -> (target id, kind) -> edge. BTreeMap keeps iteration order
    /// deterministic across runs.
    pub(crate) out: HashMap<String, BTreeMap<EdgeSlot, EdgeRecord>>,
    /// target id -> (source id, kind) back references into `out`.
    pub(crate) inc: HashMap<String, BTreeSet<EdgeSlot>>,
}

impl GraphState {
    fn upsert_edge(&mut self, edge: EdgeRecord) {
        let source = edge.source.clone();
        let target = edge.target.clone();
        let kind = edge.kind;
        let fwd = self.out.entry(source.clone()).or_default();
        if let Some(existing) = fwd.get_mut(&(target.clone(), kind)) {
            existing.weight = edge.weight;
            return;
        }
        fwd.insert((target.clone(), kind), edge);
        self.inc.entry(target).or_default().insert((source, kind));
    }

    pub(crate) fn edge(&self, source: &str, target: &str, kind: EdgeKind) -> Option<&EdgeRecord> {
        self.out.get(source)?.get(&(target.to_string(), kind))
    }

    /// Successor and predecessor edges of one node: (neighbor id, edge) pairs,
    /// outgoing first, each side in deterministic order.
    pub(crate) fn incident(&self, id: &str) -> Vec<(&str, &EdgeRecord)> {
        let mut pairs: Vec<(&str, &EdgeRecord)> = Vec::new();
        if let Some(fwd) = self.out.get(id) {
            for ((target, _), edge) in fwd {
                pairs.push((target.as_str(), edge));
            }
        }
        if let Some(back) = self.inc.get(id) {
            for (source, kind) in back {
                if let Some(edge) = self.edge(source, id, *kind) {
                    pairs.push((source.as_str(), edge));
                }
            }
        }
        pairs
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.out.values().map(BTreeMap::len).sum()
    }
}

/// Shared handle to one graph instance.
///
/// Cloning the handle shares the same store; separate `new()` calls are fully
/// isolated, so tests can run any number of graphs side by side.
#[derive(Clone, Default)]
pub struct KnowledgeGraph {
    inner: Arc<RwLock<GraphState>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read guard used by the query components so one traversal sees one
    /// consistent state.
    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.inner.read().await
    }

    /// Insert a node or replace its attributes. Edges are never touched, and
    /// the view counter survives re-upserts.
    pub async fn upsert_node(
        &self,
        id: &str,
        label: &str,
        created_at: DateTime<Utc>,
        categories: BTreeSet<String>,
        entities: BTreeSet<EntityMention>,
    ) {
        let mut state = self.inner.write().await;
        let view_count = state.nodes.get(id).map(|n| n.view_count).unwrap_or(0);
        state.nodes.insert(
            id.to_string(),
            NodeRecord {
                id: id.to_string(),
                label: label.to_string(),
                created_at,
                categories,
                entities,
                view_count,
            },
        );
    }

    /// Add one edge, or overwrite the weight when an edge with the same
    /// (source, target, kind) identity already exists. Both endpoints must be
    /// present; a self-loop request is a silent no-op.
    pub async fn add_edge(
        &self,
        source: &str,
        target: &str,
        weight: f64,
        kind: EdgeKind,
    ) -> Result<(), GraphError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(GraphError::InvalidParameter(format!(
                "edge weight must be in [0, 1], got {weight}"
            )));
        }
        if source == target {
            return Ok(());
        }
        let mut state = self.inner.write().await;
        if !state.nodes.contains_key(source) {
            return Err(GraphError::NotFound(source.to_string()));
        }
        if !state.nodes.contains_key(target) {
            return Err(GraphError::NotFound(target.to_string()));
        }
        state.upsert_edge(EdgeRecord {
            source: source.to_string(),
            target: target.to_string(),
            weight,
            kind,
            created_at: Utc::now(),
        });
        Ok(())
    }

    /// Batch commit used by the connection builder: every edge lands in one
    /// write section, so readers see either none of them or all of them.
    /// Endpoints are re-checked under the lock; edges whose endpoints vanished
    /// since the candidates were computed are dropped, as are self-loops.
    /// Returns the number committed.
    pub async fn apply_edges(&self, edges: &[EdgeRecord]) -> Result<usize, GraphError> {
        for edge in edges {
            if !(0.0..=1.0).contains(&edge.weight) {
                return Err(GraphError::InvalidParameter(format!(
                    "edge weight must be in [0, 1], got {}",
                    edge.weight
                )));
            }
        }
        let mut state = self.inner.write().await;
        let mut committed = 0;
        for edge in edges {
            if edge.source == edge.target {
                continue;
            }
            if !state.nodes.contains_key(&edge.source) || !state.nodes.contains_key(&edge.target) {
                continue;
            }
            state.upsert_edge(edge.clone());
            committed += 1;
        }
        Ok(committed)
    }

    /// Remove a node and every incident edge (both directions) as one atomic
    /// step. Returns whether the node existed.
    pub async fn remove_node(&self, id: &str) -> bool {
        let mut state = self.inner.write().await;
        if state.nodes.remove(id).is_none() {
            return false;
        }
        if let Some(outgoing) = state.out.remove(id) {
            for (target, kind) in outgoing.into_keys() {
                if let Some(back) = state.inc.get_mut(&target) {
                    back.remove(&(id.to_string(), kind));
                    if back.is_empty() {
                        state.inc.remove(&target);
                    }
                }
            }
        }
        if let Some(incoming) = state.inc.remove(id) {
            for (source, kind) in incoming {
                if let Some(fwd) = state.out.get_mut(&source) {
                    fwd.remove(&(id.to_string(), kind));
                    if fwd.is_empty() {
                        state.out.remove(&source);
                    }
                }
            }
        }
        true
    }

    /// Clone of one node, if present.
    pub async fn get_node(&self, id: &str) -> Option<NodeRecord> {
        self.inner.read().await.nodes.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.nodes.contains_key(id)
    }

    /// Outgoing (neighbor id, edge) pairs in deterministic order. An unknown
    /// id yields nothing.
    pub async fn neighbors(&self, id: &str) -> Vec<(String, EdgeRecord)> {
        let state = self.inner.read().await;
        state
            .out
            .get(id)
            .into_iter()
            .flat_map(|fwd| fwd.iter())
            .map(|((target, _), edge)| (target.clone(), edge.clone()))
            .collect()
    }

    /// Incoming (neighbor id, edge) pairs in deterministic order.
    pub async fn predecessors(&self, id: &str) -> Vec<(String, EdgeRecord)> {
        let state = self.inner.read().await;
        state
            .inc
            .get(id)
            .into_iter()
            .flat_map(|back| back.iter())
            .filter_map(|(source, kind)| {
                state
                    .edge(source, id, *kind)
                    .map(|edge| (source.clone(), edge.clone()))
            })
            .collect()
    }

    /// Bump and return the view counter. Unlike the traversal queries there is
    /// no sensible empty default here, so a missing id is an error.
    pub async fn record_view(&self, id: &str) -> Result<u64, GraphError> {
        let mut state = self.inner.write().await;
        let node = state
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;
        node.view_count += 1;
        Ok(node.view_count)
    }

    pub async fn node_count(&self) -> usize {
        self.inner.read().await.nodes.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.inner.read().await.edge_count()
    }

    /// Copy of every node record, taken under one read guard. The connection
    /// builder scans this for its entity/temporal candidates; linear in corpus
    /// size by design.
    pub async fn snapshot_nodes(&self) -> Vec<NodeRecord> {
        self.inner.read().await.nodes.values().cloned().collect()
    }
}
