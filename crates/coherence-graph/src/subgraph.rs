//! Bounded subgraph extraction around a center entry.

use crate::store::{GraphState, KnowledgeGraph};
use crate::GraphError;
use coherence_types::{GraphEdgeView, GraphNodeView, GraphView, GraphViewMeta};
use std::collections::HashSet;

/// Extracts the weight-filtered neighborhood of a center node, or the full
/// graph when no center is given.
#[derive(Clone)]
pub struct SubgraphExtractor {
    graph: KnowledgeGraph,
}

impl SubgraphExtractor {
    pub fn new(graph: KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Nodes reachable from `center` within `depth` hops over edges (either
    /// direction) with weight >= `min_weight`, plus the full induced edge set
    /// on those nodes, including edges the traversal itself never used.
    ///
    /// A center missing from the graph yields an empty view rather than an
    /// error; no center at all yields the whole graph filtered by weight.
    pub async fn extract(
        &self,
        center: Option<&str>,
        depth: usize,
        min_weight: f64,
    ) -> Result<GraphView, GraphError> {
        if depth < 1 {
            return Err(GraphError::InvalidParameter(format!(
                "depth must be >= 1, got {depth}"
            )));
        }
        if !(0.0..=1.0).contains(&min_weight) {
            return Err(GraphError::InvalidParameter(format!(
                "min_weight must be in [0, 1], got {min_weight}"
            )));
        }

        let state = self.graph.read().await;
        let selected: Vec<String> = match center {
            Some(center_id) => {
                if !state.nodes.contains_key(center_id) {
                    return Ok(GraphView::empty(GraphViewMeta {
                        center: Some(center_id.to_string()),
                        depth: Some(depth),
                        min_weight,
                        total_nodes: 0,
                        total_edges: 0,
                    }));
                }
                bfs_nodes(&state, center_id, depth, min_weight)
            }
            None => state.nodes.keys().cloned().collect(),
        };
        Ok(render(
            &state,
            selected,
            center,
            center.map(|_| depth),
            min_weight,
        ))
    }
}

/// Visited-set BFS: round r examines the frontier's successor and predecessor
/// edges passing the weight threshold; a node is enqueued at most once.
fn bfs_nodes(state: &GraphState, center: &str, depth: usize, min_weight: f64) -> Vec<String> {
    let mut visited: HashSet<String> = HashSet::from([center.to_string()]);
    let mut frontier: Vec<String> = vec![center.to_string()];
    for _ in 0..depth {
        let mut next = Vec::new();
        for id in &frontier {
            for (neighbor, edge) in state.incident(id) {
                if edge.weight >= min_weight && !visited.contains(neighbor) {
                    visited.insert(neighbor.to_string());
                    next.push(neighbor.to_string());
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    visited.into_iter().collect()
}

fn render(
    state: &GraphState,
    mut ids: Vec<String>,
    center: Option<&str>,
    depth: Option<usize>,
    min_weight: f64,
) -> GraphView {
    ids.sort();
    let in_set: HashSet<&str> = ids.iter().map(String::as_str).collect();

    let nodes: Vec<GraphNodeView> = ids
        .iter()
        .filter_map(|id| state.nodes.get(id))
        .map(GraphNodeView::from)
        .collect();

    // Sorted ids plus BTreeMap slot order make the edge list deterministic.
    let mut edges: Vec<GraphEdgeView> = Vec::new();
    for id in &ids {
        if let Some(fwd) = state.out.get(id) {
            for edge in fwd.values() {
                if edge.weight >= min_weight && in_set.contains(edge.target.as_str()) {
                    edges.push(GraphEdgeView::from(edge));
                }
            }
        }
    }

    let meta = GraphViewMeta {
        center: center.map(str::to_string),
        depth,
        min_weight,
        total_nodes: nodes.len(),
        total_edges: edges.len(),
    };
    GraphView { nodes, edges, meta }
}
