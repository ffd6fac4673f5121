//! Bounded simple-path enumeration between two entries.

use crate::store::KnowledgeGraph;
use crate::GraphError;
use std::collections::{HashSet, VecDeque};

/// Upper bound on returned paths per query.
const MAX_PATHS: usize = 5;

/// Enumerates simple paths between two nodes, treating every edge as
/// bidirectional like the other read queries.
#[derive(Clone)]
pub struct PathFinder {
    graph: KnowledgeGraph,
}

impl PathFinder {
    pub fn new(graph: KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Simple paths (no repeated node) from `source` to `target` with at most
    /// `cutoff` edges; at most 5 paths, shortest first, deterministic order.
    /// A missing endpoint or no route within the cutoff yields an empty vec.
    pub async fn find(
        &self,
        source: &str,
        target: &str,
        cutoff: usize,
    ) -> Result<Vec<Vec<String>>, GraphError> {
        if cutoff < 1 {
            return Err(GraphError::InvalidParameter(format!(
                "cutoff must be >= 1, got {cutoff}"
            )));
        }

        let state = self.graph.read().await;
        if !state.nodes.contains_key(source) || !state.nodes.contains_key(target) {
            return Ok(Vec::new());
        }
        if source == target {
            return Ok(vec![vec![source.to_string()]]);
        }

        #[derive(Clone)]
        struct Walk {
            current: String,
            node_ids: Vec<String>,
            visited: HashSet<String>,
        }

        let mut queue: VecDeque<Walk> = VecDeque::new();
        queue.push_back(Walk {
            current: source.to_string(),
            node_ids: vec![source.to_string()],
            visited: HashSet::from([source.to_string()]),
        });

        let mut results: Vec<Vec<String>> = Vec::new();
        while let Some(walk) = queue.pop_front() {
            if results.len() >= MAX_PATHS {
                break;
            }
            if walk.current == target {
                results.push(walk.node_ids);
                continue;
            }
            if walk.node_ids.len() - 1 >= cutoff {
                continue;
            }

            let mut successors: Vec<&str> = state
                .incident(&walk.current)
                .into_iter()
                .map(|(neighbor, _)| neighbor)
                .collect();
            successors.sort_unstable();
            successors.dedup();

            for next in successors {
                if walk.visited.contains(next) {
                    continue;
                }
                let mut extended = walk.clone();
                extended.current = next.to_string();
                extended.node_ids.push(next.to_string());
                extended.visited.insert(next.to_string());
                queue.push_back(extended);
            }
        }

        Ok(results)
    }
}
