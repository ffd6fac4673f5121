//! Weighted PageRank over the whole graph.

use crate::store::KnowledgeGraph;
use coherence_types::RankedNode;
use std::collections::HashMap;

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
/// Per-node convergence tolerance; the stop check scales it by node count.
const TOLERANCE: f64 = 1e-6;

/// Ranks entries by weighted PageRank. Every stored edge carries transition
/// mass in both directions, matching how every other read query traverses the
/// graph.
#[derive(Clone)]
pub struct CentralityRanker {
    graph: KnowledgeGraph,
}

impl CentralityRanker {
    pub fn new(graph: KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Top `limit` nodes by centrality score, descending (id as tie-break).
    /// An empty graph yields an empty ranking.
    pub async fn rank(&self, limit: usize) -> Vec<RankedNode> {
        let state = self.graph.read().await;
        let mut ids: Vec<&str> = state.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        let n = ids.len();
        if n == 0 {
            return Vec::new();
        }
        let index: HashMap<&str, usize> =
            ids.iter().copied().enumerate().map(|(i, id)| (id, i)).collect();

        // Symmetrized transition list: each stored edge contributes its weight
        // in both directions.
        let mut transitions: Vec<(usize, usize, f64)> = Vec::new();
        let mut out_weight = vec![0.0f64; n];
        for fwd in state.out.values() {
            for edge in fwd.values() {
                let (Some(&s), Some(&t)) = (
                    index.get(edge.source.as_str()),
                    index.get(edge.target.as_str()),
                ) else {
                    continue;
                };
                transitions.push((s, t, edge.weight));
                transitions.push((t, s, edge.weight));
                out_weight[s] += edge.weight;
                out_weight[t] += edge.weight;
            }
        }

        let mut ranks = vec![1.0 / n as f64; n];
        for _ in 0..MAX_ITERATIONS {
            let dangling: f64 = (0..n)
                .filter(|&i| out_weight[i] <= 0.0)
                .map(|i| ranks[i])
                .sum();
            let base = (1.0 - DAMPING) / n as f64 + DAMPING * dangling / n as f64;
            let mut next = vec![base; n];
            for &(from, to, weight) in &transitions {
                if out_weight[from] > 0.0 {
                    next[to] += DAMPING * ranks[from] * weight / out_weight[from];
                }
            }
            let err: f64 = next.iter().zip(&ranks).map(|(a, b)| (a - b).abs()).sum();
            ranks = next;
            if err < n as f64 * TOLERANCE {
                break;
            }
        }

        let mut scored: Vec<(usize, f64)> = ranks.into_iter().enumerate().collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ids[a.0].cmp(ids[b.0]))
        });
        scored
            .into_iter()
            .take(limit)
            .map(|(i, score)| {
                let node = &state.nodes[ids[i]];
                RankedNode {
                    id: node.id.clone(),
                    score,
                    label: node.label.clone(),
                    categories: node.categories.clone(),
                }
            })
            .collect()
    }
}
