//! Knowledge-graph store and the read-side query components.

mod paths;
mod rank;
mod store;
mod subgraph;

pub use paths::PathFinder;
pub use rank::CentralityRanker;
pub use store::KnowledgeGraph;
pub use subgraph::SubgraphExtractor;

/// Errors surfaced by graph operations and queries.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Referenced node id is absent and the operation has no empty default.
    #[error("node not found: {0}")]
    NotFound(String),
    /// Rejected before touching the graph.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
