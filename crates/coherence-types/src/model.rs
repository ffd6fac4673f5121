//! Graph records shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Relationship kind between two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Nearest-neighbor match from the similarity oracle.
    Similarity,
    /// Shared entity mentions between two entries.
    Entity,
    /// Entries written within the same 24-hour window.
    Temporal,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Similarity => "similarity",
            EdgeKind::Entity => "entity",
            EdgeKind::Temporal => "temporal",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity mention carried on a node (surface text plus extractor kind).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityMention {
    pub text: String,
    pub kind: String,
}

impl EntityMention {
    pub fn new(text: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: kind.into(),
        }
    }
}

/// Graph node: one corpus entry. Label, categories, and entities come from the
/// upstream content pipeline; the graph never derives them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub categories: BTreeSet<String>,
    pub entities: BTreeSet<EntityMention>,
    pub view_count: u64,
}

/// Weighted typed edge. Identity is (source, target, kind); re-adding the same
/// identity overwrites the weight only. This is also the wire record appended
/// to the durable relation sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub kind: EdgeKind,
    pub created_at: DateTime<Utc>,
}

/// One nearest-neighbor hit returned by the similarity oracle.
#[derive(Debug, Clone)]
pub struct SimilarHit {
    pub id: String,
    pub score: f64,
}
