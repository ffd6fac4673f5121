//! Transport DTOs for the query surface.

use crate::{EdgeKind, EdgeRecord, EntityMention, NodeRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const LABEL_PREVIEW_CHARS: usize = 50;

/// Create-entry request. Content metadata (categories, entities) comes from
/// the caller's extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCreateRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub entities: BTreeSet<EntityMention>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntryCreateRequest {
    /// Short display label: the first 50 characters of content, ellipsized.
    pub fn label(&self) -> String {
        let mut chars = self.content.chars();
        let preview: String = chars.by_ref().take(LABEL_PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", preview)
        } else {
            preview
        }
    }
}

/// Node as rendered in a graph view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNodeView {
    pub id: String,
    pub label: String,
    /// Visualization size: view count + 1.
    pub size: u64,
    pub categories: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&NodeRecord> for GraphNodeView {
    fn from(node: &NodeRecord) -> Self {
        Self {
            id: node.id.clone(),
            label: node.label.clone(),
            size: node.view_count + 1,
            categories: node.categories.clone(),
            created_at: node.created_at,
        }
    }
}

/// Edge as rendered in a graph view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdgeView {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub kind: EdgeKind,
}

impl From<&EdgeRecord> for GraphEdgeView {
    fn from(edge: &EdgeRecord) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            weight: edge.weight,
            kind: edge.kind,
        }
    }
}

/// Query metadata echoed alongside a graph view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphViewMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    pub min_weight: f64,
    pub total_nodes: usize,
    pub total_edges: usize,
}

/// Bounded graph view: discovered nodes plus the weight-filtered edge set
/// induced on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNodeView>,
    pub edges: Vec<GraphEdgeView>,
    pub meta: GraphViewMeta,
}

impl GraphView {
    pub fn empty(meta: GraphViewMeta) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            meta,
        }
    }
}

/// One centrality-ranked entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: String,
    pub score: f64,
    pub label: String,
    pub categories: BTreeSet<String>,
}
