//! Axum router and handlers for the graph query surface.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use coherence_graph::{CentralityRanker, GraphError, KnowledgeGraph, PathFinder, SubgraphExtractor};
use coherence_types::{EntryCreateRequest, GraphView, RankedNode};
use coherence_weave::{ConnectError, ConnectionBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Shared application state: one graph plus the connection builder.
pub struct AppState {
    pub graph: KnowledgeGraph,
    pub builder: ConnectionBuilder,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/entries", post(create_entry))
        .route("/entries/:id", delete(delete_entry))
        .route("/entries/:id/views", post(record_view))
        .route("/graph", get(get_graph))
        .route("/graph/central", get(get_central))
        .route("/graph/paths", get(get_paths))
        .route("/stats", get(get_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler-level error with its HTTP mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("entry not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

fn graph_status(err: &GraphError) -> StatusCode {
    match err {
        GraphError::NotFound(_) => StatusCode::NOT_FOUND,
        GraphError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Graph(err) => graph_status(err),
            ApiError::Connect(ConnectError::Graph(err)) => graph_status(err),
            ApiError::Connect(err) if err.is_retryable() => StatusCode::BAD_GATEWAY,
            ApiError::Connect(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct EntryCreated {
    id: String,
    edges: usize,
}

async fn create_entry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EntryCreateRequest>,
) -> Result<(StatusCode, Json<EntryCreated>), ApiError> {
    let id = req
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let created_at = req.created_at.unwrap_or_else(Utc::now);
    state
        .graph
        .upsert_node(
            &id,
            &req.label(),
            created_at,
            req.categories.clone(),
            req.entities.clone(),
        )
        .await;
    let edges = state.builder.connect(&state.graph, &id).await?;
    tracing::info!(entry = %id, edges = edges.len(), "entry ingested");
    Ok((
        StatusCode::CREATED,
        Json(EntryCreated {
            id,
            edges: edges.len(),
        }),
    ))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.graph.remove_node(&id).await {
        tracing::info!(entry = %id, "entry removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(id))
    }
}

#[derive(Debug, Serialize)]
struct ViewCount {
    id: String,
    view_count: u64,
}

async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ViewCount>, ApiError> {
    let view_count = state.graph.record_view(&id).await?;
    Ok(Json(ViewCount { id, view_count }))
}

#[derive(Debug, Deserialize)]
struct GraphParams {
    entry_id: Option<String>,
    #[serde(default = "default_depth")]
    depth: usize,
    #[serde(default = "default_min_weight")]
    min_weight: f64,
}

fn default_depth() -> usize {
    2
}

fn default_min_weight() -> f64 {
    0.5
}

async fn get_graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Result<Json<GraphView>, ApiError> {
    let view = SubgraphExtractor::new(state.graph.clone())
        .extract(params.entry_id.as_deref(), params.depth, params.min_weight)
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct CentralParams {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

async fn get_central(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CentralParams>,
) -> Json<Vec<RankedNode>> {
    Json(
        CentralityRanker::new(state.graph.clone())
            .rank(params.limit)
            .await,
    )
}

#[derive(Debug, Deserialize)]
struct PathParams {
    source: String,
    target: String,
    #[serde(default = "default_cutoff")]
    cutoff: usize,
}

fn default_cutoff() -> usize {
    5
}

#[derive(Debug, Serialize)]
struct PathsView {
    paths: Vec<Vec<String>>,
}

async fn get_paths(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PathParams>,
) -> Result<Json<PathsView>, ApiError> {
    let paths = PathFinder::new(state.graph.clone())
        .find(&params.source, &params.target, params.cutoff)
        .await?;
    Ok(Json(PathsView { paths }))
}

#[derive(Debug, Serialize)]
struct Stats {
    nodes: usize,
    edges: usize,
    central: Vec<RankedNode>,
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<Stats> {
    let nodes = state.graph.node_count().await;
    let edges = state.graph.edge_count().await;
    let central = CentralityRanker::new(state.graph.clone()).rank(5).await;
    Json(Stats {
        nodes,
        edges,
        central,
    })
}
