//! Coherence REST API binary.

use coherence_api::server::{self, AppState};
use coherence_graph::KnowledgeGraph;
use coherence_oracle::HttpSimilarityOracle;
use coherence_store::JsonlRelationSink;
use coherence_weave::ConnectionBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let graph = KnowledgeGraph::new();
    let oracle = Arc::new(HttpSimilarityOracle::from_env());
    let relations_path = std::env::var("COHERENCE_RELATIONS_PATH")
        .unwrap_or_else(|_| "./relations.jsonl".to_string());
    let sink = Arc::new(JsonlRelationSink::new(relations_path));
    let builder = ConnectionBuilder::new(oracle, sink);
    let state = Arc::new(AppState { graph, builder });

    let app = server::router(state);
    let addr: SocketAddr = std::env::var("COHERENCE_LISTEN")
        .unwrap_or_else(|_| "0.0.0.0:8002".to_string())
        .parse()?;
    tracing::info!("Coherence API listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
