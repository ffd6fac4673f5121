//! REST surface for the Coherence knowledge graph.

pub mod server;
