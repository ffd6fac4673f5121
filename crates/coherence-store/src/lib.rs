//! Relation-sink adapters: in-memory and append-only JSONL file.

mod jsonl;
mod memory;

pub use coherence_types::{RelationSink, SinkError};
pub use jsonl::JsonlRelationSink;
pub use memory::MemoryRelationSink;
