//! Similarity-oracle adapters: HTTP client plus a canned fixture for tests.

mod http;
#[cfg(feature = "test-util")]
pub mod mock;

pub use coherence_types::{OracleError, SimilarHit, SimilarityOracle};
pub use http::HttpSimilarityOracle;

#[cfg(feature = "test-util")]
pub use mock::StaticSimilarityOracle;
