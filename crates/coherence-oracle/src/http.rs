//! HTTP client for an external nearest-neighbor search service.

use coherence_types::{OracleError, SimilarHit, SimilarityOracle};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SimilarResponse {
    results: Option<Vec<SimilarItem>>,
}

#[derive(Debug, Deserialize)]
struct SimilarItem {
    id: String,
    score: f64,
}

/// Oracle that POSTs to a vector-search endpoint (e.g. POST /similar).
pub struct HttpSimilarityOracle {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpSimilarityOracle {
    pub fn new(url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }

    pub fn from_env() -> Self {
        let url = std::env::var("SIMILAR_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8300/similar".to_string());
        let api_key = std::env::var("SIMILAR_API_KEY").ok();
        Self::new(url, api_key)
    }
}

#[async_trait::async_trait]
impl SimilarityOracle for HttpSimilarityOracle {
    async fn top_similar(
        &self,
        node_id: &str,
        limit: usize,
    ) -> Result<Vec<SimilarHit>, OracleError> {
        let body = serde_json::json!({
            "node_id": node_id,
            "limit": limit
        });
        let mut req = self.client.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req
            .send()
            .await
            .map_err(|e| OracleError::Other(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| OracleError::Other(e.to_string()))?;
        if !status.is_success() {
            return Err(OracleError::Other(format!(
                "similarity API error {}: {}",
                status, body
            )));
        }
        let parsed: SimilarResponse =
            serde_json::from_str(&body).map_err(|e| OracleError::Other(e.to_string()))?;
        Ok(parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .filter(|item| item.id != node_id)
            .map(|item| SimilarHit {
                id: item.id,
                score: item.score,
            })
            .collect())
    }
}
