//! TEI (Text Embeddings Inference) bridge.
//!
//! Implements the `Embedder` trait by proxying requests to an external
//! TEI-compatible embedding server via HTTP. Both the offline build and
//! query-time retrieval go through this bridge, so index and query vectors
//! always come from the same model.

use serde::Serialize;
use ureq::Agent;

use super::Embedder;
use crate::error::RecError;

/// Configuration for the TEI HTTP bridge.
#[derive(Debug, Clone)]
pub struct TeiConfig {
    /// Base URL of the embedding server (e.g., `http://localhost:8080`).
    pub base_url: String,
    /// Bearer token, if the server requires one.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Whether to request normalized embeddings.
    pub normalize: bool,
    /// Whether to truncate inputs exceeding the model's max length.
    /// Catalog chunks can outrun small embedding models, so this defaults on.
    pub truncate: bool,
}

impl Default for TeiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 30,
            normalize: true,
            truncate: true,
        }
    }
}

/// Request body for the TEI `/embed` endpoint.
#[derive(Serialize)]
struct TeiEmbedRequest<'a> {
    inputs: &'a [String],
    normalize: bool,
    truncate: bool,
}

/// Embedder that proxies to an external TEI-compatible server.
pub struct TeiEmbedder {
    url: String,
    agent: Agent,
    config: TeiConfig,
}

impl TeiEmbedder {
    /// Create a new TEI embedder with the given configuration.
    pub fn new(config: TeiConfig) -> Self {
        let url = format!("{}/embed", config.base_url.trim_end_matches('/'));
        let agent_config = Agent::config_builder()
            .timeout_global(Some(std::time::Duration::from_secs(config.timeout_secs)))
            .build();
        let agent = Agent::new_with_config(agent_config);
        Self { url, agent, config }
    }
}

impl Embedder for TeiEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RecError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            batch_size = texts.len(),
            url = %self.url,
            "Sending embedding request"
        );

        let body = TeiEmbedRequest {
            inputs: texts,
            normalize: self.config.normalize,
            truncate: self.config.truncate,
        };

        let mut request = self.agent.post(&self.url);
        if let Some(key) = &self.config.api_key {
            let auth = format!("Bearer {}", key.trim());
            request = request.header("Authorization", auth.as_str());
        }

        let embeddings: Vec<Vec<f32>> = request
            .send_json(&body)
            .map_err(|e| RecError::Embedding(format!("embed request failed: {e}")))?
            .body_mut()
            .read_json()
            .map_err(|e| RecError::Embedding(format!("embed response parse error: {e}")))?;

        if embeddings.len() != texts.len() {
            return Err(RecError::Embedding(format!(
                "embedder returned {} vectors for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }

        tracing::debug!(
            batch_size = texts.len(),
            dimension = embeddings.first().map_or(0, |e| e.len()),
            "Embeddings received"
        );

        Ok(embeddings)
    }
}
