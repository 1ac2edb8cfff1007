//! # HuggingFace Embedding Service
//!
//! This crate provides an implementation of the `EmbeddingService` trait for a HuggingFace
//! text-embeddings inference endpoint.
//!
//! ## Wire format
//!
//! - **Request**: `POST <endpoint>` with JSON body `{"inputs": ["text", ...]}`,
//!   `Authorization: Bearer <api_key>` and `Accept: application/json`.
//! - **Response**: `{"embeddings": [[0.1, ...], ...]}`, one vector per input in input order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedding::EmbeddingService;
//! use hf_embedding::HfEmbedding;
//!
//! async fn example() -> Result<(), embedding::EmbeddingError> {
//!     let service = HfEmbedding::new("https://my-endpoint.endpoints.huggingface.cloud", "hf_...")?;
//!     let embedding = service.embed("Hello world").await?;
//!     println!("Embedding dimension: {}", embedding.len());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use embedding::{EmbeddingConfig, EmbeddingError, EmbeddingService};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// HuggingFace inference endpoint embedding service.
#[derive(Debug, Clone)]
pub struct HfEmbedding {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
}

impl HfEmbedding {
    /// Creates a new service for `endpoint`, authenticating with `api_key`.
    /// An empty `api_key` sends no Authorization header.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .build()
            .map_err(|e| EmbeddingError::Transport(Box::new(e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Creates a new service from a validated [`EmbeddingConfig`].
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;
        Self::new(config.endpoint.clone(), config.api_key.clone())
    }

    /// Uses a caller-provided HTTP client (shared pools, proxies, TLS settings).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingService for HfEmbedding {
    /// Generates embedding vectors for multiple texts in a single request.
    ///
    /// # Errors
    ///
    /// - `Transport` if the request cannot be sent or the body cannot be read
    /// - `Status` for a non-2xx response
    /// - `Decode` if the body is not the expected JSON
    /// - `CountMismatch` if `embeddings` is missing or has the wrong length
    #[instrument(skip(self, texts), fields(endpoint = %self.endpoint, batch_size = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            debug!("HF embed_batch empty input, skipping");
            return Ok(vec![]);
        }

        info!(batch_size = texts.len(), "step: embedding HF embed_batch request");

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&EmbeddingRequest { inputs: texts });
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "HF embed_batch request failed");
            EmbeddingError::Transport(Box::new(e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Transport(Box::new(e)))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "HF embed_batch returned error status");
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse =
            serde_json::from_str(&body).map_err(|e| EmbeddingError::Decode(Box::new(e)))?;
        let embeddings = parsed.embeddings.unwrap_or_default();

        if embeddings.len() != texts.len() {
            warn!(
                expected = texts.len(),
                got = embeddings.len(),
                "HF embed_batch response count mismatch"
            );
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        let dimension = embeddings.first().map(|v| v.len()).unwrap_or(0);
        info!(
            count = embeddings.len(),
            dimension,
            "step: embedding HF embed_batch done"
        );
        Ok(embeddings)
    }
}
