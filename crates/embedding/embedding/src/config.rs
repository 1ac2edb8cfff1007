//! Embedding configuration loaded from environment variables.

use std::env;

use crate::EmbeddingError;

/// Endpoint and credentials of the embedding inference service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Full URL of the inference endpoint (EMBEDDING_ENDPOINT)
    pub endpoint: String,
    /// Bearer token sent with every request (EMBEDDING_API_KEY); may be empty for open endpoints
    pub api_key: String,
}

impl EmbeddingConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("EMBEDDING_ENDPOINT")
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            api_key: env::var("EMBEDDING_API_KEY").unwrap_or_default(),
        }
    }

    /// Validate config (endpoint must be an http(s) URL).
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.endpoint.is_empty() {
            return Err(EmbeddingError::Config(
                "EMBEDDING_ENDPOINT must be set".to_string(),
            ));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(EmbeddingError::Config(format!(
                "EMBEDDING_ENDPOINT must be an http(s) URL, got {}",
                self.endpoint
            )));
        }
        Ok(())
    }
}
