//! Shared test helpers for semantic-memory.
//!
//! Provides KeywordEmbeddingService (deterministic embeddings from keywords) and
//! FailingEmbeddingService (always fails) so tests never call an embedding endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use embedding::{EmbeddingError, EmbeddingService};

/// Embeds text into 4 dimensions: colour words, coat words, breed-origin words and a constant.
#[derive(Default)]
pub struct KeywordEmbeddingService {
    pub calls: AtomicUsize,
}

impl KeywordEmbeddingService {
    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0, 0.0, 0.0, 0.1];
        for word in text.to_lowercase().split_whitespace() {
            match word {
                "orange" | "tabby" | "ginger" => v[0] += 1.0,
                "british" | "short" | "hair" => v[1] += 1.0,
                "norwegian" | "forest" => v[2] += 1.0,
                _ => {}
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingService for KeywordEmbeddingService {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Embedding service whose endpoint always answers 503.
#[allow(dead_code)]
pub struct FailingEmbeddingService;

#[async_trait]
impl EmbeddingService for FailingEmbeddingService {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Status {
            status: 503,
            body: "model loading".to_string(),
        })
    }
}
