//! # Text Embeddings
//!
//! This crate defines the embedding service interface for generating text embeddings.
//! Memory stores never call it; callers embed text first and hand vectors to the store.

use async_trait::async_trait;

mod config;
mod error;

pub use config::EmbeddingConfig;
pub use error::EmbeddingError;

/// Service for generating text embeddings.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates embedding vectors for multiple texts in a single call.
    /// Returns one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Generates an embedding vector for a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        match vectors.pop() {
            Some(vector) if vectors.is_empty() => Ok(vector),
            _ => Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len() + 1,
            }),
        }
    }
}
