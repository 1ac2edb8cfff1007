use thiserror::Error;

/// Failure reported by an embedding backend. Always carries the underlying cause.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Embedding endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Embedding response could not be decoded: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding config error: {0}")]
    Config(String),
}
