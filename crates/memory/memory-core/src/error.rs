//! Error taxonomy shared by all memory store backends.

use thiserror::Error;

/// Boxed underlying cause of a backend failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Collection not found: {collection}")]
    CollectionNotFound { collection: String },

    #[error("Record not found: {key} in collection {collection}")]
    NotFound { collection: String, key: String },

    /// Not returned by the bundled backends; both treat a repeated create as a no-op.
    #[error("Collection already exists: {collection}")]
    AlreadyExists { collection: String },

    #[error("Backend unavailable during {operation} on {collection}: {source}")]
    BackendUnavailable {
        operation: &'static str,
        collection: String,
        #[source]
        source: BoxError,
    },

    #[error("Backend error during {operation} on {collection}: {source}")]
    Backend {
        operation: &'static str,
        collection: String,
        #[source]
        source: BoxError,
    },

    #[error("Key {key:?} cannot be used in a filter: {reason}")]
    MalformedFilter { key: String, reason: &'static str },

    #[error("Embedding dimension mismatch in collection {collection}: expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Memory store has been closed")]
    Disposed,
}

impl MemoryError {
    pub fn collection_not_found(collection: &str) -> Self {
        Self::CollectionNotFound {
            collection: collection.to_string(),
        }
    }

    pub fn not_found(collection: &str, key: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    pub fn unavailable(
        operation: &'static str,
        collection: &str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::BackendUnavailable {
            operation,
            collection: collection.to_string(),
            source: source.into(),
        }
    }

    pub fn backend(operation: &'static str, collection: &str, source: impl Into<BoxError>) -> Self {
        Self::Backend {
            operation,
            collection: collection.to_string(),
            source: source.into(),
        }
    }

    pub fn dimension_mismatch(collection: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            collection: collection.to_string(),
            expected,
            actual,
        }
    }

    /// True for the "absent" variants (`NotFound`, `CollectionNotFound`).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::CollectionNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
