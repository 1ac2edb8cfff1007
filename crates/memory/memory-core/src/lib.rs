//! # Memory Core
//!
//! Core types and traits for memory storage and similarity search.
//! Used by the store backends (`memory-inmemory`, `memory-lance`) and by `semantic-memory`.
//!
//! ## Modules
//!
//! - [`types`] - MemoryRecordMetadata, MemoryRecord, SimilarityResult
//! - [`store`] - MemoryStore trait
//! - [`error`] - MemoryError
//! - [`similarity`] - cosine similarity and result ranking

pub mod error;
pub mod similarity;
pub mod store;
pub mod types;

pub use error::*;
pub use store::*;
pub use types::*;
