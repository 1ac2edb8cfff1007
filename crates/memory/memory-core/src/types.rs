//! # Core Types
//!
//! This module defines the record model shared by every memory store backend.
//!
//! ## MemoryRecordMetadata
//!
//! Identity and descriptive fields of a stored memory. `id` is the key within a collection.
//!
//! ## MemoryRecord
//!
//! Metadata plus the embedding vector. Handed to a store by value.
//!
//! ## SimilarityResult
//!
//! A record paired with its relevance score. Produced by search operations only.

use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};

/// Identity and descriptive fields of a memory record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryRecordMetadata {
    /// Key of the record, unique within its collection
    pub id: String,
    /// True if the record points at external content instead of embedding raw text
    pub is_reference: bool,
    /// Name of the external source; empty when not a reference
    pub external_source_name: String,
    /// Free-text description
    pub description: String,
    /// The embedded content
    pub text: String,
    /// Opaque caller-defined metadata
    pub additional_metadata: String,
}

impl MemoryRecordMetadata {
    /// Metadata for a record that embeds `text` directly.
    pub fn local(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Metadata for a record that refers to content held by `external_source_name`.
    pub fn reference(
        id: impl Into<String>,
        external_source_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            is_reference: true,
            external_source_name: external_source_name.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_additional_metadata(mut self, additional_metadata: impl Into<String>) -> Self {
        self.additional_metadata = additional_metadata.into();
        self
    }
}

/// A memory record: metadata plus its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    /// Identity and descriptive fields
    pub metadata: MemoryRecordMetadata,
    /// Embedding vector; every record in a collection has the same length
    pub embedding: Vec<f32>,
}

impl MemoryRecord {
    pub fn new(metadata: MemoryRecordMetadata, embedding: Vec<f32>) -> Self {
        Self { metadata, embedding }
    }

    /// Shortcut for a non-reference record.
    pub fn local(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self::new(MemoryRecordMetadata::local(id, text), embedding)
    }

    /// The record's key within its collection.
    pub fn key(&self) -> &str {
        &self.metadata.id
    }

    /// Embedding dimensionality.
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    /// Checks the invariants every backend relies on: a non-empty id and a non-empty embedding.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.id.is_empty() {
            return Err(MemoryError::InvalidRecord("record id must not be empty".to_string()));
        }
        if self.embedding.is_empty() {
            return Err(MemoryError::InvalidRecord(format!(
                "record {} has an empty embedding",
                self.metadata.id
            )));
        }
        Ok(())
    }
}

/// A search hit: the matched record and its relevance score (higher = more similar).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityResult {
    pub record: MemoryRecord,
    pub relevance_score: f64,
}

impl SimilarityResult {
    pub fn new(record: MemoryRecord, relevance_score: f64) -> Self {
        Self {
            record,
            relevance_score,
        }
    }
}
