//! # Memory Storage
//!
//! This module defines the memory store contract implemented by every backend
//! (volatile in-process storage, LanceDB, ...).
//!
//! Records live in named collections. A collection must exist before records are written to,
//! read from, removed from or searched in it; no backend creates collections implicitly.
//!
//! Batch operations return a [`BoxStream`] bound to the originating call. Items are produced
//! as the backend yields them and a failure is yielded in place, after which the stream ends.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;

use crate::error::Result;
use crate::types::{MemoryRecord, SimilarityResult};

/// Trait for storing, retrieving and searching memory records.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Creates a collection. No-op if it already exists.
    async fn create_collection(&self, collection: &str) -> Result<()>;

    /// Deletes a collection and all its records. No-op if it does not exist.
    async fn delete_collection(&self, collection: &str) -> Result<()>;

    /// Returns whether the collection exists. Fails only on backend failures.
    async fn collection_exists(&self, collection: &str) -> Result<bool>;

    /// Lists collection names.
    fn list_collections(&self) -> BoxStream<'_, Result<String>>;

    /// Retrieves a record by key. Fails with `NotFound` if the key is absent.
    async fn get(&self, collection: &str, key: &str) -> Result<MemoryRecord>;

    /// Retrieves the records for `keys`. Missing keys are skipped.
    fn get_batch<'a>(
        &'a self,
        collection: &'a str,
        keys: &'a [String],
    ) -> BoxStream<'a, Result<MemoryRecord>>;

    /// Inserts or replaces a record keyed by its id. Returns the key.
    async fn upsert(&self, collection: &str, record: MemoryRecord) -> Result<String>;

    /// Inserts or replaces records. Yields one key per input record, in input order.
    fn upsert_batch<'a>(
        &'a self,
        collection: &'a str,
        records: Vec<MemoryRecord>,
    ) -> BoxStream<'a, Result<String>>;

    /// Removes a record. No-op if the key is absent.
    async fn remove(&self, collection: &str, key: &str) -> Result<()>;

    /// Removes records. Absent keys are ignored.
    async fn remove_batch(&self, collection: &str, keys: &[String]) -> Result<()>;

    /// Returns up to `limit` records with a relevance score of at least `min_relevance_score`,
    /// ordered by descending score.
    fn nearest_matches<'a>(
        &'a self,
        collection: &'a str,
        embedding: &'a [f32],
        limit: usize,
        min_relevance_score: f64,
    ) -> BoxStream<'a, Result<SimilarityResult>>;

    /// Returns the best match at or above `min_relevance_score`, if any.
    async fn nearest_match(
        &self,
        collection: &str,
        embedding: &[f32],
        min_relevance_score: f64,
    ) -> Result<Option<SimilarityResult>> {
        let mut matches = self.nearest_matches(collection, embedding, 1, min_relevance_score);
        matches.try_next().await
    }
}
