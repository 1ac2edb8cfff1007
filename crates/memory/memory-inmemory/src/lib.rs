//! # Volatile Memory Store
//!
//! This crate provides an in-process implementation of the `MemoryStore` trait from `memory-core`.
//!
//! ## VolatileMemoryStore
//!
//! Keeps every collection in a map guarded by an async `RwLock`. Nothing is persisted.
//! It is the reference implementation of the store contract and the baseline for
//! similarity search: `nearest_matches` scores every record in the collection with
//! cosine similarity and ranks them with [`memory_core::similarity::rank`].
//!
//! **Policies**:
//! - Collections must be created explicitly; operations on a missing collection fail with
//!   `CollectionNotFound`. Creating an existing collection and deleting a missing one are no-ops.
//! - The embedding dimension of a collection is fixed by the first record written to it.
//!   Records and queries of another length fail with `DimensionMismatch`.
//! - Records with equal scores are returned in insertion order. Replacing a record keeps its
//!   original position.
//! - `list_collections` yields names in lexicographic order.
//!
//! ## Example
//!
//! ```rust
//! use futures::TryStreamExt;
//! use memory_core::{MemoryRecord, MemoryStore};
//! use memory_inmemory::VolatileMemoryStore;
//!
//! # async fn example() -> Result<(), memory_core::MemoryError> {
//! let store = VolatileMemoryStore::new();
//! store.create_collection("cats").await?;
//! store
//!     .upsert("cats", MemoryRecord::local("cat2", "orange tabby", vec![0.9, 0.1]))
//!     .await?;
//!
//! let hits: Vec<_> = store
//!     .nearest_matches("cats", &[1.0, 0.0], 3, 0.25)
//!     .try_collect()
//!     .await?;
//! assert_eq!(hits[0].record.key(), "cat2");
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use memory_core::similarity;
use memory_core::{MemoryError, MemoryRecord, MemoryStore, Result, SimilarityResult};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct StoredRecord {
    /// Insertion sequence number; kept when the record is replaced
    seq: u64,
    record: MemoryRecord,
}

#[derive(Debug, Default, Clone)]
struct Collection {
    records: HashMap<String, StoredRecord>,
    /// Fixed by the first record written
    dimension: Option<usize>,
    next_seq: u64,
}

impl Collection {
    fn check_dimension(&self, collection: &str, actual: usize) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(MemoryError::dimension_mismatch(collection, expected, actual))
            }
            _ => Ok(()),
        }
    }

    fn insert(&mut self, record: MemoryRecord) -> String {
        let key = record.metadata.id.clone();
        if self.dimension.is_none() {
            self.dimension = Some(record.embedding.len());
        }
        match self.records.get_mut(&key) {
            Some(existing) => existing.record = record,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.records.insert(key.clone(), StoredRecord { seq, record });
            }
        }
        key
    }

    /// Records in insertion order.
    fn ordered(&self) -> Vec<&MemoryRecord> {
        let mut stored: Vec<&StoredRecord> = self.records.values().collect();
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| &s.record).collect()
    }
}

/// In-process memory store holding all collections in memory.
#[derive(Debug, Clone, Default)]
pub struct VolatileMemoryStore {
    collections: Arc<RwLock<BTreeMap<String, Collection>>>,
}

impl VolatileMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records in a collection.
    pub async fn len(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.records.len())
            .ok_or_else(|| MemoryError::collection_not_found(collection))
    }

    /// Returns true if the collection holds no records.
    pub async fn is_empty(&self, collection: &str) -> Result<bool> {
        Ok(self.len(collection).await? == 0)
    }

    /// Returns the embedding dimension of a collection, once a record has been written to it.
    pub async fn dimension(&self, collection: &str) -> Result<Option<usize>> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.dimension)
            .ok_or_else(|| MemoryError::collection_not_found(collection))
    }

    /// Validates every record and writes them under one lock, so a rejected batch writes nothing.
    async fn write_records(
        &self,
        collection: &str,
        records: Vec<MemoryRecord>,
    ) -> Result<Vec<String>> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| MemoryError::collection_not_found(collection))?;

        let mut expected = target.dimension;
        for record in &records {
            record.validate()?;
            let actual = record.embedding.len();
            match expected {
                Some(dim) if dim != actual => {
                    return Err(MemoryError::dimension_mismatch(collection, dim, actual));
                }
                Some(_) => {}
                None => expected = Some(actual),
            }
        }

        Ok(records.into_iter().map(|r| target.insert(r)).collect())
    }
}

#[async_trait]
impl MemoryStore for VolatileMemoryStore {
    async fn create_collection(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(collection) {
            debug!(collection, "Volatile store collection already exists");
            return Ok(());
        }
        collections.insert(collection.to_string(), Collection::default());
        info!(collection, "Volatile store collection created");
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let removed = collections.remove(collection);
        let records = removed.as_ref().map(|c| c.records.len()).unwrap_or(0);
        info!(
            collection,
            existed = removed.is_some(),
            records,
            "Volatile store collection deleted"
        );
        Ok(())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let collections = self.collections.read().await;
        Ok(collections.contains_key(collection))
    }

    fn list_collections(&self) -> BoxStream<'_, Result<String>> {
        stream::once(async move {
            let collections = self.collections.read().await;
            let names: Vec<Result<String>> = collections.keys().cloned().map(Ok).collect();
            debug!(count = names.len(), "Volatile store list_collections returned");
            Ok::<_, MemoryError>(stream::iter(names))
        })
        .try_flatten()
        .boxed()
    }

    async fn get(&self, collection: &str, key: &str) -> Result<MemoryRecord> {
        info!(collection, key, "Querying volatile store by key");
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| MemoryError::collection_not_found(collection))?;
        target
            .records
            .get(key)
            .map(|s| s.record.clone())
            .ok_or_else(|| MemoryError::not_found(collection, key))
    }

    fn get_batch<'a>(
        &'a self,
        collection: &'a str,
        keys: &'a [String],
    ) -> BoxStream<'a, Result<MemoryRecord>> {
        stream::once(async move {
            let collections = self.collections.read().await;
            let target = collections
                .get(collection)
                .ok_or_else(|| MemoryError::collection_not_found(collection))?;
            let found: Vec<Result<MemoryRecord>> = keys
                .iter()
                .filter_map(|key| target.records.get(key))
                .map(|s| Ok(s.record.clone()))
                .collect();
            info!(
                collection,
                requested = keys.len(),
                found = found.len(),
                "Volatile store get_batch returned"
            );
            Ok::<_, MemoryError>(stream::iter(found))
        })
        .try_flatten()
        .boxed()
    }

    async fn upsert(&self, collection: &str, record: MemoryRecord) -> Result<String> {
        info!(
            collection,
            key = %record.metadata.id,
            dimension = record.embedding.len(),
            "Writing record to volatile store"
        );
        let mut keys = self.write_records(collection, vec![record]).await?;
        keys.pop()
            .ok_or_else(|| MemoryError::InvalidRecord("upsert produced no key".to_string()))
    }

    fn upsert_batch<'a>(
        &'a self,
        collection: &'a str,
        records: Vec<MemoryRecord>,
    ) -> BoxStream<'a, Result<String>> {
        stream::once(async move {
            let count = records.len();
            let keys = self.write_records(collection, records).await?;
            info!(collection, count, "Volatile store upsert_batch written");
            Ok::<_, MemoryError>(stream::iter(keys.into_iter().map(Ok::<String, MemoryError>)))
        })
        .try_flatten()
        .boxed()
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| MemoryError::collection_not_found(collection))?;
        let removed = target.records.remove(key).is_some();
        info!(collection, key, removed, "Volatile store remove");
        Ok(())
    }

    async fn remove_batch(&self, collection: &str, keys: &[String]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| MemoryError::collection_not_found(collection))?;
        let removed = keys
            .iter()
            .filter(|key| target.records.remove(key.as_str()).is_some())
            .count();
        info!(
            collection,
            requested = keys.len(),
            removed,
            "Volatile store remove_batch"
        );
        Ok(())
    }

    fn nearest_matches<'a>(
        &'a self,
        collection: &'a str,
        embedding: &'a [f32],
        limit: usize,
        min_relevance_score: f64,
    ) -> BoxStream<'a, Result<SimilarityResult>> {
        stream::once(async move {
            info!(
                collection,
                dimension = embedding.len(),
                limit,
                min_relevance_score,
                "Querying volatile store nearest_matches"
            );
            let collections = self.collections.read().await;
            let target = collections
                .get(collection)
                .ok_or_else(|| MemoryError::collection_not_found(collection))?;
            target.check_dimension(collection, embedding.len())?;

            let hits =
                similarity::top_matches(embedding, target.ordered(), limit, min_relevance_score);
            info!(
                collection,
                scanned = target.records.len(),
                count = hits.len(),
                "Volatile store nearest_matches returned"
            );
            Ok::<_, MemoryError>(stream::iter(
                hits.into_iter().map(Ok::<SimilarityResult, MemoryError>),
            ))
        })
        .try_flatten()
        .boxed()
    }
}
