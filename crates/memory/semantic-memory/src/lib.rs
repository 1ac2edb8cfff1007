//! # Semantic Memory
//!
//! Text-level facade over a [`MemoryStore`]: texts are embedded with an [`EmbeddingService`]
//! before being stored, and queries are embedded before a nearest-match search.
//! External interactions: EmbeddingService (embedding endpoint); MemoryStore (backend).

use std::sync::Arc;

use embedding::{EmbeddingError, EmbeddingService};
use futures::TryStreamExt;
use memory_core::{MemoryError, MemoryRecord, MemoryRecordMetadata, MemoryStore, SimilarityResult};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SemanticMemoryError {
    #[error(transparent)]
    Store(#[from] MemoryError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

pub type Result<T> = std::result::Result<T, SemanticMemoryError>;

/// Stores and searches texts by meaning.
///
/// Collections are created on first save. Reads and searches do not create them.
#[derive(Clone)]
pub struct SemanticMemory {
    store: Arc<dyn MemoryStore>,
    embedder: Arc<dyn EmbeddingService>,
}

impl SemanticMemory {
    pub fn new(store: Arc<dyn MemoryStore>, embedder: Arc<dyn EmbeddingService>) -> Self {
        Self { store, embedder }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Embeds `text` and saves it under `id`. Returns the stored key.
    pub async fn save_information(
        &self,
        collection: &str,
        id: &str,
        text: &str,
        description: &str,
        additional_metadata: &str,
    ) -> Result<String> {
        let metadata = MemoryRecordMetadata::local(id, text)
            .with_description(description)
            .with_additional_metadata(additional_metadata);
        self.save(collection, metadata).await
    }

    /// Embeds `text` and saves it as a reference to `external_id` in `external_source_name`.
    pub async fn save_reference(
        &self,
        collection: &str,
        external_id: &str,
        external_source_name: &str,
        text: &str,
        description: &str,
        additional_metadata: &str,
    ) -> Result<String> {
        let metadata = MemoryRecordMetadata::reference(external_id, external_source_name, text)
            .with_description(description)
            .with_additional_metadata(additional_metadata);
        self.save(collection, metadata).await
    }

    async fn save(&self, collection: &str, metadata: MemoryRecordMetadata) -> Result<String> {
        let embedding = self.embedder.embed(&metadata.text).await?;
        debug!(
            collection,
            key = %metadata.id,
            dimension = embedding.len(),
            "Text embedded for semantic memory"
        );

        self.store.create_collection(collection).await?;
        let key = self
            .store
            .upsert(collection, MemoryRecord::new(metadata, embedding))
            .await?;
        info!(collection, key = %key, "Saved to semantic memory");
        Ok(key)
    }

    /// Looks up a record by key. `None` when the key or the collection does not exist.
    pub async fn get(&self, collection: &str, key: &str) -> Result<Option<MemoryRecord>> {
        match self.store.get(collection, key).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, collection: &str, key: &str) -> Result<()> {
        self.store.remove(collection, key).await?;
        Ok(())
    }

    /// Returns up to `limit` records whose relevance to `query` is at least
    /// `min_relevance_score`, best first.
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
        min_relevance_score: f64,
    ) -> Result<Vec<SimilarityResult>> {
        info!(
            collection,
            query_len = query.len(),
            limit,
            min_relevance_score,
            "Semantic memory search"
        );
        let embedding = self.embedder.embed(query).await?;
        let results: Vec<SimilarityResult> = self
            .store
            .nearest_matches(collection, &embedding, limit, min_relevance_score)
            .try_collect()
            .await?;
        info!(collection, count = results.len(), "Semantic memory search returned");
        Ok(results)
    }

    /// Names of all collections in the store.
    pub async fn collections(&self) -> Result<Vec<String>> {
        let names = self.store.list_collections().try_collect().await?;
        Ok(names)
    }
}
