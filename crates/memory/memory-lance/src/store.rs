//! LanceDB-based memory store implementation.
//!
//! Each collection is a Lance table with the layout from [`crate::schema`]. Writes go through
//! `merge_insert` keyed on the id column, so an upsert of an existing id replaces the row.
//! Nearest-match queries use Lance's native vector search and convert the returned distances
//! to relevance scores before the floor is applied. Ties keep the order Lance returns them
//! in, which is not guaranteed to be insertion order.
//! External: memory-core (MemoryStore, MemoryRecord), lancedb, arrow.

use std::collections::HashSet;

use arrow_array::{RecordBatch, RecordBatchIterator};
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use memory_core::{
    similarity, BoxError, MemoryError, MemoryRecord, MemoryStore, Result, SimilarityResult,
};

use crate::config::LanceConfig;
use crate::filter;
use crate::index_type::LanceIndexType;
use crate::schema::{self, EMBEDDING, ID};

/// Maps a lancedb error to the memory error taxonomy. Storage and transport failures
/// (object store, timeouts, remote HTTP and exhausted retries) are `BackendUnavailable`.
fn classify(operation: &'static str, collection: &str, err: lancedb::Error) -> MemoryError {
    match err {
        lancedb::Error::TableNotFound { .. } => MemoryError::collection_not_found(collection),
        lancedb::Error::ObjectStore { .. }
        | lancedb::Error::Timeout { .. }
        | lancedb::Error::Http { .. }
        | lancedb::Error::Retry { .. } => MemoryError::unavailable(operation, collection, err),
        other => MemoryError::backend(operation, collection, other),
    }
}

/// Ends a stream after the first error it yields.
fn stop_after_error<'a, T: Send + 'a>(
    items: impl Stream<Item = Result<T>> + Send + 'a,
) -> BoxStream<'a, Result<T>> {
    items
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}

/// Decodes a Lance record-batch stream into records, one Arrow batch at a time.
fn decode_records<'a, S, E>(
    batches: S,
    operation: &'static str,
    collection: &'a str,
) -> BoxStream<'a, Result<MemoryRecord>>
where
    S: Stream<Item = std::result::Result<RecordBatch, E>> + Send + 'a,
    E: Into<BoxError>,
{
    let records = batches
        .map(move |batch| -> Result<_> {
            let batch = batch.map_err(|e| MemoryError::backend(operation, collection, e))?;
            let records = schema::batch_to_records(&batch)
                .map_err(|e| MemoryError::backend(operation, collection, e))?;
            Ok(stream::iter(
                records.into_iter().map(Ok::<MemoryRecord, MemoryError>),
            ))
        })
        .try_flatten();
    stop_after_error(records)
}

/// LanceDB-based memory store.
///
/// `uri` may be a local directory or a remote `db://` LanceDB URI; a remote URI also needs
/// [`LanceConfig::api_key`]. The connection is held until
/// [`close`](Self::close) is called or the store is dropped; after `close` every operation
/// fails with [`MemoryError::Disposed`].
pub struct LanceMemoryStore {
    pub(crate) config: LanceConfig,
    db: RwLock<Option<lancedb::Connection>>,
}

impl LanceMemoryStore {
    /// Connects to the database at `uri` with default settings.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let store = LanceMemoryStore::connect("./data/lancedb").await?;
    /// store.create_collection("cats").await?;
    /// ```
    pub async fn connect(uri: impl Into<String>) -> Result<Self> {
        Self::with_config(LanceConfig {
            uri: uri.into(),
            ..Default::default()
        })
        .await
    }

    /// Connects with a custom [`LanceConfig`].
    pub async fn with_config(config: LanceConfig) -> Result<Self> {
        let mut builder = lancedb::connect(&config.uri);
        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key);
        }
        if let Some(region) = &config.region {
            builder = builder.region(region);
        }
        let db = builder.execute().await.map_err(|e| {
            error!(uri = %config.uri, error = %e, "Failed to connect to LanceDB");
            MemoryError::unavailable("connect", &config.uri, e)
        })?;
        info!(
            uri = %config.uri,
            remote = config.is_remote(),
            embedding_dim = config.embedding_dim,
            distance_type = ?config.distance_type,
            "Connected to LanceDB memory store"
        );

        Ok(Self {
            config,
            db: RwLock::new(Some(db)),
        })
    }

    pub fn config(&self) -> &LanceConfig {
        &self.config
    }

    /// Releases the connection. Safe to call more than once.
    pub async fn close(&self) {
        let released = self.db.write().await.take();
        if released.is_some() {
            info!(uri = %self.config.uri, "LanceDB memory store closed");
        } else {
            debug!(uri = %self.config.uri, "LanceDB memory store already closed");
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.db.read().await.is_none()
    }

    /// Number of records in a collection.
    pub async fn count(&self, collection: &str) -> Result<usize> {
        let table = self.open("count", collection).await?;
        table
            .count_rows(None)
            .await
            .map_err(|e| classify("count", collection, e))
    }

    /// Builds a vector index over the embedding column of a collection.
    ///
    /// IVF-based indexes need enough rows to train on; Lance rejects the request otherwise.
    pub async fn create_index(&self, collection: &str, index_type: LanceIndexType) -> Result<()> {
        let table = self.open("create_index", collection).await?;
        info!(collection, index_type = ?index_type, "Creating LanceDB vector index");
        table
            .create_index(&[EMBEDDING], index_type.to_index(self.config.distance_type))
            .execute()
            .await
            .map_err(|e| {
                error!(collection, error = %e, "Failed to create LanceDB vector index");
                classify("create_index", collection, e)
            })
    }

    async fn connection(&self) -> Result<lancedb::Connection> {
        self.db.read().await.clone().ok_or(MemoryError::Disposed)
    }

    async fn open(&self, operation: &'static str, collection: &str) -> Result<Table> {
        let db = self.connection().await?;
        db.open_table(collection)
            .execute()
            .await
            .map_err(|e| classify(operation, collection, e))
    }

    /// Embedding width declared by the collection's vector column.
    async fn dimension_of(
        &self,
        table: &Table,
        operation: &'static str,
        collection: &str,
    ) -> Result<usize> {
        let table_schema = table
            .schema()
            .await
            .map_err(|e| classify(operation, collection, e))?;
        schema::vector_dimension(&table_schema)
            .map_err(|e| MemoryError::backend(operation, collection, e))
    }

    /// Writes records in a single merge-insert. When an id occurs more than once the last
    /// occurrence is written. Returns the keys in input order.
    async fn write_records(
        &self,
        collection: &str,
        records: Vec<MemoryRecord>,
    ) -> Result<Vec<String>> {
        for record in &records {
            record.validate()?;
            filter::check_key(record.key())?;
        }

        let table = self.open("upsert", collection).await?;
        let keys: Vec<String> = records.iter().map(|r| r.metadata.id.clone()).collect();
        if records.is_empty() {
            return Ok(keys);
        }

        let dimension = self.dimension_of(&table, "upsert", collection).await?;
        if let Some(bad) = records.iter().find(|r| r.dimension() != dimension) {
            return Err(MemoryError::dimension_mismatch(
                collection,
                dimension,
                bad.dimension(),
            ));
        }

        let mut seen = HashSet::new();
        let mut unique: Vec<MemoryRecord> = records
            .into_iter()
            .rev()
            .filter(|r| seen.insert(r.metadata.id.clone()))
            .collect();
        unique.reverse();

        let batch = schema::records_to_batch(&unique, dimension)
            .map_err(|e| MemoryError::backend("upsert", collection, e))?;
        let batch_schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], batch_schema);

        let mut merge_insert = table.merge_insert(&[ID]);
        merge_insert
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge_insert.execute(Box::new(reader)).await.map_err(|e| {
            error!(collection, error = %e, "LanceDB merge_insert failed");
            classify("upsert", collection, e)
        })?;

        info!(
            collection,
            count = keys.len(),
            written = unique.len(),
            dimension,
            "Records written to LanceDB memory store"
        );
        Ok(keys)
    }
}

#[async_trait]
impl MemoryStore for LanceMemoryStore {
    async fn create_collection(&self, collection: &str) -> Result<()> {
        let db = self.connection().await?;
        if self.collection_exists(collection).await? {
            debug!(collection, "LanceDB collection already exists");
            return Ok(());
        }

        let result = db
            .create_empty_table(collection, schema::collection_schema(self.config.embedding_dim))
            .execute()
            .await;
        match result {
            Ok(_) => {
                info!(
                    collection,
                    dimension = self.config.embedding_dim,
                    "LanceDB collection created"
                );
                Ok(())
            }
            // Created concurrently by another caller.
            Err(lancedb::Error::TableAlreadyExists { .. }) => Ok(()),
            Err(e) => {
                error!(collection, error = %e, "Failed to create LanceDB collection");
                Err(classify("create_collection", collection, e))
            }
        }
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        let db = self.connection().await?;
        if !self.collection_exists(collection).await? {
            debug!(collection, "LanceDB collection does not exist, nothing to delete");
            return Ok(());
        }

        match db.drop_table(collection, &[]).await {
            Ok(()) => {
                info!(collection, "LanceDB collection deleted");
                Ok(())
            }
            Err(lancedb::Error::TableNotFound { .. }) => Ok(()),
            Err(e) => Err(classify("delete_collection", collection, e)),
        }
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let db = self.connection().await?;
        let names = db
            .table_names()
            .execute()
            .await
            .map_err(|e| classify("collection_exists", collection, e))?;
        Ok(names.iter().any(|name| name == collection))
    }

    fn list_collections(&self) -> BoxStream<'_, Result<String>> {
        stream::once(async move {
            let db = self.connection().await?;
            let names = db
                .table_names()
                .execute()
                .await
                .map_err(|e| classify("list_collections", "*", e))?;
            debug!(count = names.len(), "LanceDB list_collections returned");
            Ok::<_, MemoryError>(stream::iter(names.into_iter().map(Ok::<String, MemoryError>)))
        })
        .try_flatten()
        .boxed()
    }

    async fn get(&self, collection: &str, key: &str) -> Result<MemoryRecord> {
        info!(collection, key, "Querying LanceDB memory store by key");
        let keys = [key.to_string()];
        let mut records = self.get_batch(collection, &keys);
        records
            .try_next()
            .await?
            .ok_or_else(|| MemoryError::not_found(collection, key))
    }

    fn get_batch<'a>(
        &'a self,
        collection: &'a str,
        keys: &'a [String],
    ) -> BoxStream<'a, Result<MemoryRecord>> {
        stream::once(async move {
            if keys.is_empty() {
                self.connection().await?;
                return Ok(stream::empty().boxed());
            }
            let predicate = filter::id_in(keys)?;
            let table = self.open("get_batch", collection).await?;
            debug!(collection, requested = keys.len(), "LanceDB get_batch query");
            let batches = table
                .query()
                .only_if(predicate)
                .execute()
                .await
                .map_err(|e| classify("get_batch", collection, e))?;
            Ok::<_, MemoryError>(decode_records(batches, "get_batch", collection))
        })
        .try_flatten()
        .boxed()
    }

    async fn upsert(&self, collection: &str, record: MemoryRecord) -> Result<String> {
        info!(
            collection,
            key = %record.metadata.id,
            dimension = record.embedding.len(),
            "Writing record to LanceDB memory store"
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
            let keys = self.write_records(collection, records).await?;
            Ok::<_, MemoryError>(stream::iter(keys.into_iter().map(Ok::<String, MemoryError>)))
        })
        .try_flatten()
        .boxed()
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<()> {
        self.remove_batch(collection, &[key.to_string()]).await
    }

    async fn remove_batch(&self, collection: &str, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            self.connection().await?;
            return Ok(());
        }
        let predicate = filter::id_in(keys)?;
        let table = self.open("remove", collection).await?;
        table.delete(&predicate).await.map_err(|e| {
            error!(collection, error = %e, "LanceDB delete failed");
            classify("remove", collection, e)
        })?;
        info!(collection, requested = keys.len(), "LanceDB remove_batch");
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
                "Querying LanceDB nearest_matches"
            );
            let table = self.open("nearest_matches", collection).await?;
            let dimension = self.dimension_of(&table, "nearest_matches", collection).await?;
            if embedding.len() != dimension {
                return Err(MemoryError::dimension_mismatch(
                    collection,
                    dimension,
                    embedding.len(),
                ));
            }
            if limit == 0 {
                return Ok(stream::empty().boxed());
            }

            let distance_type = self.config.distance_type;
            let mut query = table
                .query()
                .nearest_to(embedding)
                .map_err(|e| classify("nearest_matches", collection, e))?
                .column(EMBEDDING)
                .distance_type(distance_type.as_lance_metric())
                .limit(limit);
            if self.config.use_exact_search {
                query = query.bypass_vector_index();
            }
            if let Some(rf) = self.config.refine_factor {
                query = query.refine_factor(rf);
            }
            if let Some(np) = self.config.nprobes {
                query = query.nprobes(np);
            }

            let batches: Vec<RecordBatch> = query
                .execute()
                .await
                .map_err(|e| classify("nearest_matches", collection, e))?
                .try_collect()
                .await
                .map_err(|e| MemoryError::backend("nearest_matches", collection, e))?;

            let mut candidates = Vec::new();
            for batch in &batches {
                let scored = schema::batch_to_scored(batch, distance_type)
                    .map_err(|e| MemoryError::backend("nearest_matches", collection, e))?;
                candidates.extend(scored);
            }
            let scanned = candidates.len();
            let hits = similarity::rank(candidates, limit, min_relevance_score);
            if hits.len() < scanned {
                debug!(
                    collection,
                    dropped = scanned - hits.len(),
                    "Candidates below relevance floor"
                );
            }
            info!(
                collection,
                count = hits.len(),
                "LanceDB nearest_matches returned"
            );
            Ok(stream::iter(hits.into_iter().map(Ok::<SimilarityResult, MemoryError>)).boxed())
        })
        .try_flatten()
        .boxed()
    }
}

impl Drop for LanceMemoryStore {
    fn drop(&mut self) {
        if self.db.get_mut().take().is_some() {
            debug!(uri = %self.config.uri, "LanceDB connection released on drop");
        }
    }
}
