//! LanceDB memory store integration tests
//!
//! Verifies against a local database in a temp dir:
//! - Collection lifecycle (create / exists / list / delete)
//! - Record round trip and replace-in-place upserts
//! - Batch get / remove semantics
//! - Injection-safe id filters
//! - Dimension checks against the collection schema
//! - Native nearest-match search and relevance floor
//! - Close / Disposed behaviour and persistence across reconnects

use futures::TryStreamExt;
use tempfile::TempDir;

use memory_core::{MemoryError, MemoryRecord, MemoryRecordMetadata, MemoryStore};
use memory_lance::{LanceConfig, LanceMemoryStore};

const DIM: usize = 3;

fn config_for(temp_dir: &TempDir) -> LanceConfig {
    let uri = temp_dir.path().join("lance_db").to_string_lossy().to_string();
    LanceConfig {
        use_exact_search: true,
        ..LanceConfig::new(uri, DIM)
    }
}

async fn open_store(temp_dir: &TempDir) -> LanceMemoryStore {
    LanceMemoryStore::with_config(config_for(temp_dir))
        .await
        .expect("Failed to create LanceMemoryStore")
}

fn cats() -> Vec<MemoryRecord> {
    vec![
        MemoryRecord::local("cat1", "british short hair", vec![0.2, 0.9, 0.3]),
        MemoryRecord::local("cat2", "orange tabby", vec![0.9, 0.1, 0.0]),
        MemoryRecord::local("cat3", "norwegian forest cat", vec![0.5, 0.2, 0.8]),
    ]
}

async fn store_with_cats(temp_dir: &TempDir) -> LanceMemoryStore {
    let store = open_store(temp_dir).await;
    store.create_collection("cats").await.unwrap();
    let keys: Vec<String> = store
        .upsert_batch("cats", cats())
        .try_collect()
        .await
        .unwrap();
    assert_eq!(keys, vec!["cat1", "cat2", "cat3"]);
    store
}

#[tokio::test]
async fn test_collection_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = open_store(&temp_dir).await;
    assert_eq!(store.config().embedding_dim, DIM);
    assert!(!store.config().is_remote());

    assert!(!store.collection_exists("cats").await.unwrap());
    store.create_collection("cats").await.unwrap();
    store.create_collection("dogs").await.unwrap();
    // Creating an existing collection is a no-op
    store.create_collection("cats").await.unwrap();
    assert!(store.collection_exists("cats").await.unwrap());

    let mut names: Vec<String> = store.list_collections().try_collect().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["cats", "dogs"]);

    store.delete_collection("dogs").await.unwrap();
    // Deleting a missing collection is a no-op
    store.delete_collection("dogs").await.unwrap();
    assert!(!store.collection_exists("dogs").await.unwrap());
}

#[tokio::test]
async fn test_operations_on_missing_collection() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = open_store(&temp_dir).await;

    let err = store
        .upsert("ghost", MemoryRecord::local("a", "x", vec![1.0, 0.0, 0.0]))
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::CollectionNotFound { .. }));

    let err = store.get("ghost", "a").await.unwrap_err();
    assert!(matches!(err, MemoryError::CollectionNotFound { .. }));

    let err = store
        .nearest_matches("ghost", &[1.0, 0.0, 0.0], 3, 0.0)
        .try_collect::<Vec<_>>()
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::CollectionNotFound { .. }));
}

#[tokio::test]
async fn test_upsert_and_get_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = open_store(&temp_dir).await;
    store.create_collection("docs").await.unwrap();

    let record = MemoryRecord::new(
        MemoryRecordMetadata::reference("doc-1", "wiki", "orange tabby")
            .with_description("cat breeds")
            .with_additional_metadata("{\"page\":3}"),
        vec![0.25, -0.5, 1.0],
    );
    let key = store.upsert("docs", record.clone()).await.unwrap();
    assert_eq!(key, "doc-1");

    let loaded = store.get("docs", &key).await.unwrap();
    assert_eq!(loaded, record);

    let err = store.get("docs", "doc-2").await.unwrap_err();
    assert!(matches!(err, MemoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_upsert_replaces_in_place() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;
    assert_eq!(store.count("cats").await.unwrap(), 3);

    store
        .upsert(
            "cats",
            MemoryRecord::local("cat2", "ginger tabby", vec![0.8, 0.2, 0.1]),
        )
        .await
        .unwrap();

    assert_eq!(store.count("cats").await.unwrap(), 3);
    let loaded = store.get("cats", "cat2").await.unwrap();
    assert_eq!(loaded.metadata.text, "ginger tabby");
    assert_eq!(loaded.embedding, vec![0.8, 0.2, 0.1]);
}

#[tokio::test]
async fn test_upsert_batch_with_duplicate_ids() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = open_store(&temp_dir).await;
    store.create_collection("cats").await.unwrap();

    let keys: Vec<String> = store
        .upsert_batch(
            "cats",
            vec![
                MemoryRecord::local("cat1", "first", vec![1.0, 0.0, 0.0]),
                MemoryRecord::local("cat1", "second", vec![0.0, 1.0, 0.0]),
            ],
        )
        .try_collect()
        .await
        .unwrap();

    assert_eq!(keys, vec!["cat1", "cat1"]);
    assert_eq!(store.count("cats").await.unwrap(), 1);
    assert_eq!(store.get("cats", "cat1").await.unwrap().metadata.text, "second");
}

#[tokio::test]
async fn test_get_batch_skips_missing_keys() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;

    let keys = vec!["cat1".to_string(), "cat9".to_string(), "cat3".to_string()];
    let mut found: Vec<String> = store
        .get_batch("cats", &keys)
        .map_ok(|r| r.metadata.id)
        .try_collect()
        .await
        .unwrap();
    found.sort();
    assert_eq!(found, vec!["cat1", "cat3"]);

    let none: Vec<MemoryRecord> = store.get_batch("cats", &[]).try_collect().await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_remove_batch_then_get_batch_is_empty() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;

    let keys = vec!["cat1".to_string(), "cat2".to_string(), "missing".to_string()];
    store.remove_batch("cats", &keys).await.unwrap();

    let left: Vec<MemoryRecord> = store.get_batch("cats", &keys).try_collect().await.unwrap();
    assert!(left.is_empty());
    assert_eq!(store.count("cats").await.unwrap(), 1);

    store.remove("cats", "cat3").await.unwrap();
    // Removing an absent key is a no-op
    store.remove("cats", "cat3").await.unwrap();
    assert_eq!(store.count("cats").await.unwrap(), 0);
}

#[tokio::test]
async fn test_filter_injection_does_not_widen_match() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;

    let hostile = "x' OR '1'='1";
    let err = store.get("cats", hostile).await.unwrap_err();
    assert!(matches!(err, MemoryError::NotFound { .. }));

    let keys = vec![hostile.to_string(), "cat1') OR (id = 'cat2".to_string()];
    let matched: Vec<MemoryRecord> = store.get_batch("cats", &keys).try_collect().await.unwrap();
    assert!(matched.is_empty());

    store.remove("cats", hostile).await.unwrap();
    assert_eq!(store.count("cats").await.unwrap(), 3);

    // Ids with quotes are stored and matched exactly
    let quoted = MemoryRecord::local("o'brien", "irish cat", vec![0.3, 0.3, 0.3]);
    store.upsert("cats", quoted.clone()).await.unwrap();
    assert_eq!(store.get("cats", "o'brien").await.unwrap(), quoted);
    store.remove("cats", "o'brien").await.unwrap();
    assert_eq!(store.count("cats").await.unwrap(), 3);
}

#[tokio::test]
async fn test_unsafe_ids_are_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;

    let err = store.get("cats", "bad\0id").await.unwrap_err();
    assert!(matches!(err, MemoryError::MalformedFilter { .. }));

    let err = store
        .upsert("cats", MemoryRecord::local("back\\slash", "x", vec![1.0, 0.0, 0.0]))
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::MalformedFilter { .. }));

    let err = store
        .upsert("cats", MemoryRecord::local("", "x", vec![1.0, 0.0, 0.0]))
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::InvalidRecord(_)));
}

#[tokio::test]
async fn test_dimension_mismatch() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;

    let err = store
        .upsert("cats", MemoryRecord::local("cat4", "sphynx", vec![1.0, 0.0]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MemoryError::DimensionMismatch {
            expected: 3,
            actual: 2,
            ..
        }
    ));

    let err = store
        .nearest_match("cats", &[1.0, 0.0, 0.0, 0.0], 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::DimensionMismatch { .. }));
    assert_eq!(store.count("cats").await.unwrap(), 3);
}

#[tokio::test]
async fn test_nearest_matches_cats() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;

    // Synthetic embedding for "My favorite color is orange"
    let query: [f32; 3] = [1.0, 0.0, 0.0];
    let results: Vec<_> = store
        .nearest_matches("cats", &query, 3, 0.25)
        .try_collect()
        .await
        .unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.record.key()).collect();
    assert_eq!(ids, vec!["cat2", "cat3"]);
    assert!(results
        .windows(2)
        .all(|w| w[0].relevance_score >= w[1].relevance_score));
    assert!(results.iter().all(|r| r.relevance_score >= 0.25));
    assert!((results[0].relevance_score - 0.9939).abs() < 1e-3);

    let best = store
        .nearest_match("cats", &query, 0.25)
        .await
        .unwrap()
        .expect("expected a match");
    assert_eq!(best.record, results[0].record);

    let limited: Vec<_> = store
        .nearest_matches("cats", &query, 1, 0.0)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);

    let none = store.nearest_match("cats", &query, 0.999).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_zero_embedding_scores_zero() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;
    store
        .upsert("cats", MemoryRecord::local("blank", "", vec![0.0, 0.0, 0.0]))
        .await
        .unwrap();

    let query: [f32; 3] = [1.0, 0.0, 0.0];
    let results: Vec<_> = store
        .nearest_matches("cats", &query, 10, 0.0)
        .try_collect()
        .await
        .unwrap();

    let blank = results
        .iter()
        .find(|r| r.record.key() == "blank")
        .expect("zero embedding should clear a 0.0 floor");
    assert_eq!(blank.relevance_score, 0.0);
    assert!(results.iter().all(|r| r.relevance_score.is_finite()));

    let above_zero: Vec<_> = store
        .nearest_matches("cats", &query, 10, 0.01)
        .try_collect()
        .await
        .unwrap();
    assert!(above_zero.iter().all(|r| r.record.key() != "blank"));
}

#[tokio::test]
async fn test_nearest_matches_on_empty_collection() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = open_store(&temp_dir).await;
    store.create_collection("cats").await.unwrap();

    let query: [f32; 3] = [1.0, 0.0, 0.0];
    let results: Vec<_> = store
        .nearest_matches("cats", &query, 3, 0.0)
        .try_collect()
        .await
        .unwrap();
    assert!(results.is_empty());
    assert!(store
        .nearest_match("cats", &query, 0.0)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_close_is_idempotent_and_disposes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = store_with_cats(&temp_dir).await;

    store.close().await;
    store.close().await;
    assert!(store.is_closed().await);

    let err = store.get("cats", "cat1").await.unwrap_err();
    assert!(matches!(err, MemoryError::Disposed));
    let err = store.collection_exists("cats").await.unwrap_err();
    assert!(matches!(err, MemoryError::Disposed));
    let err = store
        .list_collections()
        .try_collect::<Vec<_>>()
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::Disposed));
}

#[tokio::test]
async fn test_records_persist_across_reconnect() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    {
        let store = store_with_cats(&temp_dir).await;
        store.close().await;
    }

    let store = open_store(&temp_dir).await;
    assert!(store.collection_exists("cats").await.unwrap());
    let loaded = store.get("cats", "cat3").await.unwrap();
    assert_eq!(loaded.metadata.text, "norwegian forest cat");
}
