//! End-to-end tests for the memctl commands.
//!
//! The HF embedding endpoint is a local mockito server answering with fixed vectors per input,
//! so the demo ranking is deterministic. Runs against both the volatile and the Lance backend.

use memory_cli::commands;
use memory_core::MemoryStore;
use memory_cli::{AppConfig, Backend, MemoryBackend};
use mockito::{Matcher, Mock, ServerGuard};
use semantic_memory::SemanticMemory;
use serde_json::json;

const EMBEDDINGS: [(&str, [f32; 4]); 4] = [
    ("british short hair", [0.0, 3.0, 0.0, 0.1]),
    ("orange tabby", [2.0, 0.0, 0.0, 0.1]),
    ("norwegian forest cat", [0.0, 0.0, 2.0, 0.1]),
    ("My favorite color is orange", [1.0, 0.0, 0.0, 0.1]),
];

async fn embedding_server() -> (ServerGuard, Vec<Mock>) {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for (text, vector) in EMBEDDINGS {
        let mock = server
            .mock("POST", "/embed")
            .match_body(Matcher::Json(json!({ "inputs": [text] })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "embeddings": [vector] }).to_string())
            .create_async()
            .await;
        mocks.push(mock);
    }
    (server, mocks)
}

fn config_for(server: &ServerGuard) -> AppConfig {
    AppConfig {
        embedding_endpoint: format!("{}/embed", server.url()),
        embedding_api_key: "test-key".to_string(),
        lance_embedding_dim: 4,
        ..AppConfig::default()
    }
}

async fn run_demo(config: &AppConfig, backend: &Backend) -> String {
    let memory = SemanticMemory::new(backend.store(), commands::embedder(config).unwrap());
    let mut out = Vec::new();
    commands::demo(&memory, "cats", &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

fn assert_demo_output(output: &str) {
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "== Adding Memories ==");
    assert_eq!(lines[1], "== Printing Collections in DB ==");
    assert_eq!(lines[2], "cats");
    assert_eq!(
        lines[3],
        "== Similarity Searching Memories: My favorite color is orange =="
    );
    // Only the orange tabby clears the 0.25 floor
    assert_eq!(lines.len(), 5);
    let (text, score) = lines[4].split_once(" : ").unwrap();
    assert_eq!(text, "orange tabby");
    assert!(score.parse::<f64>().unwrap() > 0.99);
}

#[tokio::test]
async fn test_demo_with_volatile_backend() {
    let (server, mocks) = embedding_server().await;
    let config = config_for(&server);
    let backend = Backend::open(&config).await.unwrap();

    let output = run_demo(&config, &backend).await;

    assert_demo_output(&output);
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_demo_with_lance_backend_persists() {
    let (server, _mocks) = embedding_server().await;
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = AppConfig {
        memory_backend: MemoryBackend::Lance,
        lance_uri: temp_dir.path().join("lance_db").to_string_lossy().to_string(),
        ..config_for(&server)
    };

    let backend = Backend::open(&config).await.unwrap();
    let output = run_demo(&config, &backend).await;
    assert_demo_output(&output);
    backend.close().await;

    let reopened = Backend::open(&config).await.unwrap();
    let memory = SemanticMemory::new(reopened.store(), commands::embedder(&config).unwrap());
    let mut out = Vec::new();
    commands::search(&memory, "cats", "orange tabby", 3, 0.9, &mut out)
        .await
        .unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("orange tabby : "));
    reopened.close().await;
}

#[tokio::test]
async fn test_search_missing_collection_fails() {
    let (server, _mocks) = embedding_server().await;
    let config = config_for(&server);
    let backend = Backend::open(&config).await.unwrap();
    let memory = SemanticMemory::new(backend.store(), commands::embedder(&config).unwrap());

    let mut out = Vec::new();
    let err = commands::search(&memory, "dogs", "orange tabby", 3, 0.0, &mut out)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("dogs"));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_index_requires_lance_backend() {
    let backend = Backend::open(&AppConfig::default()).await.unwrap();
    let err = commands::index(&backend, "cats", memory_lance::LanceIndexType::Auto)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("lance"));
}

#[tokio::test]
async fn test_collections_without_embedding_endpoint() {
    let config = AppConfig::default();
    let backend = Backend::open(&config).await.unwrap();
    backend.store().create_collection("cats").await.unwrap();

    let mut out = Vec::new();
    commands::collections(backend.store().as_ref(), &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "cats\n");
    assert!(commands::embedder(&config).is_err());
}

#[test]
fn test_embedder_requires_endpoint() {
    assert!(commands::embedder(&AppConfig::default()).is_err());
}
