//! memctl command handlers. Results are written to the supplied writer so they can be captured.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use embedding::EmbeddingService;
use futures::TryStreamExt;
use hf_embedding::HfEmbedding;
use memory_core::MemoryStore;
use memory_inmemory::VolatileMemoryStore;
use memory_lance::{LanceIndexType, LanceMemoryStore};
use semantic_memory::SemanticMemory;
use tracing::info;

use crate::config::{AppConfig, MemoryBackend};

/// Records saved by the demo: (id, text).
pub const DEMO_MEMORIES: [(&str, &str); 3] = [
    ("cat1", "british short hair"),
    ("cat2", "orange tabby"),
    ("cat3", "norwegian forest cat"),
];

pub const DEMO_QUERY: &str = "My favorite color is orange";
pub const DEMO_LIMIT: usize = 3;
pub const DEMO_MIN_RELEVANCE: f64 = 0.25;

/// The configured store. Lance keeps a connection that is released by [`Backend::close`].
pub enum Backend {
    Volatile(Arc<VolatileMemoryStore>),
    Lance(Arc<LanceMemoryStore>),
}

impl Backend {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        match config.memory_backend {
            MemoryBackend::Volatile => {
                info!("Using volatile memory store");
                Ok(Backend::Volatile(Arc::new(VolatileMemoryStore::new())))
            }
            MemoryBackend::Lance => {
                let store = LanceMemoryStore::with_config(config.lance())
                    .await
                    .with_context(|| {
                        format!(
                            "Connect to LanceDB at {} (check LANCE_URI and LANCE_EMBEDDING_DIM)",
                            config.lance_uri
                        )
                    })?;
                Ok(Backend::Lance(Arc::new(store)))
            }
        }
    }

    pub fn store(&self) -> Arc<dyn MemoryStore> {
        match self {
            Backend::Volatile(store) => store.clone() as Arc<dyn MemoryStore>,
            Backend::Lance(store) => store.clone(),
        }
    }

    pub async fn close(&self) {
        if let Backend::Lance(store) = self {
            store.close().await;
        }
    }
}

/// HF inference endpoint client from the embedding section of the config.
pub fn embedder(config: &AppConfig) -> Result<Arc<dyn EmbeddingService>> {
    let service = HfEmbedding::from_config(&config.embedding())
        .context("Load embedding config (EMBEDDING_ENDPOINT, EMBEDDING_API_KEY)")?;
    Ok(Arc::new(service))
}

/// Saves the three cats, lists the collections and searches for the orange one.
pub async fn demo(memory: &SemanticMemory, collection: &str, out: &mut impl Write) -> Result<()> {
    writeln!(out, "== Adding Memories ==")?;
    for (id, text) in DEMO_MEMORIES {
        memory
            .save_information(collection, id, text, "", "")
            .await
            .with_context(|| format!("Save memory {}", id))?;
    }

    writeln!(out, "== Printing Collections in DB ==")?;
    collections(memory.store().as_ref(), out).await?;

    writeln!(out, "== Similarity Searching Memories: {} ==", DEMO_QUERY)?;
    search(
        memory,
        collection,
        DEMO_QUERY,
        DEMO_LIMIT,
        DEMO_MIN_RELEVANCE,
        out,
    )
    .await
}

/// Lists collection names straight from the store; no embedding is needed.
pub async fn collections(store: &dyn MemoryStore, out: &mut impl Write) -> Result<()> {
    let names: Vec<String> = store
        .list_collections()
        .try_collect()
        .await
        .context("List collections")?;
    for name in names {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

/// Prints `text : relevance` for each match, best first.
pub async fn search(
    memory: &SemanticMemory,
    collection: &str,
    query: &str,
    limit: usize,
    min_relevance_score: f64,
    out: &mut impl Write,
) -> Result<()> {
    let results = memory
        .search(collection, query, limit, min_relevance_score)
        .await
        .with_context(|| format!("Search collection {}", collection))?;
    for result in results {
        writeln!(
            out,
            "{} : {}",
            result.record.metadata.text, result.relevance_score
        )?;
    }
    Ok(())
}

/// Builds a vector index on a Lance collection.
pub async fn index(backend: &Backend, collection: &str, index_type: LanceIndexType) -> Result<()> {
    let Backend::Lance(store) = backend else {
        bail!("index requires MEMORY_BACKEND=lance");
    };
    store
        .create_index(collection, index_type)
        .await
        .with_context(|| format!("Create index on {}", collection))?;
    let rows = store.count(collection).await?;
    info!(collection, rows, "Index created");
    Ok(())
}
