//! Configuration for LanceMemoryStore.
//!
//! Defines LanceConfig and its default values. Used when creating a store
//! via `LanceMemoryStore::with_config`.

use crate::DistanceType;

/// Configuration for LanceMemoryStore.
///
/// # Fields
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `uri` | `String` | Local database directory or remote LanceDB URI (`db://...`) |
/// | `embedding_dim` | `usize` | Width of the vector column declared when a collection is created |
/// | `distance_type` | `DistanceType` | Distance metric used by the native vector search |
/// | `use_exact_search` | `bool` | If true, skip the vector index (exhaustive flat search) |
/// | `refine_factor` | `Option<u32>` | For IVF-PQ index: fetch limit×refine_factor candidates then reorder by true distance |
/// | `nprobes` | `Option<usize>` | Number of IVF partitions to search; higher = better recall, slower |
/// | `api_key` | `Option<String>` | API key for a remote `db://` database |
/// | `region` | `Option<String>` | Region of a remote `db://` database |
#[derive(Debug, Clone, PartialEq)]
pub struct LanceConfig {
    /// Database URI; a filesystem path for a local database
    pub uri: String,
    /// Dimension of embedding vectors in newly created collections
    pub embedding_dim: usize,
    /// Distance metric for vector search
    pub distance_type: DistanceType,
    /// If true, skip vector index (exhaustive flat search). Use for maximum accuracy on small/medium tables.
    pub use_exact_search: bool,
    /// For IVF-PQ index: multiplier for refine step. None = use Lance default.
    pub refine_factor: Option<u32>,
    /// Number of IVF partitions to search. None = use Lance default.
    pub nprobes: Option<usize>,
    /// API key for a remote database; unused for local paths
    pub api_key: Option<String>,
    /// Region for a remote database. None = use Lance default.
    pub region: Option<String>,
}

impl Default for LanceConfig {
    fn default() -> Self {
        Self {
            uri: "./data/lancedb".to_string(),
            embedding_dim: 768, // sentence-transformers/all-mpnet-base-v2
            distance_type: DistanceType::Cosine,
            use_exact_search: false,
            refine_factor: None,
            nprobes: None,
            api_key: None,
            region: None,
        }
    }
}

impl LanceConfig {
    pub fn new(uri: impl Into<String>, embedding_dim: usize) -> Self {
        Self {
            uri: uri.into(),
            embedding_dim,
            ..Default::default()
        }
    }

    /// True for a `db://` URI, which is reached over HTTP rather than opened locally.
    pub fn is_remote(&self) -> bool {
        self.uri.starts_with("db://")
    }
}
