//! Vector index types supported by LanceMemoryStore.
//!
//! Used when calling `LanceMemoryStore::create_index`. External: lancedb index API.

use lancedb::index::vector::{IvfHnswSqIndexBuilder, IvfPqIndexBuilder};
use lancedb::index::Index;

use crate::DistanceType;

/// Vector index types supported by LanceMemoryStore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanceIndexType {
    /// Let Lance choose the index type
    #[default]
    Auto,
    /// IVF-PQ (Inverted File with Product Quantization)
    /// Good balance of speed and accuracy for large datasets
    IvfPq,
    /// IVF-HNSW with scalar quantization
    /// Fastest query performance, higher memory usage
    Hnsw,
}

impl LanceIndexType {
    pub(crate) fn to_index(self, distance_type: DistanceType) -> Index {
        let metric = distance_type.as_lance_metric();
        match self {
            LanceIndexType::Auto => Index::Auto,
            LanceIndexType::IvfPq => {
                Index::IvfPq(IvfPqIndexBuilder::default().distance_type(metric))
            }
            LanceIndexType::Hnsw => {
                Index::IvfHnswSq(IvfHnswSqIndexBuilder::default().distance_type(metric))
            }
        }
    }
}
