//! # Memory Lance
//!
//! LanceDB implementation of [`memory_core::MemoryStore`].
//!
//! ## Modules
//!
//! - [`config`] - LanceConfig
//! - [`distance_type`] - distance metrics and distance-to-relevance conversion
//! - [`index_type`] - vector index kinds for `create_index`
//! - [`filter`] - injection-safe id predicates
//! - [`schema`] - collection layout and Arrow conversion
//! - [`store`] - LanceMemoryStore

pub mod config;
pub mod distance_type;
pub mod filter;
pub mod index_type;
pub mod schema;
pub mod store;

pub use config::LanceConfig;
pub use distance_type::DistanceType;
pub use index_type::LanceIndexType;
pub use store::LanceMemoryStore;
