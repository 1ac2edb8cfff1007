//! CLI parser.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use memory_lance::LanceIndexType;

#[derive(Parser)]
#[command(name = "memctl")]
#[command(about = "Semantic memory CLI: demo, collections, search, index", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON config file; when omitted config is read from env (.env is loaded first)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save three cat descriptions, list collections and search for "My favorite color is orange".
    Demo {
        #[arg(long, default_value = "cats")]
        collection: String,
    },
    /// List collection names.
    Collections,
    /// Search a collection by text.
    Search {
        collection: String,
        query: String,
        #[arg(short, long, default_value = "3")]
        limit: usize,
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        min_relevance: f64,
    },
    /// Build a vector index on a collection (lance backend only).
    Index {
        collection: String,
        #[arg(long, value_enum, default_value = "auto")]
        index_type: IndexKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexKind {
    Auto,
    IvfPq,
    Hnsw,
}

impl From<IndexKind> for LanceIndexType {
    fn from(kind: IndexKind) -> Self {
        match kind {
            IndexKind::Auto => LanceIndexType::Auto,
            IndexKind::IvfPq => LanceIndexType::IvfPq,
            IndexKind::Hnsw => LanceIndexType::Hnsw,
        }
    }
}
