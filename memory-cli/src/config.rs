//! Application config: embedding endpoint and memory backend. Loaded from a JSON file or env.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use embedding::EmbeddingConfig;
use memory_lance::LanceConfig;
use serde::Deserialize;

/// Which [`memory_core::MemoryStore`] implementation backs the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    /// In-process, lost on exit
    #[default]
    Volatile,
    /// LanceDB at `lance_uri`
    Lance,
}

impl FromStr for MemoryBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "volatile" | "memory" => Ok(MemoryBackend::Volatile),
            "lance" | "lancedb" => Ok(MemoryBackend::Lance),
            other => bail!("MEMORY_BACKEND must be volatile or lance, got {}", other),
        }
    }
}

fn default_lance_uri() -> String {
    "./data/lancedb".to_string()
}

fn default_lance_embedding_dim() -> usize {
    768
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// EMBEDDING_ENDPOINT
    #[serde(default)]
    pub embedding_endpoint: String,
    /// EMBEDDING_API_KEY
    #[serde(default)]
    pub embedding_api_key: String,
    /// MEMORY_BACKEND
    #[serde(default)]
    pub memory_backend: MemoryBackend,
    /// LANCE_URI
    #[serde(default = "default_lance_uri")]
    pub lance_uri: String,
    /// LANCE_EMBEDDING_DIM; must match the embedding model's output width
    #[serde(default = "default_lance_embedding_dim")]
    pub lance_embedding_dim: usize,
    /// LANCE_API_KEY; required for a remote `db://` LANCE_URI
    #[serde(default)]
    pub lance_api_key: Option<String>,
    /// LANCE_REGION
    #[serde(default)]
    pub lance_region: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embedding_endpoint: String::new(),
            embedding_api_key: String::new(),
            memory_backend: MemoryBackend::default(),
            lance_uri: default_lance_uri(),
            lance_embedding_dim: default_lance_embedding_dim(),
            lance_api_key: None,
            lance_region: None,
        }
    }
}

impl AppConfig {
    /// Loads from `path` when given, otherwise from environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            bail!("config file is empty");
        }
        serde_json::from_str(json).context("unable to parse application configuration")
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the config from a variable lookup. Unset variables keep their defaults.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let memory_backend = match get("MEMORY_BACKEND") {
            Some(s) => s.parse()?,
            None => defaults.memory_backend,
        };
        let lance_embedding_dim = match get("LANCE_EMBEDDING_DIM") {
            Some(s) => s
                .trim()
                .parse()
                .with_context(|| format!("LANCE_EMBEDDING_DIM is not a number: {}", s))?,
            None => defaults.lance_embedding_dim,
        };

        Ok(Self {
            embedding_endpoint: get("EMBEDDING_ENDPOINT")
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            embedding_api_key: get("EMBEDDING_API_KEY").unwrap_or_default(),
            memory_backend,
            lance_uri: get("LANCE_URI").unwrap_or(defaults.lance_uri),
            lance_embedding_dim,
            lance_api_key: get("LANCE_API_KEY").filter(|s| !s.trim().is_empty()),
            lance_region: get("LANCE_REGION").filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory_backend == MemoryBackend::Lance {
            if self.lance_uri.trim().is_empty() {
                bail!("LANCE_URI must not be empty when MEMORY_BACKEND=lance");
            }
            if self.lance_embedding_dim == 0 {
                bail!("LANCE_EMBEDDING_DIM must be greater than 0");
            }
            if self.lance().is_remote() && self.lance_api_key.is_none() {
                bail!("LANCE_API_KEY is required for a remote LANCE_URI");
            }
        }
        Ok(())
    }

    pub fn embedding(&self) -> EmbeddingConfig {
        EmbeddingConfig::new(self.embedding_endpoint.clone(), self.embedding_api_key.clone())
    }

    pub fn lance(&self) -> LanceConfig {
        LanceConfig {
            api_key: self.lance_api_key.clone(),
            region: self.lance_region.clone(),
            ..LanceConfig::new(self.lance_uri.clone(), self.lance_embedding_dim)
        }
    }
}
