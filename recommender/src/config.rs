//! Configuration for the course recommender.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use coursefit_catalog::DEFAULT_ENCODINGS;

use crate::error::{RecommendError, Result};

/// Configuration for the course recommender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Source tables.
    pub data: DataConfig,

    /// Embedding provider configuration.
    pub embedding: EmbeddingConfig,

    /// Query processing configuration.
    pub query: QueryConfig,
}

impl RecommenderConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| RecommendError::Config(format!("{}: {e}", path.display())))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RecommendError::Config(e.to_string()))
    }

    /// Set the job table path.
    pub fn with_job_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.data.job_table = path.into();
        self
    }

    /// Set the course table path.
    pub fn with_course_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.data.course_table = path.into();
        self
    }

    /// Set the embedding configuration.
    pub fn with_embedding(mut self, config: EmbeddingConfig) -> Self {
        self.embedding = config;
        self
    }

    /// Set the query configuration.
    pub fn with_query(mut self, config: QueryConfig) -> Self {
        self.query = config;
        self
    }
}

/// Location and decoding of the source tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Job table CSV.
    pub job_table: PathBuf,

    /// Course table CSV.
    pub course_table: PathBuf,

    /// Encodings to try, in order.
    pub encodings: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            job_table: PathBuf::from("직무정보DB.csv"),
            course_table: PathBuf::from("교육정보DB.csv"),
            encodings: DEFAULT_ENCODINGS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which provider to use.
    pub provider: EmbeddingProviderType,

    /// Model to use (provider default when unset).
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    pub base_url: Option<String>,

    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,

    /// Vector length (provider default when unset).
    pub dimension: Option<usize>,

    /// Maximum texts per provider request.
    pub batch_size: usize,

    /// Directory for corpus vector snapshots. In-memory only when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderType::Hashing,
            model: None,
            base_url: None,
            api_key: None,
            dimension: None,
            batch_size: 64,
            cache_dir: None,
        }
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// OpenAI-compatible embeddings API.
    #[serde(rename = "openai")]
    OpenAI,
    /// Offline feature-hashing encoder.
    #[default]
    Hashing,
}

impl std::str::FromStr for EmbeddingProviderType {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "hashing" | "hash" => Ok(Self::Hashing),
            other => Err(RecommendError::Config(format!(
                "unknown embedding provider: {other}"
            ))),
        }
    }
}

/// Configuration for query processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Number of recommendations when the caller does not ask for a count.
    pub top_k: usize,

    /// Decimal places kept in similarity scores.
    pub score_precision: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            score_precision: 4,
        }
    }
}
