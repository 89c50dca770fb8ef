//! Error types for the course recommender.

use thiserror::Error;

use coursefit_catalog::CatalogError;
use coursefit_embeddings::EmbeddingError;

/// Result type alias for recommender operations.
pub type Result<T> = std::result::Result<T, RecommendError>;

/// Errors that can occur while building or querying the recommender.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// Caller input rejected (empty query). Retry with new input.
    #[error("invalid query: {0}")]
    Validation(String),

    /// The course data could not be loaded or is empty.
    #[error("no recommendations possible: {0}")]
    DataUnavailable(String),

    /// The embedding provider could not be initialized.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// Query and corpus vectors disagree in length, so the corpus vectors
    /// were built by a different model.
    #[error("dimension mismatch: corpus vectors have {expected} entries, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(EmbeddingError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecommendError {
    /// Whether the caller can retry with different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<EmbeddingError> for RecommendError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            other => Self::Embedding(other),
        }
    }
}

impl From<CatalogError> for RecommendError {
    fn from(err: CatalogError) -> Self {
        Self::DataUnavailable(err.to_string())
    }
}
