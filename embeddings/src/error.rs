//! Errors raised while encoding text, caching corpus vectors or ranking.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider is missing credentials or a model.
    #[error("embedding provider `{0}` is not configured")]
    ProviderNotConfigured(String),

    /// The embeddings endpoint answered with a non-success status.
    #[error("embedding request failed: {0}")]
    ApiRequest(String),

    #[error("unusable embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding API rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Two vectors, or a vector and the model, disagree on length.
    #[error("vector length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A batch call returned a different number of vectors than texts.
    #[error("provider returned {actual} vectors for {expected} texts")]
    BatchLength { expected: usize, actual: usize },

    /// A persisted corpus snapshot could not be used.
    #[error("corpus snapshot unusable: {0}")]
    Snapshot(String),

    #[error("snapshot encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("embedding transport failed: {0}")]
    Http(#[from] reqwest::Error),
}
