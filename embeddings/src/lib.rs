//! # Embeddings
//!
//! Text embedding, corpus vector caching and similarity ranking for the
//! course recommender.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors through an
//!   [`EmbeddingProvider`] (remote OpenAI-compatible API or the offline
//!   feature-hashing encoder)
//! - **Corpus Cache**: Build the vectors for a whole corpus once per corpus
//!   version, with a single build in flight per version
//! - **Similarity Ranking**: Cosine similarity and deterministic top-k
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► CorpusEmbeddingCache       │
//! │       │                    │              │                     │
//! │       ▼                    ▼              ▼                     │
//! │  OpenAI/Hashing         top_k        CorpusVectors              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod hashing;
pub mod provider;
pub mod similarity;

pub use cache::{CacheStats, CorpusEmbeddingCache, CorpusVectors};
pub use error::{EmbeddingError, Result};
pub use hashing::HashingProvider;
pub use provider::{EmbeddingProvider, OpenAIProvider};
pub use similarity::{cosine_similarity, top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Default dimension of the offline hashing encoder.
pub const DEFAULT_DIMENSION: usize = 384;
