//! # Course Recommender
//!
//! Recommends training courses for a free-text job description by ranking
//! the course catalog on embedding similarity.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Recommendation Service                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   query text ──► EmbeddingProvider ──► query vector              │
//! │                                            │                     │
//! │   Corpus ──► CorpusEmbeddingCache ──► corpus vectors             │
//! │                                            │                     │
//! │                                            ▼                     │
//! │                                         top_k                    │
//! │                                            │                     │
//! │                                            ▼                     │
//! │                                  Vec<Recommendation>             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coursefit_recommender::{RecommendationService, RecommenderConfig};
//!
//! let config = RecommenderConfig::load("coursefit.toml")?;
//! let service = RecommendationService::builder()
//!     .with_config(config)
//!     .build()
//!     .await?;
//!
//! let results = service.recommend("I build React and Node.js web apps", 5).await?;
//! ```

pub mod config;
pub mod error;
pub mod service;

pub use config::{EmbeddingConfig, EmbeddingProviderType, QueryConfig, RecommenderConfig};
pub use error::{RecommendError, Result};
pub use service::{Recommendation, RecommendationService, RecommenderBuilder, create_provider};

// Re-export from dependencies for convenience
pub use coursefit_catalog::{Catalog, CatalogStats, Corpus, Course};
pub use coursefit_embeddings::{CorpusEmbeddingCache, EmbeddingProvider};
