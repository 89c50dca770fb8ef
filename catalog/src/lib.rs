//! # Catalog
//!
//! The course catalog the recommender ranks against, and the loaders that
//! read it from CSV exports.
//!
//! - [`Course`] / [`Corpus`]: ordered, immutable course records with a
//!   content fingerprint ([`CorpusVersion`]) used as the embedding cache key
//! - [`loader`]: CSV ingestion that tries a list of text encodings in order
//!   (`utf-8-sig`, `utf-8`, `cp949`, `euc-kr` by default)

pub mod course;
pub mod error;
pub mod loader;

pub use course::{Catalog, CatalogStats, Corpus, CorpusVersion, Course, JobTable};
pub use error::{CatalogError, Result};
pub use loader::{DEFAULT_ENCODINGS, decode_with_fallback, load_course_table, load_job_table};
