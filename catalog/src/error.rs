//! Error types for catalog loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while loading catalog tables.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be read.
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the candidate encodings decoded the file cleanly.
    #[error("could not decode {} with any of: {}", .path.display(), .tried)]
    Decode { path: PathBuf, tried: String },

    /// Encoding label not recognized.
    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// Malformed CSV.
    #[error("malformed CSV in {}: {}", .path.display(), .source)]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The course table has no rows.
    #[error("course table {} has no rows", .0.display())]
    Empty(PathBuf),
}
