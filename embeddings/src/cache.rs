//! Corpus embedding cache.
//!
//! Holds one vector sequence per `(corpus version, model)` pair. The first
//! caller for a key builds the vectors through the provider; everyone else,
//! including callers that arrive while the build is running, gets the same
//! shared [`CorpusVectors`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingProvider;

/// Vectors for every entry of one corpus version, in corpus order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusVectors {
    /// Corpus version the vectors were built from.
    pub version: String,

    /// Model that produced the vectors.
    pub model: String,

    /// Length of every vector.
    pub dimension: usize,

    /// One vector per corpus entry.
    pub vectors: Vec<Embedding>,
}

impl CorpusVectors {
    /// Number of corpus entries covered.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the corpus was empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

type CacheKey = (String, String);

/// Cache of corpus vectors keyed by corpus version and model.
///
/// There is no eviction: a process normally serves a single corpus. A new
/// corpus version is simply a new key and never sees vectors of an older one.
#[derive(Default)]
pub struct CorpusEmbeddingCache {
    /// One cell per key; the cell serializes the build for that key.
    entries: Mutex<HashMap<CacheKey, Arc<OnceCell<Arc<CorpusVectors>>>>>,

    /// Directory for JSON snapshots, if persistence is enabled.
    snapshot_dir: Option<PathBuf>,

    hits: AtomicU64,
    builds: AtomicU64,
    snapshot_loads: AtomicU64,
}

impl CorpusEmbeddingCache {
    /// Create a new in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that also snapshots built vectors under `dir`.
    pub fn with_persistence(dir: impl AsRef<Path>) -> Self {
        Self {
            snapshot_dir: Some(dir.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Return the vectors for `version`, building them on first use.
    ///
    /// `texts` must hold one entry per corpus item, blanks included, so the
    /// result stays index-aligned with the corpus.
    pub async fn get_or_build(
        &self,
        version: &str,
        texts: &[String],
        provider: &dyn EmbeddingProvider,
    ) -> Result<Arc<CorpusVectors>> {
        let key = (version.to_string(), provider.model().to_string());
        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(key).or_default())
        };

        if let Some(vectors) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Corpus cache hit for version {version}");
            return Ok(Arc::clone(vectors));
        }

        let vectors = cell
            .get_or_try_init(|| self.build(version, texts, provider))
            .await?;
        Ok(Arc::clone(vectors))
    }

    /// Produce the vectors for a cache miss, from a snapshot or the provider.
    async fn build(
        &self,
        version: &str,
        texts: &[String],
        provider: &dyn EmbeddingProvider,
    ) -> Result<Arc<CorpusVectors>> {
        if let Some(vectors) = self.load_snapshot(version, texts.len(), provider).await {
            self.snapshot_loads.fetch_add(1, Ordering::Relaxed);
            info!(
                "Loaded {} corpus vectors for version {version} from snapshot",
                vectors.len()
            );
            return Ok(Arc::new(vectors));
        }

        info!(
            "Building corpus vectors for {} texts with {}",
            texts.len(),
            provider.model()
        );
        let embeddings = provider.embed_many(texts).await?;
        self.builds.fetch_add(1, Ordering::Relaxed);

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::BatchLength {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        let dimension = embeddings
            .first()
            .map_or_else(|| provider.dimension(), Vec::len);
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let vectors = CorpusVectors {
            version: version.to_string(),
            model: provider.model().to_string(),
            dimension,
            vectors: embeddings,
        };

        if let Err(e) = self.save_snapshot(&vectors).await {
            warn!("Failed to save corpus snapshot for version {version}: {e}");
        }

        Ok(Arc::new(vectors))
    }

    /// Check if vectors for `version` and `model` are built.
    pub async fn contains(&self, version: &str, model: &str) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(&(version.to_string(), model.to_string()))
            .is_some_and(|cell| cell.initialized())
    }

    /// Drop every entry built for `version`, whatever the model.
    pub async fn invalidate(&self, version: &str) {
        let mut entries = self.entries.lock().await;
        entries.retain(|(entry_version, _), _| entry_version != version);
        debug!("Invalidated corpus vectors for version {version}");
    }

    /// Clear the entire cache.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
        info!("Cleared corpus embedding cache");
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        CacheStats {
            entries: entries.values().filter(|cell| cell.initialized()).count(),
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            snapshot_loads: self.snapshot_loads.load(Ordering::Relaxed),
        }
    }

    fn snapshot_path(&self, version: &str, model: &str) -> Option<PathBuf> {
        let model: String = model
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        self.snapshot_dir
            .as_ref()
            .map(|dir| dir.join(format!("{model}-{version}.json")))
    }

    /// Load a snapshot matching this version, model and corpus size.
    async fn load_snapshot(
        &self,
        version: &str,
        expected_len: usize,
        provider: &dyn EmbeddingProvider,
    ) -> Option<CorpusVectors> {
        let path = self.snapshot_path(version, provider.model())?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return None;
        }

        match read_snapshot(&path).await {
            Ok(vectors)
                if vectors.version == version
                    && vectors.model == provider.model()
                    && vectors.dimension == provider.dimension()
                    && vectors.len() == expected_len
                    && vectors.vectors.iter().all(|v| v.len() == vectors.dimension) =>
            {
                Some(vectors)
            }
            Ok(_) => {
                warn!("Ignoring stale corpus snapshot {}", path.display());
                None
            }
            Err(e) => {
                warn!("Ignoring unreadable corpus snapshot {}: {e}", path.display());
                None
            }
        }
    }

    async fn save_snapshot(&self, vectors: &CorpusVectors) -> Result<()> {
        let Some(path) = self.snapshot_path(&vectors.version, &vectors.model) else {
            return Ok(());
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string(vectors)?;
        fs::write(&path, content).await?;
        debug!("Saved {} corpus vectors to {}", vectors.len(), path.display());
        Ok(())
    }
}

async fn read_snapshot(path: &Path) -> Result<CorpusVectors> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content)
        .map_err(|e| EmbeddingError::Snapshot(format!("{}: {e}", path.display())))
}

/// Statistics about the corpus embedding cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of built entries.
    pub entries: usize,

    /// Requests answered from memory.
    pub hits: u64,

    /// Builds that called the provider.
    pub builds: u64,

    /// Builds answered from a snapshot on disk.
    pub snapshot_loads: u64,
}
