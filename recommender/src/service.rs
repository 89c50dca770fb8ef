//! Recommendation service and its builder.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use coursefit_catalog::{Catalog, CatalogStats, Corpus, Course};
use coursefit_embeddings::{
    CacheStats, CorpusEmbeddingCache, CorpusVectors, EmbeddingProvider, HashingProvider,
    OpenAIProvider, top_k,
};

use crate::config::{EmbeddingConfig, EmbeddingProviderType, QueryConfig, RecommenderConfig};
use crate::error::{RecommendError, Result};

/// A course paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Corpus index of the course.
    pub index: usize,

    /// Course category.
    pub category: String,

    /// Course name.
    pub name: String,

    /// Course duration.
    pub duration: String,

    /// Cosine similarity, rounded for presentation.
    pub similarity: f64,
}

impl Recommendation {
    fn new(course: &Course, similarity: f64) -> Self {
        Self {
            index: course.index,
            category: course.category.clone(),
            name: course.name.clone(),
            duration: course.duration.clone(),
            similarity,
        }
    }
}

/// Ranks the course corpus against free-text job descriptions.
///
/// The provider, cache and corpus are injected; the service only reads them.
/// It is `Send + Sync` and can be shared across tasks behind an `Arc`.
pub struct RecommendationService {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<CorpusEmbeddingCache>,
    corpus: Arc<Corpus>,
    query: QueryConfig,
    job_count: usize,
}

impl RecommendationService {
    /// Create a new recommendation service builder.
    pub fn builder() -> RecommenderBuilder {
        RecommenderBuilder::new()
    }

    /// Create a service over already-constructed parts.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: Arc<CorpusEmbeddingCache>,
        corpus: Arc<Corpus>,
    ) -> Self {
        Self {
            provider,
            cache,
            corpus,
            query: QueryConfig::default(),
            job_count: 0,
        }
    }

    /// Set the query configuration.
    pub fn with_query_config(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    /// Record the size of the job table for [`stats`](Self::stats).
    pub fn with_job_count(mut self, job_count: usize) -> Self {
        self.job_count = job_count;
        self
    }

    /// Build the corpus vectors ahead of the first request.
    pub async fn warm_up(&self) -> Result<()> {
        let vectors = self.corpus_vectors().await?;
        info!(
            "Corpus vectors ready: {} courses, {} dimensions",
            vectors.len(),
            vectors.dimension
        );
        Ok(())
    }

    /// Recommend up to `k` courses for `query_text`, best match first.
    ///
    /// Equal scores keep catalog order. `k == 0` yields no recommendations.
    pub async fn recommend(&self, query_text: &str, k: usize) -> Result<Vec<Recommendation>> {
        if query_text.trim().is_empty() {
            return Err(RecommendError::Validation(
                "describe the job role to get recommendations".to_string(),
            ));
        }
        if self.corpus.is_empty() {
            return Err(RecommendError::DataUnavailable(
                "the course catalog is empty".to_string(),
            ));
        }

        debug!("Processing query ({} chars, k = {k})", query_text.chars().count());

        let query = self.provider.embed(query_text).await?;
        let corpus_vectors = self.corpus_vectors().await?;
        if query.len() != corpus_vectors.dimension {
            return Err(RecommendError::DimensionMismatch {
                expected: corpus_vectors.dimension,
                actual: query.len(),
            });
        }

        let ranked = top_k(&query, &corpus_vectors.vectors, k)?;
        ranked
            .into_iter()
            .map(|(index, score)| {
                let course = self.corpus.get(index).ok_or_else(|| {
                    RecommendError::DataUnavailable(format!("no course at index {index}"))
                })?;
                Ok(Recommendation::new(
                    course,
                    round_score(score, self.query.score_precision),
                ))
            })
            .collect()
    }

    /// Recommend using the configured default count.
    pub async fn recommend_default(&self, query_text: &str) -> Result<Vec<Recommendation>> {
        self.recommend(query_text, self.query.top_k).await
    }

    /// Get catalog statistics.
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            jobs: self.job_count,
            courses: self.corpus.len(),
        }
    }

    /// The corpus being ranked.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Statistics of the corpus vector cache.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    async fn corpus_vectors(&self) -> Result<Arc<CorpusVectors>> {
        Ok(self
            .cache
            .get_or_build(
                self.corpus.version().as_str(),
                self.corpus.texts(),
                self.provider.as_ref(),
            )
            .await?)
    }
}

fn round_score(score: f32, places: u32) -> f64 {
    let factor = 10f64.powi(places.min(15) as i32);
    (f64::from(score) * factor).round() / factor
}

/// Construct the embedding provider described by `config`.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderType::Hashing => Arc::new(HashingProvider::new(
            config.dimension.unwrap_or(coursefit_embeddings::DEFAULT_DIMENSION),
        )),
        EmbeddingProviderType::OpenAI => {
            let mut provider = OpenAIProvider::new().with_batch_size(config.batch_size);
            if let Some(model) = &config.model {
                provider = provider.with_model(model);
            }
            if let Some(dimension) = config.dimension {
                provider = provider.with_dimension(dimension);
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url);
            }
            if let Some(api_key) = &config.api_key {
                provider = provider.with_api_key(api_key);
            }
            Arc::new(provider)
        }
    };

    if !provider.is_available() {
        return Err(RecommendError::ModelUnavailable(format!(
            "{} provider is not configured (set an API key)",
            provider.name()
        )));
    }

    info!(
        "Using {} embeddings ({}, {} dimensions)",
        provider.name(),
        provider.model(),
        provider.dimension()
    );
    Ok(provider)
}

/// Builder for [`RecommendationService`].
///
/// Initialization order: provider and catalog, then the cache, then the
/// service, whose corpus vectors are built before `build` returns.
pub struct RecommenderBuilder {
    config: RecommenderConfig,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    catalog: Option<Catalog>,
}

impl RecommenderBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: RecommenderConfig::default(),
            provider: None,
            catalog: None,
        }
    }

    /// Use the given configuration.
    pub fn with_config(mut self, config: RecommenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an already-constructed provider instead of the configured one.
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use an in-memory catalog instead of loading the configured tables.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Build the service.
    pub async fn build(self) -> Result<RecommendationService> {
        let provider = match self.provider {
            Some(provider) => provider,
            None => create_provider(&self.config.embedding)?,
        };

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => {
                let data = self.config.data.clone();
                tokio::task::spawn_blocking(move || {
                    Catalog::load(&data.job_table, &data.course_table, &data.encodings)
                })
                .await
                .map_err(|e| RecommendError::DataUnavailable(format!("catalog loader failed: {e}")))??
            }
        };

        let cache = match &self.config.embedding.cache_dir {
            Some(dir) => CorpusEmbeddingCache::with_persistence(dir),
            None => CorpusEmbeddingCache::new(),
        };

        let service = RecommendationService::new(
            provider,
            Arc::new(cache),
            Arc::new(catalog.corpus),
        )
        .with_query_config(self.config.query)
        .with_job_count(catalog.jobs.rows);

        if service.corpus.is_empty() {
            return Err(RecommendError::DataUnavailable(
                "the course catalog is empty".to_string(),
            ));
        }
        service.warm_up().await?;

        Ok(service)
    }
}

impl Default for RecommenderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use coursefit_catalog::JobTable;
    use coursefit_embeddings::{Embedding, EmbeddingError};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Bag-of-keywords encoder over a fixed vocabulary, with call counters.
    struct KeywordProvider {
        vocabulary: Vec<&'static str>,
        embed_calls: AtomicUsize,
        batch_calls: AtomicUsize,
    }

    impl KeywordProvider {
        fn new() -> Self {
            Self {
                vocabulary: vec!["python", "ux", "design", "developer", "backend"],
                embed_calls: AtomicUsize::new(0),
                batch_calls: AtomicUsize::new(0),
            }
        }

        fn encode(&self, text: &str) -> Embedding {
            let text = text.to_lowercase();
            self.vocabulary
                .iter()
                .map(|word| if text.contains(word) { 1.0 } else { 0.0 })
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordProvider {
        fn name(&self) -> &str {
            "keyword"
        }

        fn model(&self) -> &str {
            "keyword-v1"
        }

        fn dimension(&self) -> usize {
            self.vocabulary.len()
        }

        async fn embed(&self, text: &str) -> coursefit_embeddings::Result<Embedding> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.encode(text))
        }

        async fn embed_many(&self, texts: &[String]) -> coursefit_embeddings::Result<Vec<Embedding>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| self.encode(t)).collect())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    /// Encoder whose query vectors are shorter than its corpus vectors.
    struct DriftingProvider;

    #[async_trait]
    impl EmbeddingProvider for DriftingProvider {
        fn name(&self) -> &str {
            "drifting"
        }

        fn model(&self) -> &str {
            "drifting-v1"
        }

        fn dimension(&self) -> usize {
            3
        }

        async fn embed(&self, _text: &str) -> coursefit_embeddings::Result<Embedding> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_many(&self, texts: &[String]) -> coursefit_embeddings::Result<Vec<Embedding>> {
            Ok(vec![vec![1.0, 0.0, 0.0]; texts.len()])
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn sample_corpus() -> Corpus {
        Corpus::new([
            Course::new("IT", "Intro to Python", "10h"),
            Course::new("Design", "UX Basics", "8h"),
            Course::new("IT", "Advanced Python", "20h"),
        ])
    }

    fn service_with(provider: Arc<dyn EmbeddingProvider>, corpus: Corpus) -> RecommendationService {
        RecommendationService::new(provider, Arc::new(CorpusEmbeddingCache::new()), Arc::new(corpus))
    }

    #[tokio::test]
    async fn test_python_query_prefers_python_courses() {
        let service = service_with(Arc::new(KeywordProvider::new()), sample_corpus());

        let results = service
            .recommend("I am a Python backend developer", 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].name.contains("Python"));
        // Both Python courses score the same; catalog order breaks the tie.
        assert_eq!(results[0].name, "Intro to Python");
        assert_eq!(results[1].name, "Advanced Python");
        assert_eq!(results[0].category, "IT");
        assert_eq!(results[0].duration, "10h");

        let all = service
            .recommend("I am a Python backend developer", 3)
            .await
            .unwrap();
        let ux = all.iter().find(|r| r.name == "UX Basics").unwrap();
        assert!(all[0].similarity > ux.similarity);
    }

    #[tokio::test]
    async fn test_similarity_is_rounded() {
        let service = service_with(Arc::new(KeywordProvider::new()), sample_corpus());

        let results = service.recommend("python developer", 1).await.unwrap();
        // cos([1,0,0,1,0], [1,0,0,0,0]) = 1/sqrt(2)
        assert_eq!(results[0].similarity, 0.7071);
    }

    #[tokio::test]
    async fn test_whitespace_query_is_rejected_without_encoding() {
        let provider = Arc::new(KeywordProvider::new());
        let service = service_with(provider.clone(), sample_corpus());

        let err = service.recommend("   \n\t", 5).await.unwrap_err();

        assert!(matches!(err, RecommendError::Validation(_)));
        assert!(err.is_recoverable());
        assert_eq!(provider.embed_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corpus_is_embedded_once_across_requests() {
        let provider = Arc::new(KeywordProvider::new());
        let service = service_with(provider.clone(), sample_corpus());

        service.warm_up().await.unwrap();
        service.recommend("python", 1).await.unwrap();
        service.recommend("ux design", 1).await.unwrap();

        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.embed_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_k_zero_and_large_k() {
        let service = service_with(Arc::new(KeywordProvider::new()), sample_corpus());

        assert!(service.recommend("python", 0).await.unwrap().is_empty());
        assert_eq!(service.recommend("python", 50).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_recommend_default_uses_configured_k() {
        let service = service_with(Arc::new(KeywordProvider::new()), sample_corpus())
            .with_query_config(QueryConfig {
                top_k: 2,
                score_precision: 2,
            });

        let results = service.recommend_default("python developer").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].similarity, 0.71);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_data_unavailable() {
        let empty = Corpus::new(Vec::<Course>::new());
        let service = service_with(Arc::new(KeywordProvider::new()), empty);

        let err = service.recommend("python", 5).await.unwrap_err();
        assert!(matches!(err, RecommendError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_dimension_drift_is_fatal() {
        let service = service_with(Arc::new(DriftingProvider), sample_corpus());

        let err = service.recommend("python", 2).await.unwrap_err();
        assert!(matches!(
            err,
            RecommendError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_builder_with_injected_parts() {
        let provider = Arc::new(KeywordProvider::new());
        let service = RecommendationService::builder()
            .with_provider(provider.clone())
            .with_catalog(Catalog {
                jobs: JobTable {
                    headers: vec!["job".to_string()],
                    rows: 7,
                },
                corpus: sample_corpus(),
            })
            .build()
            .await
            .unwrap();

        // Warmed during build.
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.stats(), CatalogStats { jobs: 7, courses: 3 });
    }

    #[tokio::test]
    async fn test_builder_rejects_unconfigured_openai() {
        let config = RecommenderConfig::default().with_embedding(EmbeddingConfig {
            provider: EmbeddingProviderType::OpenAI,
            api_key: Some(String::new()),
            ..EmbeddingConfig::default()
        });

        let result = RecommendationService::builder()
            .with_config(config)
            .build()
            .await;
        assert!(matches!(result, Err(RecommendError::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_tables_are_data_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = RecommenderConfig::default()
            .with_job_table(dir.path().join("jobs.csv"))
            .with_course_table(dir.path().join("courses.csv"));

        let result = RecommendationService::builder()
            .with_config(config)
            .build()
            .await;
        assert!(matches!(result, Err(RecommendError::DataUnavailable(_))));
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.123_456, 4), 0.1235);
        assert_eq!(round_score(-0.5, 4), -0.5);
        assert_eq!(round_score(1.0, 0), 1.0);
    }

    #[test]
    fn test_embedding_errors_surface() {
        let err: RecommendError = EmbeddingError::ProviderNotConfigured("openai".into()).into();
        assert!(matches!(err, RecommendError::Embedding(_)));
    }
}
