//! Embedding providers.
//!
//! An [`EmbeddingProvider`] turns text into fixed-length vectors. The
//! recommender only ever talks to the trait, so a remote API, the offline
//! hashing encoder, or a test fake can be injected interchangeably.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Trait for embedding providers.
///
/// Implementations must be deterministic for a fixed model: the same text
/// always yields the same vector, and every vector has [`dimension`] entries.
///
/// [`dimension`]: EmbeddingProvider::dimension
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Model identity. Vectors from different models are never mixed.
    fn model(&self) -> &str;

    /// Length of every vector this provider produces.
    fn dimension(&self) -> usize;

    /// Generate an embedding for the given text. Empty text is valid input.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        // Default implementation: process sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Default base URL for the OpenAI embeddings API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI embedding model.
pub const OPENAI_DEFAULT_MODEL: &str = "text-embedding-3-small";

/// OpenAI-compatible embedding provider.
///
/// Works against any server exposing `POST {base_url}/embeddings` with the
/// OpenAI request and response shape.
pub struct OpenAIProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model to request.
    model: String,

    /// Expected vector length.
    dimension: usize,

    /// Whether `dimension` is sent to the API as an explicit request.
    request_dimension: bool,

    /// Maximum number of inputs per request.
    batch_size: usize,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider using `OPENAI_API_KEY` from the environment.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: OPENAI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
            dimension: default_dimension_for(OPENAI_DEFAULT_MODEL),
            request_dimension: false,
            batch_size: 64,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model. Resets the dimension to the model's native size.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimension = default_dimension_for(&self.model);
        self.request_dimension = false;
        self
    }

    /// Request vectors of a specific length.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self.request_dimension = true;
        self
    }

    /// Set the maximum number of inputs sent per request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Send one embeddings request and return vectors in input order.
    async fn request(&self, inputs: &[&str]) -> Result<Vec<Embedding>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::ProviderNotConfigured(self.name().to_string()))?;

        // The API rejects empty inputs; a single space embeds the same
        // degenerate text without failing the whole batch.
        let inputs: Vec<&str> = inputs
            .iter()
            .map(|text| if text.is_empty() { " " } else { *text })
            .collect();

        let mut body = serde_json::json!({
            "input": inputs,
            "model": self.model,
        });
        if self.request_dimension {
            body["dimensions"] = serde_json::json!(self.dimension);
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "{status}: {error_text}"
            )));
        }

        let mut result: OpenAIEmbeddingResponse = response.json().await?;
        if result.data.len() != inputs.len() {
            return Err(EmbeddingError::BatchLength {
                expected: inputs.len(),
                actual: result.data.len(),
            });
        }

        result.data.sort_by_key(|item| item.index);
        let mut embeddings = Vec::with_capacity(result.data.len());
        for (position, item) in result.data.into_iter().enumerate() {
            if item.index != position {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "missing embedding for input {position}"
                )));
            }
            if item.embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: item.embedding.len(),
                });
            }
            embeddings.push(item.embedding);
        }

        if let Some(usage) = result.usage {
            debug!(
                "Embedded {} inputs with {} ({} tokens)",
                embeddings.len(),
                self.model,
                usage.total_tokens
            );
        }

        Ok(embeddings)
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.request(&[text])
            .await?
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".to_string()))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let inputs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            embeddings.extend(self.request(&inputs).await?);
        }

        info!(
            "Generated {} embeddings with {} dimensions",
            embeddings.len(),
            self.dimension
        );
        Ok(embeddings)
    }

    fn is_available(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

/// Native vector length of well-known OpenAI models.
fn default_dimension_for(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAIProvider {
        OpenAIProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri())
            .with_dimension(3)
    }

    #[test]
    fn test_openai_provider_default_dimensions() {
        let provider = OpenAIProvider::new().with_model("text-embedding-3-large");
        assert_eq!(provider.dimension(), 3072);

        let provider = provider.with_dimension(256);
        assert_eq!(provider.dimension(), 256);
    }

    #[test]
    fn test_provider_without_key_is_unavailable() {
        let provider = OpenAIProvider::new().with_api_key("");
        assert!(!provider.is_available());
        assert!(provider.with_api_key("sk-test").is_available());
    }

    #[tokio::test]
    async fn test_embed_many_restores_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "embedding": [0.0, 1.0, 0.0], "index": 1 },
                    { "embedding": [1.0, 0.0, 0.0], "index": 0 }
                ],
                "model": "text-embedding-3-small",
                "usage": { "prompt_tokens": 4, "total_tokens": 4 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let vectors = provider
            .embed_many(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_embed_many_splits_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.5, 0.5, 0.0], "index": 0 }],
                "model": "text-embedding-3-small"
            })))
            .expect(3)
            .mount(&server)
            .await;

        let provider = provider_for(&server).with_batch_size(1);
        let texts = vec!["a".to_string(), "b".to_string(), String::new()];
        let vectors = provider.embed_many(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_reports_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = provider_for(&server).embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::RateLimited {
                retry_after_secs: 7
            }
        ));
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [1.0, 0.0], "index": 0 }],
                "model": "text-embedding-3-small"
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let provider = OpenAIProvider {
            api_key: None,
            ..OpenAIProvider::new()
        };
        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderNotConfigured(_)));
    }
}
