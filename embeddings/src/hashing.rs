//! Offline feature-hashing encoder.
//!
//! Maps every token of the input onto one of `dimension` buckets with a
//! signed weight, then L2-normalizes. Needs no model download and is fully
//! deterministic, which makes it the default encoder for local runs and tests.

use async_trait::async_trait;
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

use crate::Embedding;
use crate::error::Result;
use crate::provider::EmbeddingProvider;
use crate::similarity::normalize;

/// Fixed keys so bucket assignment never changes between builds.
/// Changing either key changes every vector; bump [`HASHING_MODEL`] with it.
const HASH_KEY_0: u64 = 0x0123_4567_89ab_cdef;
const HASH_KEY_1: u64 = 0xfedc_ba98_7654_3210;

/// Model identity reported by [`HashingProvider`].
pub const HASHING_MODEL: &str = "feature-hash-v1";

/// Deterministic encoder based on signed feature hashing.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
    model: String,
}

impl HashingProvider {
    /// Create an encoder producing vectors of `dimension` entries (at least 1).
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model: format!("{HASHING_MODEL}-d{dimension}"),
        }
    }

    /// Encode synchronously. Text without tokens yields the zero vector.
    pub fn encode(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let hash = hash_token(&token);
            let bucket = (hash % self.dimension as u64) as usize;
            // Top bit picks the sign so colliding tokens tend to cancel out.
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new(crate::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn name(&self) -> &str {
        "hashing"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.encode(text))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.encode(text)).collect())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Lowercased alphanumeric runs. Unicode aware, so Hangul words are tokens too.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn hash_token(token: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(HASH_KEY_0, HASH_KEY_1);
    hasher.write(token.as_bytes());
    hasher.finish()
}
