//! Similarity computation and ranking for embeddings.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors, or either vector has zero norm
/// - -1.0 means opposite vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_lengths(a, b)?;
    let dot = dot(a, b);
    let magnitude_a = magnitude(a);
    let magnitude_b = magnitude(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    let score = dot / (magnitude_a * magnitude_b);
    if !score.is_finite() {
        return Ok(0.0);
    }
    // Rounding can push parallel vectors a hair past 1.0.
    Ok(score.clamp(-1.0, 1.0) as f32)
}

/// Compute the dot product between two embeddings.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_lengths(a, b)?;
    Ok(dot(a, b) as f32)
}

fn check_lengths(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

// Sums run in f64: squares of tiny or huge f32 entries would underflow to
// zero or overflow to infinity in f32.
fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

fn magnitude(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt()
}

/// Normalize an embedding to unit length. Zero vectors are left untouched.
pub fn normalize(embedding: &mut [f32]) {
    let magnitude = magnitude(embedding);
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x = (f64::from(*x) / magnitude) as f32;
        }
    }
}

/// Rank `corpus` against `query` and return the `k` best `(index, score)` pairs.
///
/// Results are ordered by descending score; equal scores keep ascending
/// corpus index, so the order is reproducible. The result has
/// `min(k, corpus.len())` entries and is empty when `k == 0`.
pub fn top_k(query: &[f32], corpus: &[Vec<f32>], k: usize) -> Result<Vec<(usize, f32)>> {
    if k == 0 || corpus.is_empty() {
        return Ok(Vec::new());
    }

    let mut scores: Vec<(usize, f32)> = Vec::with_capacity(corpus.len());
    for (index, vector) in corpus.iter().enumerate() {
        if vector.len() != query.len() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: query.len(),
                actual: vector.len(),
            });
        }
        scores.push((index, cosine_similarity(query, vector)?));
    }

    scores.sort_by_key(|&(index, score)| (Reverse(OrderedFloat(score)), index));
    scores.truncate(k);

    Ok(scores)
}
