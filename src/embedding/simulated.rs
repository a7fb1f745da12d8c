//! Deterministic embedding backend for demos and tests.

use super::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Simulated embedder producing hash-derived unit vectors.
///
/// The same text always maps to the same vector, and similar inputs do
/// not cluster; this only exercises shape and plumbing, not semantics.
pub struct SimulatedEmbedder {
    dimensions: usize,
}

impl SimulatedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut values = Vec::with_capacity(self.dimensions);
        let mut state = 0u64;

        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            state = hasher.finish().wrapping_add(state);
            // Map to [-1, 1]
            values.push((state as f64 / u64::MAX as f64 * 2.0 - 1.0) as f32);
        }

        // Normalize to a unit vector so cosine scores are well-behaved
        let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }

        values
    }
}

#[async_trait]
impl Embedder for SimulatedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_dimensionality() {
        let embedder = SimulatedEmbedder::new(64);
        let v = embedder.embed("hello").await.unwrap();
        assert_eq!(v.len(), 64);
        assert_eq!(embedder.dimensions(), 64);
    }

    #[tokio::test]
    async fn test_deterministic_and_distinct() {
        let embedder = SimulatedEmbedder::new(32);
        let a = embedder.embed("alpha").await.unwrap();
        let b = embedder.embed("alpha").await.unwrap();
        let c = embedder.embed("beta").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_unit_norm() {
        let embedder = SimulatedEmbedder::new(16);
        let v = embedder.embed("norm me").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }
}
