//! Model-free fallback embedder.
//!
//! Projects word stems and character trigrams into a fixed number of buckets
//! with FNV-1a hashing, then L2-normalizes. Deterministic and always
//! available. Semantic quality is far below a real model.

use super::{l2_normalize, EmbeddingBackend};
use crate::config::DEFAULT_DIMENSIONS;
use crate::error::Result;
use crate::text::tokenize;
use async_trait::async_trait;

pub const HEURISTIC_MODEL_ID: &str = "heuristic-ngram-v1";

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicEmbedder {
    dimensions: usize,
}

impl Default for HeuristicEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HeuristicEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// FNV-1a over a namespace byte and the feature bytes.
    fn bucket(&self, namespace: u8, feature: &str) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in std::iter::once(namespace).chain(feature.bytes()) {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h % self.dimensions as u64) as usize
    }

    /// Embed `text`. The empty string maps to the all-zero vector; any other
    /// text maps to a unit vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        if text.is_empty() {
            return v;
        }

        for word in tokenize(text) {
            v[self.bucket(b'w', &word)] += WORD_WEIGHT;
        }

        // Character trigrams over the case-folded text with collapsed
        // whitespace. Double padding guarantees at least one trigram, so any
        // non-empty text (even pure whitespace) has a non-zero projection.
        let folded = text
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let padded: Vec<char> = format!("  {folded}  ").chars().collect();
        for window in padded.windows(3) {
            let gram: String = window.iter().collect();
            v[self.bucket(b'c', &gram)] += TRIGRAM_WEIGHT;
        }

        l2_normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingBackend for HeuristicEmbedder {
    fn model_id(&self) -> &str {
        HEURISTIC_MODEL_ID
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn load(&self) -> Result<()> {
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{cosine_similarity, magnitude};

    #[test]
    fn same_text_same_vector() {
        let e = HeuristicEmbedder::default();
        assert_eq!(e.embed_text("x"), e.embed_text("x"));
        assert_eq!(
            e.embed_text("plan the next phase"),
            e.embed_text("plan the next phase")
        );
    }

    #[test]
    fn empty_text_is_the_zero_vector() {
        let v = HeuristicEmbedder::default().embed_text("");
        assert_eq!(v.len(), 384);
        assert_eq!(magnitude(&v), 0.0);
    }

    #[test]
    fn non_empty_text_is_unit_length_with_384_dims() {
        let e = HeuristicEmbedder::default();
        for text in ["x", "   ", "!!!", "plan the next phase", "ünïcödé 測試"] {
            let v = e.embed_text(text);
            assert_eq!(v.len(), 384, "{text:?}");
            assert!((magnitude(&v) - 1.0).abs() < 1e-5, "{text:?}");
        }
    }

    #[test]
    fn different_texts_diverge() {
        let e = HeuristicEmbedder::default();
        assert_ne!(e.embed_text("plan a phase"), e.embed_text("debug a failure"));
        assert_ne!(e.embed_text("a"), e.embed_text("b"));
    }

    #[test]
    fn related_text_is_closer_than_unrelated() {
        let e = HeuristicEmbedder::default();
        let query = e.embed_text("plan the next phase");
        let related = e.embed_text("plan phase: create an execution plan for the next phase");
        let unrelated = e.embed_text("systematic debugging with persistent state");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn backend_trait_matches_inherent_embed() {
        let e = HeuristicEmbedder::new(64);
        assert_eq!(e.model_id(), HEURISTIC_MODEL_ID);
        assert_eq!(e.embed("hello").await.unwrap(), e.embed_text("hello"));
        assert_eq!(EmbeddingBackend::dimensions(&e), 64);
    }
}
