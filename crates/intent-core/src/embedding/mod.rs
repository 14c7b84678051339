//! Embedding subsystem backing the semantic fallback.
//!
//! ```text
//! EmbeddingService ── init() once ──► EmbeddingBackend (model)  ─┐
//!        │                             load failed / inference   │
//!        │                             failed                    ▼
//!        │                        HeuristicEmbedder (fallback, permanent)
//!        ▼
//! EmbeddingCache   keyed by (owner, sha256(content)), checked against
//!                  the active backend's model id
//! ```

pub mod cache;
pub mod heuristic;
pub mod http;
pub mod service;

pub use cache::{CacheEntry, CacheStats, EmbeddingCache};
pub use heuristic::{HeuristicEmbedder, HEURISTIC_MODEL_ID};
pub use http::HttpEmbeddingModel;
pub use service::{BackendKind, EmbeddingService, ServiceState};

use crate::error::Result;
use async_trait::async_trait;

/// A source of embedding vectors.
///
/// `load` is called at most once per service, before the first `embed`.
/// Implementations report failures as errors; the service decides how to
/// degrade.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Identifier recorded as the cache's model version.
    fn model_id(&self) -> &str;

    fn dimensions(&self) -> usize;

    async fn load(&self) -> Result<()>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Cosine similarity. Zero-magnitude or mismatched vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place. The zero vector is left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = magnitude(v);
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
