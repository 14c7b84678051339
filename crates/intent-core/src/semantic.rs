//! Semantic fallback: ranks candidate commands by cosine similarity between
//! the utterance and each command's descriptor text.

use crate::command::CommandMetadata;
use crate::embedding::{cosine_similarity, magnitude, EmbeddingService};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticMatch {
    /// Index into the command registry.
    pub index: usize,
    pub similarity: f64,
}

#[async_trait]
pub trait SemanticMatcher: Send + Sync {
    /// Rank `candidates` (indices into `commands`) against `input`, best
    /// first. An empty result means "no opinion".
    async fn rank(
        &self,
        input: &str,
        commands: &[CommandMetadata],
        candidates: &[usize],
    ) -> Vec<SemanticMatch>;

    /// Precompute whatever the matcher needs for `commands`.
    async fn warm(&self, _commands: &[CommandMetadata]) {}
}

/// Matcher backed by an [`EmbeddingService`]. Command vectors are cached
/// under the command name.
pub struct EmbeddingMatcher {
    service: Arc<EmbeddingService>,
}

impl EmbeddingMatcher {
    pub fn new(service: Arc<EmbeddingService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<EmbeddingService> {
        &self.service
    }

    async fn command_vectors(&self, commands: &[&CommandMetadata]) -> Vec<Vec<f32>> {
        let texts: Vec<String> = commands.iter().map(|c| c.descriptor_text()).collect();
        let owners: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        match self.service.embed_batch(&texts, Some(&owners)).await {
            Ok(vectors) => vectors,
            Err(e) => {
                // Owners and texts come from the same slice.
                tracing::warn!(error = %e, "command embedding failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SemanticMatcher for EmbeddingMatcher {
    async fn rank(
        &self,
        input: &str,
        commands: &[CommandMetadata],
        candidates: &[usize],
    ) -> Vec<SemanticMatch> {
        let query = self.service.embed(input, None).await;
        if magnitude(&query) == 0.0 {
            return Vec::new();
        }
        let selected: Vec<&CommandMetadata> =
            candidates.iter().filter_map(|&i| commands.get(i)).collect();
        let vectors = self.command_vectors(&selected).await;
        if vectors.len() != selected.len() {
            return Vec::new();
        }

        let mut ranked: Vec<SemanticMatch> = candidates
            .iter()
            .copied()
            .filter(|&i| i < commands.len())
            .zip(vectors.iter())
            .map(|(index, v)| SemanticMatch {
                index,
                similarity: f64::from(cosine_similarity(&query, v)).clamp(0.0, 1.0),
            })
            .filter(|m| m.similarity.is_finite())
            .collect();
        // Stable: ties keep candidate (registration) order.
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked
    }

    async fn warm(&self, commands: &[CommandMetadata]) {
        let all: Vec<&CommandMetadata> = commands.iter().collect();
        self.command_vectors(&all).await;
        tracing::debug!(commands = all.len(), "command embeddings warmed");
    }
}
