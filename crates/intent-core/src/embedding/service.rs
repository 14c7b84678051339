//! The embedding service: one owned object per classifier that lazily loads
//! a model, degrades to the heuristic embedder, and mediates cache access.
//!
//! State machine:
//!
//! ```text
//! Uninitialized ──init()──► Loading ──load ok──► Ready(Model)
//!                                   └─load err─► Ready(Fallback)
//! Ready(Model) ──inference error──► Ready(Fallback)
//! ```
//!
//! Nothing here returns an error to the caller except a batch whose owner
//! keys do not line up with its texts.

use super::cache::{CacheStats, EmbeddingCache};
use super::heuristic::{HeuristicEmbedder, HEURISTIC_MODEL_ID};
use super::http::HttpEmbeddingModel;
use super::EmbeddingBackend;
use crate::config::EmbeddingConfig;
use crate::error::{IntentError, Result};
use crate::paths;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Loading,
    Ready(BackendKind),
}

enum Active {
    Model(Arc<dyn EmbeddingBackend>),
    Fallback,
}

pub struct EmbeddingService {
    model: Option<Arc<dyn EmbeddingBackend>>,
    fallback: HeuristicEmbedder,
    active: OnceCell<Active>,
    loading: AtomicBool,
    degraded: AtomicBool,
    cache: Mutex<EmbeddingCache>,
}

impl EmbeddingService {
    /// Construction is cheap: the model is not loaded until `init` or the
    /// first `embed`.
    pub fn new(
        model: Option<Arc<dyn EmbeddingBackend>>,
        cache: EmbeddingCache,
        dimensions: usize,
    ) -> Self {
        Self {
            model,
            fallback: HeuristicEmbedder::new(dimensions),
            active: OnceCell::new(),
            loading: AtomicBool::new(false),
            degraded: AtomicBool::new(false),
            cache: Mutex::new(cache),
        }
    }

    /// A service with no model: always the heuristic embedder.
    pub fn heuristic(dimensions: usize, cache: EmbeddingCache) -> Self {
        Self::new(None, cache, dimensions)
    }

    /// Build from configuration. A model is attached only when both
    /// `endpoint` and `model` are set; the cache file path is resolved
    /// against `root`.
    pub fn from_config(root: &Path, config: &EmbeddingConfig) -> Self {
        let model: Option<Arc<dyn EmbeddingBackend>> = match (&config.endpoint, &config.model) {
            (Some(endpoint), Some(model)) => match HttpEmbeddingModel::new(
                endpoint.as_str(),
                model.as_str(),
                config.dimensions,
                Duration::from_secs(config.timeout_secs),
            ) {
                Ok(http) => {
                    let key = config
                        .api_key_env
                        .as_deref()
                        .and_then(|var| std::env::var(var).ok());
                    let http = match key {
                        Some(key) => http.with_api_key(key),
                        None => http,
                    };
                    Some(Arc::new(http) as Arc<dyn EmbeddingBackend>)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not build embedding client, using heuristic embedder");
                    None
                }
            },
            _ => None,
        };
        let version = model
            .as_ref()
            .map(|m| m.model_id().to_string())
            .unwrap_or_else(|| HEURISTIC_MODEL_ID.to_string());
        let cache = EmbeddingCache::open(paths::resolve(root, &config.cache_file), version);
        Self::new(model, cache, config.dimensions)
    }

    pub fn state(&self) -> ServiceState {
        match self.active.get() {
            Some(_) if self.degraded.load(Ordering::Acquire) => {
                ServiceState::Ready(BackendKind::Fallback)
            }
            Some(Active::Model(_)) => ServiceState::Ready(BackendKind::Model),
            Some(Active::Fallback) => ServiceState::Ready(BackendKind::Fallback),
            None if self.loading.load(Ordering::Acquire) => ServiceState::Loading,
            None => ServiceState::Uninitialized,
        }
    }

    /// Load the model once. Concurrent callers await the same attempt; calls
    /// after the first completed attempt return immediately.
    pub async fn init(&self) -> BackendKind {
        self.active
            .get_or_init(|| async {
                self.loading.store(true, Ordering::Release);
                let active = match &self.model {
                    None => {
                        tracing::debug!("no embedding model configured, using heuristic embedder");
                        Active::Fallback
                    }
                    Some(model) => match model.load().await {
                        Ok(()) => {
                            tracing::info!(model = model.model_id(), "embedding model loaded");
                            Active::Model(Arc::clone(model))
                        }
                        Err(e) => {
                            tracing::warn!(
                                model = model.model_id(),
                                error = %e,
                                "embedding model failed to load, using heuristic embedder"
                            );
                            Active::Fallback
                        }
                    },
                };
                let version = match &active {
                    Active::Model(m) => m.model_id().to_string(),
                    Active::Fallback => HEURISTIC_MODEL_ID.to_string(),
                };
                self.with_cache(|c| c.set_model_version(version));
                self.loading.store(false, Ordering::Release);
                active
            })
            .await;
        self.backend_kind()
    }

    /// Return to `Uninitialized`. The next `init`/`embed` loads again.
    ///
    /// Needs exclusive access. A service shared behind an `Arc` can be reset
    /// through [`Arc::get_mut`] once the other holders are dropped; otherwise
    /// build a new service.
    pub fn reset(&mut self) {
        self.active = OnceCell::new();
        self.loading.store(false, Ordering::Release);
        self.degraded.store(false, Ordering::Release);
    }

    fn backend_kind(&self) -> BackendKind {
        match self.state() {
            ServiceState::Ready(kind) => kind,
            _ => BackendKind::Fallback,
        }
    }

    fn current_model(&self) -> Option<Arc<dyn EmbeddingBackend>> {
        if self.degraded.load(Ordering::Acquire) {
            return None;
        }
        match self.active.get() {
            Some(Active::Model(m)) => Some(Arc::clone(m)),
            _ => None,
        }
    }

    fn degrade(&self, model: &dyn EmbeddingBackend, error: &IntentError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                model = model.model_id(),
                error = %error,
                "embedding inference failed, switching to heuristic embedder"
            );
            self.with_cache(|c| c.set_model_version(HEURISTIC_MODEL_ID));
        }
    }

    /// Compute a vector and the id of the backend that produced it.
    async fn compute(&self, text: &str) -> (Vec<f32>, String) {
        if let Some(model) = self.current_model() {
            let result = match model.embed(text).await {
                Ok(v) if v.len() == self.fallback_dimensions() => Ok(v),
                Ok(v) => Err(IntentError::DimensionMismatch {
                    expected: self.fallback_dimensions(),
                    actual: v.len(),
                }),
                Err(e) => Err(e),
            };
            match result {
                Ok(v) => return (v, model.model_id().to_string()),
                Err(e) => self.degrade(model.as_ref(), &e),
            }
        }
        (self.fallback.embed_text(text), HEURISTIC_MODEL_ID.to_string())
    }

    fn fallback_dimensions(&self) -> usize {
        EmbeddingBackend::dimensions(&self.fallback)
    }

    /// Embed `text`. With an `owner`, the cache is consulted first and
    /// updated on a miss.
    pub async fn embed(&self, text: &str, owner: Option<&str>) -> Vec<f32> {
        self.init().await;
        if let Some(owner) = owner {
            if let Some(hit) = self.with_cache(|c| c.get(owner, text)) {
                tracing::debug!(owner, "embedding cache hit");
                return hit;
            }
        }
        let (vector, produced_by) = self.compute(text).await;
        if let Some(owner) = owner {
            self.with_cache(|c| {
                // Skip the write if the backend changed while we computed.
                if c.model_version() == produced_by {
                    c.set(owner, text, vector.clone());
                }
            });
        }
        vector
    }

    /// Embed every text in order. `owners`, when given, must pair one owner
    /// key with each text; otherwise nothing is embedded or cached.
    pub async fn embed_batch<T>(&self, texts: &[T], owners: Option<&[&str]>) -> Result<Vec<Vec<f32>>>
    where
        T: AsRef<str> + Sync,
    {
        if let Some(keys) = owners {
            if keys.len() != texts.len() {
                return Err(IntentError::BatchLengthMismatch {
                    texts: texts.len(),
                    keys: keys.len(),
                });
            }
        }
        let mut vectors = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let owner = owners.map(|keys| keys[i]);
            vectors.push(self.embed(text.as_ref(), owner).await);
        }
        Ok(vectors)
    }

    /// Persist the cache if it changed. Failures are logged, never returned.
    pub fn save_cache(&self) -> bool {
        self.with_cache(|c| match c.save() {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save embedding cache");
                false
            }
        })
    }

    pub fn prune_cache(&self, owners: &[&str]) -> usize {
        self.with_cache(|c| c.retain_owners(owners))
    }

    pub fn clear_cache(&self) {
        self.with_cache(|c| c.clear());
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.with_cache(|c| c.stats())
    }

    fn with_cache<R>(&self, f: impl FnOnce(&mut EmbeddingCache) -> R) -> R {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cache)
    }
}
