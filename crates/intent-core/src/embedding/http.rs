//! Embedding backend for OpenAI-compatible HTTP endpoints
//! (`POST {endpoint}` with `{"model", "input"}`).

use super::{l2_normalize, EmbeddingBackend};
use crate::error::{IntentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text sent once by `load` to prove the endpoint answers with vectors of
/// the configured size.
const PROBE_TEXT: &str = "embedding probe";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
}

impl HttpEmbeddingModel {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            dimensions,
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let mut req = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?.error_for_status()?;
        let body: EmbeddingResponse = resp.json().await?;
        let mut vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| IntentError::Inference("response contained no embedding".to_string()))?;
        if vector.len() != self.dimensions {
            return Err(IntentError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn load(&self) -> Result<()> {
        self.request(PROBE_TEXT)
            .await
            .map(|_| ())
            .map_err(|e| IntentError::ModelLoad(format!("{}: {e}", self.endpoint)))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Ok(vec![0.0; self.dimensions]);
        }
        self.request(text).await
    }
}
