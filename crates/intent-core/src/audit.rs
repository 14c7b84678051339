//! Audit trail of classification decisions.
//!
//! Every `classify` call produces one [`AuditRecord`]. Sinks must not fail
//! the caller: [`AuditSink::record`] has no return value and implementations
//! log and drop their own errors.

use crate::classifier::ClassificationResult;
use crate::types::{LifecycleStage, MatchMethod, ResultType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub input: String,
    pub command: Option<String>,
    #[serde(rename = "type")]
    pub result_type: ResultType,
    pub confidence: f64,
    pub method: Option<MatchMethod>,
    pub lifecycle_stage: Option<LifecycleStage>,
    /// Number of alternatives offered with the result.
    pub alternatives: usize,
}

impl AuditRecord {
    pub fn from_result(input: &str, result: &ClassificationResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            input: input.to_string(),
            command: result.command.as_ref().map(|c| c.name.clone()),
            result_type: result.result_type,
            confidence: result.confidence,
            method: result.method,
            lifecycle_stage: result.lifecycle_stage,
            alternatives: result.alternatives.len(),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Appends one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &AuditRecord) -> crate::Result<()> {
        let line = serde_json::to_string(record)?;
        crate::io::append_line(&self.path, &line)
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, record: &AuditRecord) {
        if let Err(e) = self.append(record) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to append audit record");
        }
    }
}

/// Emit the record as a structured `tracing` event.
pub(crate) fn trace_record(record: &AuditRecord) {
    tracing::info!(
        target: "intent::audit",
        id = %record.id,
        command = record.command.as_deref().unwrap_or("-"),
        result_type = record.result_type.as_str(),
        confidence = record.confidence,
        method = record.method.map(MatchMethod::as_str).unwrap_or("-"),
        stage = record.lifecycle_stage.map(LifecycleStage::as_str).unwrap_or("-"),
        alternatives = record.alternatives,
        "classified"
    );
}
