//! Persistent embedding cache.
//!
//! Entries are keyed by owner (a command name) and carry the SHA-256 of the
//! exact text that was embedded plus the model version that produced the
//! vector. A lookup hits only when both match. Each owner holds at most one
//! entry: storing a new content hash replaces the old one.
//!
//! The backing file is JSON: `{ version, modelId, entries }`. A file whose
//! format `version` differs, or that does not parse, is discarded and the
//! cache starts empty. Concurrent processes are not coordinated; the last
//! `save` wins.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub embedding: Vec<f32>,
    pub model_version: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    version: u32,
    model_id: String,
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub path: Option<PathBuf>,
    pub model_version: String,
    pub entries: usize,
    /// Entries produced by the current model version.
    pub current: usize,
    pub dirty: bool,
}

#[derive(Debug)]
pub struct EmbeddingCache {
    path: Option<PathBuf>,
    model_version: String,
    entries: BTreeMap<String, CacheEntry>,
    dirty: bool,
}

/// Hex SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

impl EmbeddingCache {
    /// A cache that is never written to disk.
    pub fn in_memory(model_version: impl Into<String>) -> Self {
        Self {
            path: None,
            model_version: model_version.into(),
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Open the cache backed by `path`. Missing, unreadable, corrupt or
    /// foreign-format files all yield an empty cache.
    pub fn open(path: impl Into<PathBuf>, model_version: impl Into<String>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "embedding cache unreadable, starting empty");
                BTreeMap::new()
            }
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "embedding cache opened");
        Self {
            path: Some(path),
            model_version: model_version.into(),
            entries,
            dirty: false,
        }
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, CacheEntry>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = std::fs::read_to_string(path)?;
        let file: CacheFile = serde_json::from_str(&data)?;
        if file.version != CACHE_FORMAT_VERSION {
            tracing::warn!(
                path = %path.display(),
                found = file.version,
                expected = CACHE_FORMAT_VERSION,
                "embedding cache format changed, discarding"
            );
            return Ok(BTreeMap::new());
        }
        Ok(file.entries)
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Change the version lookups are checked against. Stored entries are
    /// left untouched; entries from another version simply stop hitting.
    pub fn set_model_version(&mut self, model_version: impl Into<String>) {
        self.model_version = model_version.into();
    }

    pub fn get(&self, owner: &str, content: &str) -> Option<Vec<f32>> {
        let entry = self.entries.get(owner)?;
        if entry.model_version != self.model_version || entry.content_hash != content_hash(content)
        {
            return None;
        }
        Some(entry.embedding.clone())
    }

    /// Store `embedding` for `owner`, replacing whatever the owner had.
    pub fn set(&mut self, owner: &str, content: &str, embedding: Vec<f32>) {
        self.entries.insert(
            owner.to_string(),
            CacheEntry {
                embedding,
                model_version: self.model_version.clone(),
                content_hash: content_hash(content),
                created_at: Utc::now(),
            },
        );
        self.dirty = true;
    }

    /// Drop entries whose owner is not in `owners`. Returns how many were removed.
    pub fn retain_owners(&mut self, owners: &[&str]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| owners.contains(&k.as_str()));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            path: self.path.clone(),
            model_version: self.model_version.clone(),
            entries: self.entries.len(),
            current: self
                .entries
                .values()
                .filter(|e| e.model_version == self.model_version)
                .count(),
            dirty: self.dirty,
        }
    }

    /// Write the cache to its backing file. Returns `Ok(false)` without
    /// touching the disk when nothing changed or the cache is in-memory.
    pub fn save(&mut self) -> Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        if !self.dirty {
            return Ok(false);
        }
        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            model_id: self.model_version.clone(),
            entries: self.entries.clone(),
        };
        let data = serde_json::to_vec(&file)?;
        crate::io::atomic_write(path, &data)?;
        self.dirty = false;
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "embedding cache saved");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_then_get_hits() {
        let mut cache = EmbeddingCache::in_memory("m1");
        cache.set("plan-phase", "plan a phase", vec![0.1, 0.2]);
        assert_eq!(cache.get("plan-phase", "plan a phase"), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn different_content_misses() {
        let mut cache = EmbeddingCache::in_memory("m1");
        cache.set("plan-phase", "plan a phase", vec![0.1]);
        assert_eq!(cache.get("plan-phase", "plan the phase"), None);
        assert_eq!(cache.get("debug", "plan a phase"), None);
    }

    #[test]
    fn version_change_turns_hit_into_miss_without_touching_data() {
        let mut cache = EmbeddingCache::in_memory("m1");
        cache.set("debug", "debug it", vec![1.0]);
        cache.set_model_version("m2");
        assert_eq!(cache.get("debug", "debug it"), None);
        assert_eq!(cache.len(), 1);

        cache.set_model_version("m1");
        assert_eq!(cache.get("debug", "debug it"), Some(vec![1.0]));
    }

    #[test]
    fn owner_keeps_only_latest_content() {
        let mut cache = EmbeddingCache::in_memory("m1");
        cache.set("debug", "old text", vec![1.0]);
        cache.set("debug", "new text", vec![2.0]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("debug", "old text"), None);
        assert_eq!(cache.get("debug", "new text"), Some(vec![2.0]));
    }

    #[test]
    fn save_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".intent/embeddings.json");
        let mut cache = EmbeddingCache::open(&path, "m1");
        cache.set("progress", "show progress", vec![0.5, 0.5]);
        assert!(cache.save().unwrap());

        let reopened = EmbeddingCache::open(&path, "m1");
        assert_eq!(reopened.get("progress", "show progress"), Some(vec![0.5, 0.5]));
        assert!(!reopened.is_dirty());
    }

    #[test]
    fn save_is_noop_when_clean() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let mut cache = EmbeddingCache::open(&path, "m1");
        assert!(!cache.save().unwrap());
        assert!(!path.exists());

        cache.set("a", "a", vec![1.0]);
        assert!(cache.save().unwrap());
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert!(!cache.save().unwrap());
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn corrupt_file_is_an_empty_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache = EmbeddingCache::open(&path, "m1");
        assert!(cache.is_empty());
    }

    #[test]
    fn foreign_format_version_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{"version": 99, "modelId": "m1", "entries": {"a": {"embedding": [1.0], "modelVersion": "m1", "contentHash": "x", "createdAt": "2025-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();
        assert!(EmbeddingCache::open(&path, "m1").is_empty());
    }

    #[test]
    fn retain_owners_prunes_removed_commands() {
        let mut cache = EmbeddingCache::in_memory("m1");
        cache.set("a", "a", vec![1.0]);
        cache.set("b", "b", vec![1.0]);
        assert_eq!(cache.retain_owners(&["a"]), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a", "a").is_some());
    }

    #[test]
    fn stats_count_current_version() {
        let mut cache = EmbeddingCache::in_memory("m1");
        cache.set("a", "a", vec![1.0]);
        cache.set_model_version("m2");
        cache.set("b", "b", vec![1.0]);
        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.current, 1);
        assert_eq!(stats.model_version, "m2");
    }

    #[test]
    fn content_hash_is_stable_hex() {
        let h = content_hash("hello");
        assert_eq!(h.len(), 64);
        assert_eq!(h, content_hash("hello"));
        assert_ne!(h, content_hash("hello "));
    }
}
