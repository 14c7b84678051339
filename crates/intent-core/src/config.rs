use crate::error::Result;
use crate::paths;
use crate::types::LifecycleStage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ClassifierConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_ambiguity_gap")]
    pub ambiguity_gap: f64,
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f64,
    #[serde(default = "default_true")]
    pub enable_semantic: bool,
    /// Additive smoothing constant for the Bayes scorer.
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_ambiguity_gap() -> f64 {
    0.15
}

fn default_max_alternatives() -> usize {
    3
}

fn default_semantic_threshold() -> f64 {
    0.4
}

fn default_smoothing() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            ambiguity_gap: default_ambiguity_gap(),
            max_alternatives: default_max_alternatives(),
            semantic_threshold: default_semantic_threshold(),
            enable_semantic: true,
            smoothing: default_smoothing(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExactConfig
// ---------------------------------------------------------------------------

/// Explicit invocation syntax: `<prefix>[<namespace>]<command> [args]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn default_prefix() -> String {
    "/".to_string()
}

impl Default for ExactConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            namespace: None,
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleConfig
// ---------------------------------------------------------------------------

/// Command name → stages in which the command may be chosen from natural
/// language. Commands not listed are valid in every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LifecycleConfig {
    pub restrictions: BTreeMap<String, Vec<String>>,
}

fn default_restrictions() -> BTreeMap<String, Vec<String>> {
    let mut m = BTreeMap::new();
    let mut put = |name: &str, stages: &[LifecycleStage]| {
        m.insert(
            name.to_string(),
            stages.iter().map(|s| s.as_str().to_string()).collect(),
        );
    };
    put("new-project", &[LifecycleStage::Uninitialized]);
    put(
        "plan-phase",
        &[LifecycleStage::Planning, LifecycleStage::Executing],
    );
    put(
        "execute-phase",
        &[LifecycleStage::Planning, LifecycleStage::Executing],
    );
    put(
        "complete-milestone",
        &[LifecycleStage::Executing, LifecycleStage::MilestoneEnd],
    );
    put("new-milestone", &[LifecycleStage::MilestoneEnd]);
    m
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            restrictions: default_restrictions(),
        }
    }
}

impl LifecycleConfig {
    /// No restrictions at all: every command is valid in every stage.
    pub fn unrestricted() -> Self {
        Self {
            restrictions: BTreeMap::new(),
        }
    }

    /// Parsed stages for `command`, or `None` if the command is unlisted.
    /// Unknown stage names are dropped (and reported by `Config::validate`).
    pub fn stages_for(&self, command: &str) -> Option<Vec<LifecycleStage>> {
        self.restrictions
            .get(command)
            .map(|names| names.iter().filter_map(|n| n.parse().ok()).collect())
    }
}

// ---------------------------------------------------------------------------
// EmbeddingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Model identifier sent to the embeddings endpoint and recorded as the
    /// cache's model version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// OpenAI-compatible embeddings URL. Without it only the heuristic
    /// embedder is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Name of the environment variable holding a bearer token for the
    /// endpoint, if it needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub const DEFAULT_DIMENSIONS: usize = 384;

fn default_dimensions() -> usize {
    DEFAULT_DIMENSIONS
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(paths::EMBEDDING_CACHE_FILE)
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            model: None,
            endpoint: None,
            api_key_env: None,
            cache_file: default_cache_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_audit_file")]
    pub file: PathBuf,
}

fn default_audit_file() -> PathBuf {
    PathBuf::from(paths::AUDIT_LOG_FILE)
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: default_audit_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub exact: ExactConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            classifier: ClassifierConfig::default(),
            exact: ExactConfig::default(),
            lifecycle: LifecycleConfig::default(),
            embedding: EmbeddingConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl Config {
    /// Load `.intent/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let c = &self.classifier;

        for (key, value) in [
            ("confidence_threshold", c.confidence_threshold),
            ("ambiguity_gap", c.ambiguity_gap),
            ("semantic_threshold", c.semantic_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("classifier.{key} must be within [0, 1], got {value}"),
                });
            }
        }

        if c.max_alternatives == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "classifier.max_alternatives is 0: ambiguous results will carry no alternatives"
                    .to_string(),
            });
        }

        if c.smoothing <= 0.0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("classifier.smoothing must be positive, got {}", c.smoothing),
            });
        }

        if self.exact.prefix.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "exact.prefix is empty: any utterance starting with a command name is an exact match"
                    .to_string(),
            });
        }

        for (command, stages) in &self.lifecycle.restrictions {
            for stage in stages {
                if stage.parse::<LifecycleStage>().is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("unknown stage '{stage}' for command '{command}' in lifecycle"),
                    });
                }
            }
        }

        if self.embedding.dimensions == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "embedding.dimensions must be greater than 0".to_string(),
            });
        }

        if self.embedding.endpoint.is_some() && self.embedding.model.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "embedding.endpoint is set but embedding.model is not: the heuristic embedder will be used"
                    .to_string(),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.classifier.confidence_threshold, 0.5);
        assert_eq!(parsed.classifier.ambiguity_gap, 0.15);
        assert_eq!(parsed.classifier.max_alternatives, 3);
        assert_eq!(parsed.embedding.dimensions, 384);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".intent")).unwrap();
        std::fs::write(
            dir.path().join(".intent/config.yaml"),
            "classifier:\n  confidence_threshold: 0.7\nexact:\n  namespace: \"gsd:\"\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.classifier.confidence_threshold, 0.7);
        assert_eq!(cfg.classifier.ambiguity_gap, 0.15);
        assert_eq!(cfg.exact.prefix, "/");
        assert_eq!(cfg.exact.namespace.as_deref(), Some("gsd:"));
        assert!(cfg.lifecycle.restrictions.contains_key("new-project"));
    }

    #[test]
    fn default_config_has_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_out_of_range_thresholds() {
        let mut cfg = Config::default();
        cfg.classifier.confidence_threshold = 1.5;
        cfg.classifier.max_alternatives = 0;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("confidence_threshold")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("max_alternatives")));
    }

    #[test]
    fn validate_flags_unknown_stage() {
        let mut cfg = Config::default();
        cfg.lifecycle
            .restrictions
            .insert("ship".to_string(), vec!["shipping".to_string()]);
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("shipping"));
    }

    #[test]
    fn stages_for_skips_unknown_names() {
        let mut lifecycle = LifecycleConfig::unrestricted();
        lifecycle.restrictions.insert(
            "plan-phase".to_string(),
            vec!["planning".to_string(), "bogus".to_string()],
        );
        assert_eq!(
            lifecycle.stages_for("plan-phase"),
            Some(vec![LifecycleStage::Planning])
        );
        assert_eq!(lifecycle.stages_for("debug"), None);
    }
}
