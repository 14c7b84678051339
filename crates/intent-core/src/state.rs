use crate::error::Result;
use crate::paths;
use crate::types::LifecycleStage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the hosting project currently is. Supplied per call to
/// `IntentClassifier::classify`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub stage: LifecycleStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<String>,
}

impl ProjectState {
    pub fn at(stage: LifecycleStage) -> Self {
        Self {
            stage,
            ..Default::default()
        }
    }

    /// Load `.intent/state.yaml`. A missing file means the project has not
    /// been initialized yet.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::state_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let state: ProjectState = serde_yaml::from_str(&data)?;
        Ok(state)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::state_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}
