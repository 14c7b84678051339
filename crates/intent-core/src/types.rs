use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// LifecycleStage
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStage {
    #[default]
    Uninitialized,
    Planning,
    Executing,
    MilestoneEnd,
}

impl LifecycleStage {
    pub fn all() -> &'static [LifecycleStage] {
        &[
            LifecycleStage::Uninitialized,
            LifecycleStage::Planning,
            LifecycleStage::Executing,
            LifecycleStage::MilestoneEnd,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStage::Uninitialized => "uninitialized",
            LifecycleStage::Planning => "planning",
            LifecycleStage::Executing => "executing",
            LifecycleStage::MilestoneEnd => "milestone-end",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LifecycleStage {
    type Err = crate::error::IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uninitialized" => Ok(LifecycleStage::Uninitialized),
            "planning" => Ok(LifecycleStage::Planning),
            "executing" => Ok(LifecycleStage::Executing),
            "milestone-end" | "milestone_end" => Ok(LifecycleStage::MilestoneEnd),
            _ => Err(crate::error::IntentError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ResultType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultType {
    ExactMatch,
    Classified,
    Ambiguous,
    NoMatch,
}

impl ResultType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultType::ExactMatch => "exact-match",
            ResultType::Classified => "classified",
            ResultType::Ambiguous => "ambiguous",
            ResultType::NoMatch => "no-match",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MatchMethod
// ---------------------------------------------------------------------------

/// Which stage of the pipeline produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Bayes,
    Semantic,
}

impl MatchMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Bayes => "bayes",
            MatchMethod::Semantic => "semantic",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_parse_display_roundtrip() {
        for stage in LifecycleStage::all() {
            let parsed: LifecycleStage = stage.as_str().parse().unwrap();
            assert_eq!(parsed, *stage);
        }
    }

    #[test]
    fn stage_accepts_snake_case_alias() {
        let parsed: LifecycleStage = "milestone_end".parse().unwrap();
        assert_eq!(parsed, LifecycleStage::MilestoneEnd);
    }

    #[test]
    fn unknown_stage_is_an_error() {
        assert!("shipping".parse::<LifecycleStage>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case() {
        let yaml = serde_yaml::to_string(&LifecycleStage::MilestoneEnd).unwrap();
        assert_eq!(yaml.trim(), "milestone-end");
        let json = serde_json::to_string(&ResultType::NoMatch).unwrap();
        assert_eq!(json, "\"no-match\"");
    }
}
