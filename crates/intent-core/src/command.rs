//! Command metadata and discovery from `.claude/commands/*.md`.
//!
//! Discovery is a boundary adapter: the classifier only ever sees the
//! resulting [`DiscoveryResult`]. Files are read in file-name order so the
//! registration order (used for tie-breaking) is stable across runs.

use crate::error::Result;
use crate::types::LifecycleStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free text describing what the command is for. Together with the
    /// description it forms the command's training corpus.
    #[serde(default)]
    pub objective: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    #[serde(default)]
    pub source: PathBuf,
    /// Stages in which the command is valid. Empty means "no declared
    /// restriction"; the lifecycle policy table then decides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<LifecycleStage>,
}

impl CommandMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        objective: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            objective: objective.into(),
            argument_hint: None,
            source: PathBuf::new(),
            stages: Vec::new(),
        }
    }

    pub fn with_stages(mut self, stages: &[LifecycleStage]) -> Self {
        self.stages = stages.to_vec();
        self
    }

    /// Text that describes the command: its name split on `-`/`:`, the
    /// description, and the objective.
    pub fn descriptor_text(&self) -> String {
        let name_words = self.name.replace(['-', ':', '_'], " ");
        [
            name_words.as_str(),
            self.description.as_str(),
            self.objective.as_str(),
        ]
        .iter()
        .filter(|s| !s.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(". ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub commands: Vec<CommandMetadata>,
    pub discovered_at: DateTime<Utc>,
    pub source: PathBuf,
}

impl DiscoveryResult {
    pub fn new(commands: Vec<CommandMetadata>, source: impl Into<PathBuf>) -> Self {
        Self {
            commands,
            discovered_at: Utc::now(),
            source: source.into(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&CommandMetadata> {
        self.commands.iter().find(|c| c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Frontmatter parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CommandFrontmatter {
    name: Option<String>,
    description: Option<String>,
    objective: Option<String>,
    argument_hint: Option<String>,
    #[serde(default)]
    stages: Vec<String>,
}

/// Split a markdown file into its YAML frontmatter and the remaining body.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = if let Some(r) = rest.strip_prefix('\n') {
        r
    } else if let Some(r) = rest.strip_prefix("\r\n") {
        r
    } else {
        return None;
    };
    let end = rest.find("\n---")?;
    let body = &rest[end + 4..];
    let body = body.split_once('\n').map(|(_, b)| b).unwrap_or("");
    Some((&rest[..end], body))
}

/// Pull an objective out of a command body: an `<objective>` block if one
/// exists, otherwise the first paragraph that is not a heading.
fn body_objective(body: &str) -> Option<String> {
    if let Some(start) = body.find("<objective>") {
        let inner = &body[start + "<objective>".len()..];
        if let Some(end) = inner.find("</objective>") {
            let text = inner[..end].split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    body.split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#') && !p.starts_with('<'))
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Parse one command file. Returns `None` when the file has no frontmatter.
pub fn parse_command(path: &Path, content: &str) -> Option<CommandMetadata> {
    let (fm, body) = split_frontmatter(content)?;
    let meta: CommandFrontmatter = match serde_yaml::from_str(fm) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid command frontmatter");
            return None;
        }
    };
    let name = meta
        .name
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))?;
    let objective = meta
        .objective
        .or_else(|| body_objective(body))
        .unwrap_or_default();
    let mut stages = Vec::with_capacity(meta.stages.len());
    for raw in &meta.stages {
        match raw.parse::<LifecycleStage>() {
            Ok(stage) => stages.push(stage),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring unknown stage"),
        }
    }
    Some(CommandMetadata {
        name,
        description: meta.description.unwrap_or_default(),
        objective,
        argument_hint: meta.argument_hint,
        source: path.to_path_buf(),
        stages,
    })
}

/// Discover commands from every `*.md` file directly under `dir`.
///
/// A missing directory yields an empty result. Files that cannot be read or
/// parsed are skipped. Later files with a duplicate name are ignored.
pub fn discover_commands(dir: &Path) -> Result<DiscoveryResult> {
    if !dir.is_dir() {
        return Ok(DiscoveryResult::new(Vec::new(), dir));
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    let mut commands: Vec<CommandMetadata> = Vec::with_capacity(paths.len());
    for path in paths {
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable command file");
                continue;
            }
        };
        let Some(cmd) = parse_command(&path, &content) else {
            tracing::debug!(path = %path.display(), "no frontmatter, not a command");
            continue;
        };
        if commands.iter().any(|c| c.name == cmd.name) {
            tracing::warn!(name = %cmd.name, path = %path.display(), "duplicate command name ignored");
            continue;
        }
        commands.push(cmd);
    }
    Ok(DiscoveryResult::new(commands, dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PLAN_PHASE: &str = r#"---
name: plan-phase
description: Create detailed execution plan for a phase
argument-hint: "[phase]"
allowed-tools: Read, Write, Bash
---

<objective>
Plan the next phase of the roadmap.
Break the work into tasks.
</objective>

## Process
...
"#;

    #[test]
    fn parses_frontmatter_and_objective_block() {
        let cmd = parse_command(Path::new("plan-phase.md"), PLAN_PHASE).unwrap();
        assert_eq!(cmd.name, "plan-phase");
        assert_eq!(cmd.description, "Create detailed execution plan for a phase");
        assert_eq!(cmd.argument_hint.as_deref(), Some("[phase]"));
        assert_eq!(
            cmd.objective,
            "Plan the next phase of the roadmap. Break the work into tasks."
        );
        assert!(cmd.stages.is_empty());
    }

    #[test]
    fn name_defaults_to_file_stem_and_objective_to_first_paragraph() {
        let content = "---\ndescription: Show progress\nstages: [planning, executing]\n---\n\n# progress\n\nSummarize where the project stands.\n";
        let cmd = parse_command(Path::new("/cmds/progress.md"), content).unwrap();
        assert_eq!(cmd.name, "progress");
        assert_eq!(cmd.objective, "Summarize where the project stands.");
        assert_eq!(
            cmd.stages,
            vec![LifecycleStage::Planning, LifecycleStage::Executing]
        );
    }

    #[test]
    fn unknown_stage_is_dropped_not_the_command() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ship.md"),
            "---\nname: ship\ndescription: Ship a release\nstages: [shipping, executing]\n---\nbody\n",
        )
        .unwrap();
        let result = discover_commands(dir.path()).unwrap();
        let ship = result.find("ship").unwrap();
        assert_eq!(ship.stages, vec![LifecycleStage::Executing]);

        let exact = crate::exact::ExactMatcher::new(&crate::config::ExactConfig::default());
        let hit = exact.find("/ship now", &result.commands).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.trailing, "now");
    }

    #[test]
    fn only_unknown_stages_leave_the_command_unrestricted() {
        let content = "---\nname: ship\nstages: [shipping]\n---\nbody\n";
        let cmd = parse_command(Path::new("ship.md"), content).unwrap();
        assert_eq!(cmd.name, "ship");
        assert!(cmd.stages.is_empty());
    }

    #[test]
    fn file_without_frontmatter_is_not_a_command() {
        assert!(parse_command(Path::new("README.md"), "# Commands\n").is_none());
    }

    #[test]
    fn descriptor_text_includes_name_words() {
        let cmd = CommandMetadata::new("new-project", "Initialize a project", "");
        assert_eq!(cmd.descriptor_text(), "new project. Initialize a project");
    }

    #[test]
    fn discover_reads_in_file_name_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("b-debug.md"),
            "---\nname: debug\ndescription: Debug things\n---\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("a-plan.md"), PLAN_PHASE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("c-readme.md"), "# no frontmatter").unwrap();

        let result = discover_commands(dir.path()).unwrap();
        let names: Vec<_> = result.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["plan-phase", "debug"]);
        assert!(result.find("debug").is_some());
    }

    #[test]
    fn discover_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let result = discover_commands(&dir.path().join("nope")).unwrap();
        assert!(result.commands.is_empty());
    }

    #[test]
    fn duplicate_names_keep_first() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("a.md"),
            "---\nname: debug\ndescription: first\n---\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.md"),
            "---\nname: debug\ndescription: second\n---\n",
        )
        .unwrap();
        let result = discover_commands(dir.path()).unwrap();
        assert_eq!(result.commands.len(), 1);
        assert_eq!(result.commands[0].description, "first");
    }
}
