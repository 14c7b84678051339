//! Lifecycle filter: narrows natural-language candidates to the commands that
//! make sense in the project's current stage.

use crate::command::CommandMetadata;
use crate::config::LifecycleConfig;
use crate::types::LifecycleStage;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct LifecycleFilter {
    table: HashMap<String, Vec<LifecycleStage>>,
}

impl LifecycleFilter {
    pub fn new(config: &LifecycleConfig) -> Self {
        let table = config
            .restrictions
            .keys()
            .filter_map(|name| config.stages_for(name).map(|s| (name.clone(), s)))
            .collect();
        Self { table }
    }

    /// Stages declared on the command win over the policy table; a command
    /// with neither is valid everywhere.
    pub fn allows(&self, command: &CommandMetadata, stage: LifecycleStage) -> bool {
        if !command.stages.is_empty() {
            return command.stages.contains(&stage);
        }
        match self.table.get(&command.name) {
            Some(stages) => stages.contains(&stage),
            None => true,
        }
    }

    /// Indices of the commands valid in `stage`, in registration order.
    pub fn filter(&self, commands: &[CommandMetadata], stage: LifecycleStage) -> Vec<usize> {
        commands
            .iter()
            .enumerate()
            .filter(|(_, c)| self.allows(c, stage))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands() -> Vec<CommandMetadata> {
        vec![
            CommandMetadata::new("new-project", "", ""),
            CommandMetadata::new("plan-phase", "", ""),
            CommandMetadata::new("debug", "", ""),
            CommandMetadata::new("ship", "", "").with_stages(&[LifecycleStage::MilestoneEnd]),
        ]
    }

    #[test]
    fn default_table_restricts_new_project() {
        let filter = LifecycleFilter::new(&LifecycleConfig::default());
        let cmds = commands();
        assert_eq!(filter.filter(&cmds, LifecycleStage::Uninitialized), vec![0, 2]);
        assert_eq!(filter.filter(&cmds, LifecycleStage::Executing), vec![1, 2]);
        assert_eq!(filter.filter(&cmds, LifecycleStage::MilestoneEnd), vec![2, 3]);
    }

    #[test]
    fn unrestricted_allows_everything_without_declared_stages() {
        let filter = LifecycleFilter::new(&LifecycleConfig::unrestricted());
        let cmds = commands();
        assert_eq!(filter.filter(&cmds, LifecycleStage::Planning), vec![0, 1, 2]);
    }

    #[test]
    fn declared_stages_override_table() {
        let mut config = LifecycleConfig::unrestricted();
        config
            .restrictions
            .insert("debug".to_string(), vec!["planning".to_string()]);
        let filter = LifecycleFilter::new(&config);
        let debug = CommandMetadata::new("debug", "", "").with_stages(&[LifecycleStage::Executing]);
        assert!(filter.allows(&debug, LifecycleStage::Executing));
        assert!(!filter.allows(&debug, LifecycleStage::Planning));
    }
}
