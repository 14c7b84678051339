use super::{discover, load_config};
use crate::output::{print_json, print_table};
use intent_core::command::CommandMetadata;
use intent_core::config::Config;
use intent_core::types::LifecycleStage;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CommandRow<'a> {
    name: &'a str,
    description: &'a str,
    /// `None` means valid in every stage.
    stages: Option<Vec<LifecycleStage>>,
    argument_hint: Option<&'a str>,
    source: String,
}

fn effective_stages(config: &Config, cmd: &CommandMetadata) -> Option<Vec<LifecycleStage>> {
    if !cmd.stages.is_empty() {
        return Some(cmd.stages.clone());
    }
    config.lifecycle.stages_for(&cmd.name)
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let discovery = discover(root)?;

    let rows: Vec<CommandRow> = discovery
        .commands
        .iter()
        .map(|c| CommandRow {
            name: &c.name,
            description: &c.description,
            stages: effective_stages(&config, c),
            argument_hint: c.argument_hint.as_deref(),
            source: c.source.display().to_string(),
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No commands found in {}.", discovery.source.display());
        return Ok(());
    }
    print_table(
        &["NAME", "STAGES", "DESCRIPTION"],
        rows.iter()
            .map(|r| {
                let stages = match &r.stages {
                    Some(s) => s.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(","),
                    None => "any".to_string(),
                };
                vec![r.name.to_string(), stages, r.description.to_string()]
            })
            .collect(),
    );
    Ok(())
}
