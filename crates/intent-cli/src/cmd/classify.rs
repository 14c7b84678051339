use super::{block_on, build_classifier, discover, load_config};
use crate::output::{fmt_score, print_json};
use anyhow::Context;
use intent_core::state::ProjectState;
use intent_core::types::LifecycleStage;
use intent_core::ClassificationResult;
use std::path::Path;

pub fn run(
    root: &Path,
    input: &str,
    stage: Option<&str>,
    no_semantic: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let mut state = ProjectState::load(root).context("failed to load project state")?;
    if let Some(stage) = stage {
        state.stage = stage
            .parse::<LifecycleStage>()
            .with_context(|| format!("invalid --stage '{stage}'"))?;
    }
    let discovery = discover(root)?;
    let (classifier, embedding) = build_classifier(root, config, &discovery, !no_semantic);

    let result = block_on(async {
        let result = classifier.classify(input, &state).await;
        if let Some(service) = embedding {
            service.save_cache();
        }
        result
    })?;

    if json {
        print_json(&result)?;
    } else {
        print_human(&result);
    }
    Ok(())
}

fn print_human(r: &ClassificationResult) {
    println!("type:        {}", r.result_type);
    match &r.command {
        Some(cmd) => println!("command:     {}", cmd.name),
        None => println!("command:     -"),
    }
    match r.method {
        Some(method) => println!("confidence:  {} ({method})", fmt_score(r.confidence)),
        None => println!("confidence:  {}", fmt_score(r.confidence)),
    }
    if let Some(stage) = r.lifecycle_stage {
        println!("stage:       {stage}");
    }
    if let Some(phase) = &r.arguments.phase_number {
        println!("phase:       {phase}");
    }
    if !r.arguments.flags.is_empty() {
        println!("flags:       {}", r.arguments.flags.join(" "));
    }
    if !r.alternatives.is_empty() {
        println!("alternatives:");
        for alt in &r.alternatives {
            println!("  {:<24} {}", alt.command.name, fmt_score(alt.confidence));
        }
    }
}
