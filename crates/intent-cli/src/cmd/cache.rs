use super::{block_on, build_classifier, discover, load_config};
use crate::output::print_json;
use clap::Subcommand;
use intent_core::embedding::{CacheStats, EmbeddingService};
use std::path::Path;

#[derive(Subcommand)]
pub enum CacheSubcommand {
    /// Show entry counts for the embedding cache
    Stats,

    /// Remove every cached embedding
    Clear,

    /// Embed every discovered command and save the cache
    Warm,
}

pub fn run(root: &Path, subcmd: CacheSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CacheSubcommand::Stats => stats(root, json),
        CacheSubcommand::Clear => clear(root, json),
        CacheSubcommand::Warm => warm(root, json),
    }
}

fn print_stats(stats: &CacheStats, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(stats);
    }
    if let Some(path) = &stats.path {
        println!("file:     {}", path.display());
    }
    println!("model:    {}", stats.model_version);
    println!("entries:  {} ({} current)", stats.entries, stats.current);
    Ok(())
}

fn stats(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let service = EmbeddingService::from_config(root, &config.embedding);
    print_stats(&service.cache_stats(), json)
}

fn clear(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let service = EmbeddingService::from_config(root, &config.embedding);
    let removed = service.cache_stats().entries;
    service.clear_cache();
    service.save_cache();
    if json {
        print_json(&serde_json::json!({ "removed": removed }))
    } else {
        println!("Removed {removed} cached embedding(s).");
        Ok(())
    }
}

fn warm(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    if !config.classifier.enable_semantic {
        anyhow::bail!("semantic matching is disabled in config (classifier.enable_semantic)");
    }
    let discovery = discover(root)?;
    let (classifier, embedding) = build_classifier(root, config, &discovery, true);
    let stats = block_on(async {
        classifier.warm().await;
        embedding.map(|service| {
            service.save_cache();
            service.cache_stats()
        })
    })?;
    match stats {
        Some(stats) => print_stats(&stats, json),
        None => anyhow::bail!("no embedding service available"),
    }
}
