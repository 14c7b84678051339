pub mod cache;
pub mod classify;
pub mod commands;
pub mod config;

use anyhow::Context;
use intent_core::audit::{AuditSink, JsonlAuditLog};
use intent_core::command::{discover_commands, DiscoveryResult};
use intent_core::config::Config;
use intent_core::embedding::EmbeddingService;
use intent_core::{paths, InitOptions, IntentClassifier};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Drive `fut` to completion on a fresh runtime. `main` stays synchronous.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    Ok(rt.block_on(fut))
}

pub fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load config")
}

pub fn discover(root: &Path) -> anyhow::Result<DiscoveryResult> {
    let dir = paths::commands_dir(root);
    discover_commands(&dir).with_context(|| format!("failed to read {}", dir.display()))
}

/// A classifier over the project's commands. The embedding service is
/// returned alongside so the caller can persist its cache.
pub fn build_classifier(
    root: &Path,
    config: Config,
    discovery: &DiscoveryResult,
    enable_semantic: bool,
) -> (IntentClassifier, Option<Arc<EmbeddingService>>) {
    let embedding = (enable_semantic && config.classifier.enable_semantic)
        .then(|| Arc::new(EmbeddingService::from_config(root, &config.embedding)));
    let audit = config.audit.enabled.then(|| {
        Arc::new(JsonlAuditLog::new(paths::resolve(root, &config.audit.file))) as Arc<dyn AuditSink>
    });

    let mut classifier = IntentClassifier::new(config);
    classifier.initialize(
        discovery,
        InitOptions {
            enable_semantic,
            matcher: None,
            embedding: embedding.clone(),
            audit,
        },
    );
    if classifier.commands().is_empty() {
        tracing::warn!(dir = %discovery.source.display(), "no commands discovered");
    }
    (classifier, embedding)
}
