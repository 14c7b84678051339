//! The intent classifier: composes the pipeline stages behind one
//! `classify(input, state)` call.
//!
//! ```text
//! input ─► exact match ──hit──────────────────────────────► exact-match
//!            │ miss
//!            ▼
//!          lifecycle filter ─► bayes ─► resolver ──clears──► classified | ambiguous
//!                                         │ below threshold
//!                                         ▼
//!                                       semantic ─► resolver ──clears──► classified | ambiguous
//!                                                     │ below semantic threshold
//!                                                     ▼
//!                                                   no-match
//! ```
//!
//! Arguments are extracted from the raw input for every outcome.

use crate::arguments::{self, Arguments};
use crate::audit::{self, AuditRecord, AuditSink};
use crate::bayes::{BayesClassifier, Score};
use crate::command::{CommandMetadata, DiscoveryResult};
use crate::config::Config;
use crate::embedding::{EmbeddingCache, EmbeddingService, HEURISTIC_MODEL_ID};
use crate::exact::ExactMatcher;
use crate::lifecycle::LifecycleFilter;
use crate::resolve::{Resolution, Resolver};
use crate::semantic::{EmbeddingMatcher, SemanticMatcher};
use crate::state::ProjectState;
use crate::types::{LifecycleStage, MatchMethod, ResultType};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub command: CommandMetadata,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "type")]
    pub result_type: ResultType,
    pub command: Option<CommandMetadata>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<MatchMethod>,
    pub arguments: Arguments,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    pub lifecycle_stage: Option<LifecycleStage>,
}

impl ClassificationResult {
    pub fn no_match(arguments: Arguments, stage: Option<LifecycleStage>) -> Self {
        Self {
            result_type: ResultType::NoMatch,
            command: None,
            confidence: 0.0,
            method: None,
            arguments,
            alternatives: Vec::new(),
            lifecycle_stage: stage,
        }
    }
}

// ---------------------------------------------------------------------------
// Initialization options
// ---------------------------------------------------------------------------

/// Collaborators handed to [`IntentClassifier::initialize`].
pub struct InitOptions {
    /// When false no semantic matcher is built and the embedding service is
    /// never touched. Combined with `classifier.enable_semantic` from config.
    pub enable_semantic: bool,
    /// Use this matcher instead of one built over `embedding`.
    pub matcher: Option<Arc<dyn SemanticMatcher>>,
    /// Embedding service for the default matcher. Without one, a
    /// heuristic-only service with an in-memory cache is created.
    pub embedding: Option<Arc<EmbeddingService>>,
    pub audit: Option<Arc<dyn AuditSink>>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            enable_semantic: true,
            matcher: None,
            embedding: None,
            audit: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Re-entrancy guard
// ---------------------------------------------------------------------------

/// Holds the "classifying" flag for the duration of one call.
struct ClassifyGuard<'a>(&'a AtomicBool);

impl<'a> ClassifyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ClassifyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct IntentClassifier {
    config: Config,
    commands: Vec<CommandMetadata>,
    exact: ExactMatcher,
    lifecycle: LifecycleFilter,
    bayes: BayesClassifier,
    resolver: Resolver,
    semantic: Option<Arc<dyn SemanticMatcher>>,
    audit: Option<Arc<dyn AuditSink>>,
    classifying: AtomicBool,
}

impl IntentClassifier {
    pub fn new(config: Config) -> Self {
        Self {
            exact: ExactMatcher::new(&config.exact),
            lifecycle: LifecycleFilter::new(&config.lifecycle),
            bayes: BayesClassifier::train(&[], config.classifier.smoothing),
            resolver: Resolver::new(&config.classifier),
            commands: Vec::new(),
            semantic: None,
            audit: None,
            classifying: AtomicBool::new(false),
            config,
        }
    }

    pub fn commands(&self) -> &[CommandMetadata] {
        &self.commands
    }

    pub fn semantic_enabled(&self) -> bool {
        self.semantic.is_some()
    }

    /// Register the discovered commands and build the scoring stages.
    /// Calling it again replaces the previous registry. No model is loaded
    /// here; see [`IntentClassifier::warm`].
    pub fn initialize(&mut self, discovery: &DiscoveryResult, options: InitOptions) {
        self.commands = discovery.commands.clone();
        self.bayes = BayesClassifier::train(&self.commands, self.config.classifier.smoothing);
        self.audit = options.audit;

        let enabled = options.enable_semantic && self.config.classifier.enable_semantic;
        self.semantic = if !enabled {
            None
        } else if let Some(matcher) = options.matcher {
            Some(matcher)
        } else {
            let service = options.embedding.unwrap_or_else(|| {
                Arc::new(EmbeddingService::heuristic(
                    self.config.embedding.dimensions,
                    EmbeddingCache::in_memory(HEURISTIC_MODEL_ID),
                ))
            });
            let names: Vec<&str> = self.commands.iter().map(|c| c.name.as_str()).collect();
            let pruned = service.prune_cache(&names);
            if pruned > 0 {
                tracing::debug!(pruned, "dropped cached embeddings for removed commands");
            }
            Some(Arc::new(EmbeddingMatcher::new(service)) as Arc<dyn SemanticMatcher>)
        };

        tracing::debug!(
            commands = self.commands.len(),
            vocabulary = self.bayes.vocabulary_size(),
            semantic = self.semantic.is_some(),
            source = %discovery.source.display(),
            "intent classifier initialized"
        );
    }

    /// Precompute command embeddings for the semantic matcher, if any.
    pub async fn warm(&self) {
        if let Some(matcher) = &self.semantic {
            matcher.warm(&self.commands).await;
        }
    }

    /// Classify `input` for the project in `state`. Never fails: the worst
    /// outcome is `no-match` with confidence 0.
    pub async fn classify(&self, input: &str, state: &ProjectState) -> ClassificationResult {
        let Some(_guard) = ClassifyGuard::acquire(&self.classifying) else {
            tracing::warn!("classify called while another classification is in flight");
            let result = ClassificationResult::no_match(arguments::extract(input), None);
            self.emit(input, &result);
            return result;
        };

        let result = self.run_pipeline(input, state.stage).await;
        self.emit(input, &result);
        result
    }

    async fn run_pipeline(&self, input: &str, stage: LifecycleStage) -> ClassificationResult {
        let arguments = arguments::extract(input);
        if input.trim().is_empty() {
            return ClassificationResult::no_match(arguments, Some(stage));
        }

        if let Some(hit) = self.exact.find(input, &self.commands) {
            return ClassificationResult {
                result_type: ResultType::ExactMatch,
                command: Some(self.commands[hit.index].clone()),
                confidence: 1.0,
                method: Some(MatchMethod::Exact),
                arguments,
                alternatives: Vec::new(),
                lifecycle_stage: Some(stage),
            };
        }

        let candidates = self.lifecycle.filter(&self.commands, stage);
        let classifier = &self.config.classifier;

        let ranked = self.bayes.score(input, &candidates);
        let bayes = self.resolver.resolve(&ranked, classifier.confidence_threshold);
        if !matches!(bayes, Resolution::BelowThreshold) {
            return self.build(bayes, MatchMethod::Bayes, arguments, stage);
        }

        if let Some(matcher) = &self.semantic {
            let ranked: Vec<Score> = matcher
                .rank(input, &self.commands, &candidates)
                .await
                .into_iter()
                .map(|m| Score {
                    index: m.index,
                    confidence: m.similarity,
                })
                .collect();
            let semantic = self.resolver.resolve(&ranked, classifier.semantic_threshold);
            if !matches!(semantic, Resolution::BelowThreshold) {
                return self.build(semantic, MatchMethod::Semantic, arguments, stage);
            }
        }

        ClassificationResult::no_match(arguments, Some(stage))
    }

    fn build(
        &self,
        resolution: Resolution,
        method: MatchMethod,
        arguments: Arguments,
        stage: LifecycleStage,
    ) -> ClassificationResult {
        let (result_type, best, alternatives) = match resolution {
            Resolution::Classified { best, runner_ups } => {
                (ResultType::Classified, best, runner_ups)
            }
            Resolution::Ambiguous { best, choices } => (ResultType::Ambiguous, best, choices),
            Resolution::BelowThreshold => {
                return ClassificationResult::no_match(arguments, Some(stage))
            }
        };
        let alternatives = alternatives
            .iter()
            .filter_map(|s| {
                self.commands.get(s.index).map(|c| Alternative {
                    command: c.clone(),
                    confidence: s.confidence.clamp(0.0, 1.0),
                })
            })
            .collect();
        ClassificationResult {
            result_type,
            command: self.commands.get(best.index).cloned(),
            confidence: best.confidence.clamp(0.0, 1.0),
            method: Some(method),
            arguments,
            alternatives,
            lifecycle_stage: Some(stage),
        }
    }

    fn emit(&self, input: &str, result: &ClassificationResult) {
        let record = AuditRecord::from_result(input, result);
        audit::trace_record(&record);
        if let Some(sink) = &self.audit {
            sink.record(&record);
        }
    }
}
