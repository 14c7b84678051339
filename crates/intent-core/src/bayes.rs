//! Multinomial Naive Bayes scorer.
//!
//! Each command is one class whose training document is its descriptor text
//! (name words, description, objective). Priors are uniform, so a candidate's
//! score is the sum of `ln P(token | command)` over the input's in-vocabulary
//! tokens, with additive smoothing. Scores are turned into confidences with a
//! softmax over the candidate set, which makes the best confidence directly
//! comparable with a fixed threshold.

use crate::command::CommandMetadata;
use crate::text::tokenize;
use std::collections::{HashMap, HashSet};

/// A candidate's confidence. `index` is the command's registration index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub index: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default)]
struct TermCounts {
    counts: HashMap<String, u32>,
    total: u32,
}

#[derive(Debug, Clone)]
pub struct BayesClassifier {
    smoothing: f64,
    docs: Vec<TermCounts>,
    vocabulary: HashSet<String>,
}

impl BayesClassifier {
    pub fn train(commands: &[CommandMetadata], smoothing: f64) -> Self {
        let mut vocabulary = HashSet::new();
        let docs = commands
            .iter()
            .map(|cmd| {
                let mut doc = TermCounts::default();
                for tok in tokenize(&cmd.descriptor_text()) {
                    vocabulary.insert(tok.clone());
                    *doc.counts.entry(tok).or_default() += 1;
                    doc.total += 1;
                }
                doc
            })
            .collect();
        Self {
            smoothing,
            docs,
            vocabulary,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Score `input` against the commands at `candidates`.
    ///
    /// Returns one score per candidate, sorted by confidence descending with
    /// ties kept in candidate order. When no input token occurs in any
    /// candidate's document, every confidence is 0.
    pub fn score(&self, input: &str, candidates: &[usize]) -> Vec<Score> {
        let tokens: Vec<String> = tokenize(input)
            .into_iter()
            .filter(|t| self.vocabulary.contains(t))
            .collect();

        let evidence = tokens.iter().any(|t| {
            candidates
                .iter()
                .filter_map(|&i| self.docs.get(i))
                .any(|d| d.counts.contains_key(t))
        });
        if !evidence {
            return candidates
                .iter()
                .map(|&index| Score {
                    index,
                    confidence: 0.0,
                })
                .collect();
        }

        let vocab = self.vocabulary.len() as f64;
        let log_scores: Vec<f64> = candidates
            .iter()
            .map(|&i| {
                let Some(doc) = self.docs.get(i) else {
                    return f64::NEG_INFINITY;
                };
                let denom = doc.total as f64 + self.smoothing * vocab;
                tokens
                    .iter()
                    .map(|t| {
                        let count = doc.counts.get(t).copied().unwrap_or(0) as f64;
                        ((count + self.smoothing) / denom).ln()
                    })
                    .sum()
            })
            .collect();

        let confidences = softmax(&log_scores);
        let mut scores: Vec<Score> = candidates
            .iter()
            .zip(confidences)
            .map(|(&index, confidence)| Score { index, confidence })
            .collect();
        scores.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scores
    }
}

fn softmax(log_scores: &[f64]) -> Vec<f64> {
    let max = log_scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![0.0; log_scores.len()];
    }
    let exps: Vec<f64> = log_scores
        .iter()
        .map(|s| if s.is_finite() { (s - max).exp() } else { 0.0 })
        .collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands() -> Vec<CommandMetadata> {
        vec![
            CommandMetadata::new(
                "plan-phase",
                "Create detailed execution plan for a phase",
                "Plan the next phase of the roadmap: research, break work into tasks and write PLAN.md files for the phase.",
            ),
            CommandMetadata::new(
                "execute-phase",
                "Execute all plans in a phase",
                "Run the plans of a phase with wave-based parallel execution and verify the results.",
            ),
            CommandMetadata::new(
                "debug",
                "Systematic debugging with persistent state",
                "Investigate a bug or failure, form hypotheses and track the debugging session.",
            ),
        ]
    }

    #[test]
    fn best_candidate_ranks_first() {
        let bayes = BayesClassifier::train(&commands(), 1.0);
        let scores = bayes.score("plan the next phase", &[0, 1, 2]);
        assert_eq!(scores[0].index, 0);
        assert!(scores[0].confidence > 0.5, "{scores:?}");
        let total: f64 = scores.iter().map(|s| s.confidence).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_deterministic() {
        let bayes = BayesClassifier::train(&commands(), 1.0);
        let a = bayes.score("debug this failure", &[0, 1, 2]);
        let b = bayes.score("debug this failure", &[0, 1, 2]);
        assert_eq!(a, b);
        assert_eq!(a[0].index, 2);
    }

    #[test]
    fn unknown_words_score_zero() {
        let bayes = BayesClassifier::train(&commands(), 1.0);
        let scores = bayes.score("xylophone quartz", &[0, 1, 2]);
        assert!(scores.iter().all(|s| s.confidence == 0.0));
        assert_eq!(
            scores.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn evidence_is_judged_against_candidates_only() {
        let bayes = BayesClassifier::train(&commands(), 1.0);
        // "debug" is in the vocabulary but not among the candidates.
        let scores = bayes.score("debug", &[0, 1]);
        assert!(scores.iter().all(|s| s.confidence == 0.0));
    }

    #[test]
    fn equal_scores_keep_candidate_order() {
        let cmds = vec![
            CommandMetadata::new("alpha", "shared words", ""),
            CommandMetadata::new("beta", "shared words", ""),
        ];
        // Identical documents apart from the name token.
        let bayes = BayesClassifier::train(&cmds, 1.0);
        let scores = bayes.score("shared", &[1, 0]);
        assert_eq!(scores[0].index, 1);
        assert!((scores[0].confidence - scores[1].confidence).abs() < 1e-12);
    }

    #[test]
    fn empty_candidate_set_scores_nothing() {
        let bayes = BayesClassifier::train(&commands(), 1.0);
        assert!(bayes.score("plan", &[]).is_empty());
    }
}
