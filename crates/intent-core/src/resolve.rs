//! Confidence resolution: turns a ranked score list into a decision.

use crate::bayes::Score;
use crate::config::ClassifierConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Best clears the threshold and leads the runner-up by at least the gap.
    Classified {
        best: Score,
        /// Runner-ups with non-zero confidence, capped at `max_alternatives`.
        runner_ups: Vec<Score>,
    },
    /// Best clears the threshold but the runner-up is within the gap.
    Ambiguous {
        best: Score,
        /// Top candidates including `best`, capped at `max_alternatives`.
        choices: Vec<Score>,
    },
    /// Nothing clears the threshold (or there were no candidates).
    BelowThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolver {
    ambiguity_gap: f64,
    max_alternatives: usize,
}

impl Resolver {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            ambiguity_gap: config.ambiguity_gap,
            max_alternatives: config.max_alternatives,
        }
    }

    /// Resolve `ranked` (sorted by confidence descending) against `threshold`.
    /// Non-finite scores are ignored.
    pub fn resolve(&self, ranked: &[Score], threshold: f64) -> Resolution {
        let ranked: Vec<Score> = ranked
            .iter()
            .copied()
            .filter(|s| s.confidence.is_finite())
            .collect();
        let Some(&best) = ranked.first() else {
            return Resolution::BelowThreshold;
        };
        if !(best.confidence > 0.0 && best.confidence >= threshold) {
            return Resolution::BelowThreshold;
        }
        let second = ranked.get(1).map(|s| s.confidence).unwrap_or(0.0);
        if best.confidence - second >= self.ambiguity_gap {
            let runner_ups = ranked[1..]
                .iter()
                .filter(|s| s.confidence > 0.0)
                .take(self.max_alternatives)
                .copied()
                .collect();
            Resolution::Classified { best, runner_ups }
        } else {
            let choices = ranked
                .iter()
                .filter(|s| s.confidence > 0.0)
                .take(self.max_alternatives)
                .copied()
                .collect();
            Resolution::Ambiguous { best, choices }
        }
    }
}
