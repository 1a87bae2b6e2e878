use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fuzzy::partial_ratio;

/// Thresholds separating the verdict tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Minimum score for an OK verdict
    pub ok_threshold: f64,
    /// Minimum score for a PARTIAL verdict
    pub partial_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ok_threshold: 85.0,
            partial_threshold: 70.0,
        }
    }
}

/// Verdict tier, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bad,
    Partial,
    Ok,
}

impl Tier {
    pub fn from_score(score: f64, config: &ScoringConfig) -> Self {
        if score >= config.ok_threshold {
            Tier::Ok
        } else if score >= config.partial_threshold {
            Tier::Partial
        } else {
            Tier::Bad
        }
    }
}

/// Result of scoring one utterance against a card's accepted phrases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationVerdict {
    pub tier: Tier,
    /// Best partial-ratio score, 0–100
    pub score: f64,
    /// Accepted phrase that produced the best score
    pub matched_phrase: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UtteranceScorer {
    config: ScoringConfig,
}

impl UtteranceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a normalized transcript against every candidate phrase.
    ///
    /// The first candidate keeps a tie: a later one must score strictly
    /// higher to replace it. Callers supply at least one candidate; an empty
    /// list yields a BAD verdict with no matched phrase.
    pub fn evaluate(&self, text: &str, candidates: &[String]) -> EvaluationVerdict {
        let base = text.to_lowercase();

        let mut best: Option<(f64, &str)> = None;
        for candidate in candidates {
            let score = partial_ratio(&base, &candidate.to_lowercase());
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, candidate.as_str()));
            }
        }

        let (score, matched) = best.unwrap_or((0.0, ""));
        let tier = Tier::from_score(score, &self.config);

        debug!("Scored '{}' -> {:?} {:.1} ('{}')", text, tier, score, matched);

        EvaluationVerdict {
            tier,
            score,
            matched_phrase: matched.to_string(),
            timestamp: Utc::now(),
        }
    }
}
