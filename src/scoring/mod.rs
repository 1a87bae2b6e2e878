//! Transcript scoring
//!
//! A transcript is first rewritten by the [`DialectNormalizer`] and then
//! compared against a card's accepted phrases by the [`UtteranceScorer`].

pub mod dialect;
pub mod fuzzy;
pub mod normalizer;
pub mod scorer;

pub use dialect::Dialect;
pub use normalizer::{DialectNormalizer, NormalizationTable};
pub use scorer::{EvaluationVerdict, ScoringConfig, Tier, UtteranceScorer};

/// Normalization and scoring bundled behind one immutable value
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    normalizer: DialectNormalizer,
    scorer: UtteranceScorer,
}

impl Evaluator {
    pub fn new(table: NormalizationTable, config: ScoringConfig) -> Self {
        Self {
            normalizer: DialectNormalizer::new(table),
            scorer: UtteranceScorer::new(config),
        }
    }

    pub fn normalize(&self, text: &str, dialect: Dialect) -> String {
        self.normalizer.normalize(text, dialect)
    }

    pub fn evaluate(&self, text: &str, dialect: Dialect, candidates: &[String]) -> EvaluationVerdict {
        let normalized = self.normalizer.normalize(text, dialect);
        self.scorer.evaluate(&normalized, candidates)
    }
}
