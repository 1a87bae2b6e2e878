use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::oracle::SpeechOracle;
use crate::audio::WaveformArtifact;
use crate::error::PracticeError;

/// Text produced for one waveform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionOutcome {
    /// Transcript with every whitespace character removed; empty on failure
    pub text: String,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

impl TranscriptionOutcome {
    /// Thai does not separate words with spaces, so any whitespace the model
    /// emits is noise and is dropped entirely
    pub fn success(raw: &str) -> Self {
        Self {
            text: raw.chars().filter(|c| !c.is_whitespace()).collect(),
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Wraps a [`SpeechOracle`] so failures come back as empty outcomes
#[derive(Clone)]
pub struct TranscriptionService {
    oracle: Arc<dyn SpeechOracle>,
}

impl TranscriptionService {
    pub fn new(oracle: Arc<dyn SpeechOracle>) -> Self {
        Self { oracle }
    }

    /// Transcribe an artifact. Never fails: model or audio errors yield
    /// `succeeded = false` with empty text.
    pub async fn transcribe(&self, artifact: &WaveformArtifact) -> TranscriptionOutcome {
        let started = Instant::now();

        match self.oracle.recognize(artifact.path()).await {
            Ok(raw) => {
                let outcome = TranscriptionOutcome::success(&raw);
                info!(
                    "Transcribed {:.2}s utterance via {} in {:.2}s: '{}'",
                    artifact.duration_seconds(),
                    self.oracle.name(),
                    started.elapsed().as_secs_f64(),
                    outcome.text
                );
                outcome
            }
            Err(e) => {
                let error = PracticeError::TranscriptionFailure(format!("{:#}", e));
                warn!("{}", error);
                TranscriptionOutcome::failed(error.to_string())
            }
        }
    }
}
