use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::audio::WaveformArtifact;
use crate::scoring::{Dialect, EvaluationVerdict, Evaluator};
use crate::transcription::{TranscriptionOutcome, TranscriptionService};

/// What an utterance is scored against, fixed when it is dispatched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtteranceJob {
    pub id: uuid::Uuid,
    pub dialect: Dialect,
    pub targets: Vec<String>,
}

impl UtteranceJob {
    pub fn new(dialect: Dialect, targets: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            dialect,
            targets,
        }
    }
}

/// Transcript and verdict for one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceResult {
    pub job: UtteranceJob,
    pub transcript: TranscriptionOutcome,
    /// Transcript after dialect normalization
    pub normalized: String,
    pub verdict: EvaluationVerdict,
}

/// Transcribe, normalize and score: the background half of a turn
pub struct UtterancePipeline {
    transcription: TranscriptionService,
    evaluator: Arc<Evaluator>,
}

impl UtterancePipeline {
    pub fn new(transcription: TranscriptionService, evaluator: Arc<Evaluator>) -> Self {
        Self {
            transcription,
            evaluator,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Score an already known transcript for `job`
    pub fn score(&self, job: UtteranceJob, transcript: TranscriptionOutcome) -> UtteranceResult {
        let normalized = self.evaluator.normalize(&transcript.text, job.dialect);
        let verdict = self.evaluator.evaluate(&transcript.text, job.dialect, &job.targets);

        UtteranceResult {
            job,
            transcript,
            normalized,
            verdict,
        }
    }

    /// Run one utterance to completion. The artifact is always discarded,
    /// whatever the oracle does.
    pub async fn run(&self, artifact: Option<WaveformArtifact>, job: UtteranceJob) -> UtteranceResult {
        let transcript = match &artifact {
            Some(artifact) => AssertUnwindSafe(self.transcription.transcribe(artifact))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    warn!("Speech oracle panicked on utterance {}", job.id);
                    TranscriptionOutcome::failed("speech oracle panicked")
                }),
            None => TranscriptionOutcome::failed("no waveform captured"),
        };

        if let Some(artifact) = artifact {
            artifact.discard();
        }

        let result = self.score(job, transcript);
        info!(
            "Utterance {} scored {:?} ({:.1}) against {} phrases",
            result.job.id,
            result.verdict.tier,
            result.verdict.score,
            result.job.targets.len()
        );
        result
    }
}

/// Spawn the background unit of work for one utterance.
///
/// The returned receiver is the single-slot inbox the session polls; it
/// receives exactly one result unless the task itself is torn down.
pub fn dispatch(
    pipeline: Arc<UtterancePipeline>,
    artifact: Option<WaveformArtifact>,
    job: UtteranceJob,
) -> oneshot::Receiver<UtteranceResult> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let id = job.id;
        let result = pipeline.run(artifact, job).await;
        if tx.send(result).is_err() {
            warn!("Session dropped before utterance {} was delivered", id);
        }
    });

    rx
}
