use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::ledger::{PlayerProgress, SessionOutcome};
use super::pipeline::{dispatch, UtteranceJob, UtterancePipeline, UtteranceResult};
use super::snapshot::SessionSnapshot;
use crate::audio::AudioCapture;
use crate::error::PracticeError;
use crate::lessons::{default_lessons, LessonCard};
use crate::scoring::{Dialect, Tier};
use crate::transcription::TranscriptionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Recording,
    Transcribing,
    Feedback,
    Complete,
}

/// Lesson progression, or free practice against ad-hoc phrases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PracticeMode {
    Lesson,
    Free { prompt: String, expected: Vec<String> },
}

/// Whether a request changed the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Transition {
    Applied,
    Rejected(&'static str),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

/// Split a comma-separated phrase list, dropping blanks. An empty list
/// becomes a single empty phrase so scoring always has a candidate.
pub fn parse_expected(raw: &str) -> Vec<String> {
    let phrases: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if phrases.is_empty() {
        vec![String::new()]
    } else {
        phrases
    }
}

/// The transcription currently in flight. Its presence is the pending flag.
struct Pending {
    inbox: oneshot::Receiver<UtteranceResult>,
    job: UtteranceJob,
}

/// Turn-based practice state machine.
///
/// Owned by a single task. Capture runs against the device, each finished
/// utterance goes to a background task through [`dispatch`], and the verdict
/// comes back through a one-shot inbox polled by [`tick`](Self::tick). Hearts
/// and the correct count change only when a verdict is applied, once per
/// utterance.
pub struct PracticeSession {
    capture: AudioCapture,
    pipeline: Arc<UtterancePipeline>,
    config: SessionConfig,
    lessons: Vec<LessonCard>,
    index: usize,
    hearts: u8,
    correct: u32,
    dialect: Dialect,
    mode: PracticeMode,
    phase: Phase,
    run_complete: bool,
    pending: Option<Pending>,
    last_result: Option<UtteranceResult>,
    feedback_since: Option<Instant>,
    last_error: Option<String>,
}

impl PracticeSession {
    pub fn new(
        capture: AudioCapture,
        pipeline: Arc<UtterancePipeline>,
        lessons: Vec<LessonCard>,
        config: SessionConfig,
    ) -> Self {
        let mut lessons = if lessons.is_empty() {
            warn!("No lessons supplied, using built-in set");
            default_lessons()
        } else {
            lessons
        };
        if config.shuffle_lessons {
            lessons.shuffle(&mut rand::thread_rng());
        }

        let hearts = config.hearts;
        info!(
            "Practice session ready: {} cards, {} hearts, capture on {}",
            lessons.len(),
            hearts,
            capture.backend_name()
        );

        Self {
            capture,
            pipeline,
            config,
            lessons,
            index: 0,
            hearts,
            correct: 0,
            dialect: Dialect::default(),
            mode: PracticeMode::Lesson,
            phase: Phase::Idle,
            run_complete: false,
            pending: None,
            last_result: None,
            feedback_since: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> &PracticeMode {
        &self.mode
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn hearts(&self) -> u8 {
        self.hearts
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn card_index(&self) -> usize {
        self.index
    }

    pub fn lessons(&self) -> &[LessonCard] {
        &self.lessons
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_result(&self) -> Option<&UtteranceResult> {
        self.last_result.as_ref()
    }

    pub fn prompt(&self) -> &str {
        match &self.mode {
            PracticeMode::Lesson => &self.lessons[self.index].prompt,
            PracticeMode::Free { prompt, .. } => prompt,
        }
    }

    /// Phrases the next utterance will be scored against. Never empty.
    pub fn current_targets(&self) -> Vec<String> {
        let targets = match &self.mode {
            PracticeMode::Lesson => self.lessons[self.index].targets_for(self.dialect).to_vec(),
            PracticeMode::Free { expected, .. } => expected.clone(),
        };

        if targets.is_empty() {
            vec![String::new()]
        } else {
            targets
        }
    }

    /// IDLE -> RECORDING. Rejected unless idle with nothing in flight; a
    /// device failure leaves the session idle and is returned to the caller.
    pub async fn start_capture(&mut self) -> Result<Transition, PracticeError> {
        if self.pending.is_some() {
            debug!("Start capture rejected: transcription in flight");
            return Ok(Transition::Rejected("transcription in flight"));
        }
        if self.phase != Phase::Idle {
            debug!("Start capture rejected in phase {:?}", self.phase);
            return Ok(Transition::Rejected("session is not idle"));
        }

        if let Err(e) = self.capture.start().await {
            warn!("Capture could not start: {}", e);
            self.last_error = Some(e.to_string());
            return Err(e);
        }

        self.last_error = None;
        self.phase = Phase::Recording;
        Ok(Transition::Applied)
    }

    /// RECORDING -> TRANSCRIBING. Targets and dialect are captured here so a
    /// later dialect change does not affect the utterance in flight.
    pub async fn stop_capture(&mut self) -> Transition {
        if self.phase != Phase::Recording {
            debug!("Stop capture rejected in phase {:?}", self.phase);
            return Transition::Rejected("not recording");
        }

        let artifact = match self.capture.stop().await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("Capture produced no waveform: {}", e);
                self.last_error = Some(e.to_string());
                None
            }
        };

        let job = UtteranceJob::new(self.dialect, self.current_targets());
        info!(
            "Dispatching utterance {} ({}, card {})",
            job.id,
            self.dialect,
            self.index + 1
        );

        let inbox = dispatch(Arc::clone(&self.pipeline), artifact, job.clone());
        self.pending = Some(Pending { inbox, job });
        self.phase = Phase::Transcribing;

        Transition::Applied
    }

    pub async fn toggle_capture(&mut self) -> Result<Transition, PracticeError> {
        if self.phase == Phase::Recording {
            Ok(self.stop_capture().await)
        } else {
            self.start_capture().await
        }
    }

    /// Advance time-driven transitions. Returns the outcome of a lesson run
    /// on the tick that completes it, and only then.
    pub async fn tick(&mut self, now: Instant) -> Option<SessionOutcome> {
        match self.phase {
            Phase::Recording if self.capture.is_expired() => {
                info!("Capture ended on its own, stopping");
                self.stop_capture().await;
                None
            }
            Phase::Transcribing => {
                if let Some(result) = self.poll_inbox() {
                    self.apply(result, now);
                }
                None
            }
            Phase::Feedback => {
                let shown_at = self.feedback_since.unwrap_or(now);
                if now.saturating_duration_since(shown_at) >= self.config.feedback_display {
                    self.advance()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn poll_inbox(&mut self) -> Option<UtteranceResult> {
        let pending = self.pending.as_mut()?;

        match pending.inbox.try_recv() {
            Ok(result) => {
                self.pending = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                let pending = self.pending.take()?;
                warn!("Utterance {} task ended without a result", pending.job.id);
                Some(self.pipeline.score(
                    pending.job,
                    TranscriptionOutcome::failed("transcription task ended without a result"),
                ))
            }
        }
    }

    /// TRANSCRIBING -> FEEDBACK, applying the verdict exactly once
    fn apply(&mut self, result: UtteranceResult, now: Instant) {
        if self.mode == PracticeMode::Lesson {
            match result.verdict.tier {
                Tier::Ok => self.correct += 1,
                Tier::Bad => self.hearts = self.hearts.saturating_sub(1),
                Tier::Partial => {}
            }
        }

        info!(
            "Verdict {:?} for '{}' (score {:.1}, hearts {}, correct {})",
            result.verdict.tier,
            result.transcript.text,
            result.verdict.score,
            self.hearts,
            self.correct
        );

        self.last_result = Some(result);
        self.feedback_since = Some(now);
        self.phase = Phase::Feedback;
    }

    /// FEEDBACK -> IDLE or COMPLETE
    fn advance(&mut self) -> Option<SessionOutcome> {
        self.feedback_since = None;

        if self.mode != PracticeMode::Lesson {
            self.phase = Phase::Idle;
            return None;
        }

        if self.hearts == 0 || self.index + 1 >= self.lessons.len() {
            self.phase = Phase::Complete;
            self.run_complete = true;
            let outcome = self.outcome();
            info!(
                "Lesson run complete: {}/{} correct, {} hearts left",
                outcome.correct, outcome.total_cards, outcome.hearts_remaining
            );
            return Some(outcome);
        }

        self.index += 1;
        self.phase = Phase::Idle;
        None
    }

    pub fn outcome(&self) -> SessionOutcome {
        SessionOutcome {
            correct: self.correct,
            hearts_remaining: self.hearts,
            starting_hearts: self.config.hearts,
            total_cards: self.lessons.len(),
            cards_answered: self.index + 1,
        }
    }

    /// Applies to the next dispatched utterance
    pub fn set_dialect(&mut self, dialect: Dialect) -> Transition {
        if self.dialect != dialect {
            info!("Dialect changed: {} -> {} ({})", self.dialect, dialect, dialect.label());
            self.dialect = dialect;
        }
        Transition::Applied
    }

    fn is_settled(&self) -> bool {
        self.pending.is_none() && matches!(self.phase, Phase::Idle | Phase::Complete)
    }

    pub fn enter_free_speak(&mut self, prompt: impl Into<String>, expected: Vec<String>) -> Transition {
        if !self.is_settled() {
            return Transition::Rejected("session is busy");
        }

        let expected: Vec<String> = expected
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let expected = if expected.is_empty() {
            vec![String::new()]
        } else {
            expected
        };

        let prompt = prompt.into();
        info!("Free speak: '{}' ({} phrases)", prompt, expected.len());

        self.mode = PracticeMode::Free { prompt, expected };
        self.phase = Phase::Idle;
        self.last_result = None;
        Transition::Applied
    }

    pub fn back_to_lessons(&mut self) -> Transition {
        if !self.is_settled() {
            return Transition::Rejected("session is busy");
        }
        if self.mode == PracticeMode::Lesson {
            return Transition::Rejected("already in lessons");
        }

        self.mode = PracticeMode::Lesson;
        self.phase = if self.run_complete {
            Phase::Complete
        } else {
            Phase::Idle
        };
        self.last_result = None;
        Transition::Applied
    }

    /// Start the lesson run over from the first card
    pub fn restart(&mut self) -> Transition {
        if !self.is_settled() {
            return Transition::Rejected("session is busy");
        }

        if self.config.shuffle_lessons {
            self.lessons.shuffle(&mut rand::thread_rng());
        }
        self.index = 0;
        self.hearts = self.config.hearts;
        self.correct = 0;
        self.mode = PracticeMode::Lesson;
        self.phase = Phase::Idle;
        self.run_complete = false;
        self.last_result = None;
        self.last_error = None;

        info!("Lesson run restarted");
        Transition::Applied
    }

    pub fn snapshot(&self, progress: PlayerProgress) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            mode: self.mode.clone(),
            dialect: self.dialect,
            prompt: self.prompt().to_string(),
            targets: self.current_targets(),
            card_index: self.index,
            total_cards: self.lessons.len(),
            hearts: self.hearts,
            starting_hearts: self.config.hearts,
            correct: self.correct,
            recording: self.capture.is_active(),
            pending: self.pending.is_some(),
            last_result: self.last_result.clone(),
            last_error: self.last_error.clone(),
            progress,
        }
    }
}
