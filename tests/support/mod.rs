// Shared fakes for the integration tests: a scripted audio device and a
// scripted speech oracle.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use dialect_coach::audio::{AudioBackend, AudioCapture, AudioFrame, CaptureConfig};
use dialect_coach::lessons::LessonCard;
use dialect_coach::scoring::Evaluator;
use dialect_coach::session::{
    Phase, PracticeSession, SessionConfig, SessionOutcome, UtterancePipeline,
};
use dialect_coach::transcription::{SpeechOracle, TranscriptionService};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;

/// Audio device that delivers a fixed set of frames on every start and then
/// keeps the stream open until stopped
pub struct ScriptedBackend {
    frames: Vec<Vec<i16>>,
    fail_open: bool,
    sender: Option<mpsc::Sender<AudioFrame>>,
    pub starts: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new(frames: Vec<Vec<i16>>) -> Self {
        Self {
            frames,
            fail_open: false,
            sender: None,
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::silent()
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.fail_open {
            return Err(anyhow!("No default input device found"));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(self.frames.len().max(1));
        for (i, samples) in self.frames.iter().enumerate() {
            tx.send(AudioFrame {
                samples: samples.clone(),
                sample_rate: 16000,
                channels: 1,
                timestamp_ms: i as u64 * 64,
            })
            .await?;
        }
        self.sender = Some(tx);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.sender = None;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.sender.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Speech oracle replying from a script. An `Err` entry is a model failure;
/// an exhausted script fails too.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, String>>>,
    gate: Option<Arc<Semaphore>>,
    pub seen: Mutex<Vec<PathBuf>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            gate: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn saying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(*t)).collect())
    }

    /// Hold every reply until a permit is added to the returned semaphore
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SpeechOracle for ScriptedOracle {
    async fn recognize(&self, path: &Path) -> Result<String> {
        assert!(path.exists(), "artifact must exist while transcribing");
        self.seen.lock().unwrap().push(path.to_path_buf());

        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub const FEEDBACK: Duration = Duration::from_millis(100);

pub fn capture_config(dir: &Path, max_duration: Duration) -> CaptureConfig {
    CaptureConfig {
        sample_rate: 16000,
        channels: 1,
        max_duration,
        artifact_dir: dir.to_path_buf(),
    }
}

pub fn session_with(
    backend: ScriptedBackend,
    oracle: Arc<ScriptedOracle>,
    lessons: Vec<LessonCard>,
    dir: &Path,
) -> PracticeSession {
    session_with_config(backend, oracle, lessons, dir, practice_config())
}

pub fn practice_config() -> SessionConfig {
    SessionConfig {
        hearts: 3,
        feedback_display: FEEDBACK,
        ..SessionConfig::default()
    }
}

pub fn session_with_config(
    backend: ScriptedBackend,
    oracle: Arc<ScriptedOracle>,
    lessons: Vec<LessonCard>,
    dir: &Path,
    config: SessionConfig,
) -> PracticeSession {
    let capture = AudioCapture::new(Box::new(backend), capture_config(dir, Duration::from_secs(4)));
    let pipeline = Arc::new(UtterancePipeline::new(
        TranscriptionService::new(oracle),
        Arc::new(Evaluator::default()),
    ));

    PracticeSession::new(capture, pipeline, lessons, config)
}

/// Tick the session until `done` holds, returning any run outcome produced
/// on the way
pub async fn drive_until(
    session: &mut PracticeSession,
    done: impl Fn(&PracticeSession) -> bool,
) -> Option<SessionOutcome> {
    let mut outcome = None;
    for _ in 0..2000 {
        if let Some(o) = session.tick(Instant::now()).await {
            outcome = Some(o);
        }
        if done(session) {
            return outcome;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session stuck in {:?}", session.phase());
}

/// Record, transcribe, show feedback and move on: one full turn
pub async fn play_turn(session: &mut PracticeSession) -> Option<SessionOutcome> {
    session.start_capture().await.unwrap();
    assert!(session.stop_capture().await.is_applied());
    drive_until(session, |s| matches!(s.phase(), Phase::Idle | Phase::Complete)).await
}

/// Card list where every dialect accepts `phrase`
pub fn cards(phrases: &[&str]) -> Vec<LessonCard> {
    phrases
        .iter()
        .map(|p| {
            LessonCard::new(
                format!("พูดคำว่า '{}'", p),
                vec![(dialect_coach::scoring::Dialect::Central, vec![*p])],
            )
        })
        .collect()
}
