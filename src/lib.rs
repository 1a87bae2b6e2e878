pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod lessons;
pub mod nats;
pub mod scoring;
pub mod session;
pub mod transcription;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioCapture, AudioFile, AudioFrame,
    AudioSource, CaptureConfig, WaveformArtifact,
};
pub use config::Config;
pub use error::PracticeError;
pub use http::{create_router, AppState};
pub use lessons::{LessonCard, LessonGenerator, NatsLessonGenerator};
pub use nats::NatsClient;
pub use scoring::{Dialect, DialectNormalizer, EvaluationVerdict, Evaluator, Tier, UtteranceScorer};
pub use session::{
    PlayerProgress, PracticeSession, SessionConfig, SessionHandle, SessionLedger, SessionRunner,
    SessionSnapshot,
};
pub use transcription::{NatsSpeechOracle, SpeechOracle, TranscriptionOutcome, TranscriptionService};
