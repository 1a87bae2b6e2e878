use thiserror::Error;

/// Failures the practice core can run into.
///
/// None of these terminate a session: device failures keep the session idle,
/// transcription failures become an empty transcript, malformed lesson records
/// are dropped and artifact I/O problems are logged.
#[derive(Debug, Error)]
pub enum PracticeError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("transcription failed: {0}")]
    TranscriptionFailure(String),

    #[error("malformed lesson data: {0}")]
    MalformedLessonData(String),

    #[error("waveform artifact I/O failed: {0}")]
    ArtifactIo(String),

    #[error("no recording in progress")]
    NotRecording,

    #[error("already recording")]
    AlreadyRecording,

    #[error("practice session is not running")]
    SessionClosed,
}
