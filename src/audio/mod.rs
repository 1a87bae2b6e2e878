pub mod artifact;
pub mod backend;
pub mod capture;
pub mod file;
pub mod replay;

#[cfg(feature = "microphone")]
pub mod microphone;
#[cfg(feature = "microphone")]
pub mod resample;

pub use artifact::WaveformArtifact;
pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use capture::{AudioCapture, CaptureConfig, RecordingSession};
pub use file::AudioFile;
pub use replay::ReplayBackend;
