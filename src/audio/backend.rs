use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Requested sample rate
    pub target_sample_rate: u32,
    /// Requested channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Duration of each delivered frame in milliseconds
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz for Whisper
            target_channels: 1,        // Mono
            buffer_duration_ms: 64,    // ~1024 samples at 16kHz
        }
    }
}

impl AudioBackendConfig {
    /// Interleaved samples in one frame
    pub fn samples_per_frame(&self) -> usize {
        let frames = self.target_sample_rate as u64 * self.buffer_duration_ms.max(1) / 1000;
        (frames.max(1) as usize) * self.target_channels.max(1) as usize
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: default cpal input device (feature `microphone`)
/// - File: replays a WAV file at real-time cadence
/// - Silence: endless silent frames, for headless runs
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames. An error
    /// means the device could not be opened.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio. Safe to call when not capturing.
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend for the configured source
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => {
                #[cfg(feature = "microphone")]
                {
                    use super::microphone::MicrophoneBackend;
                    Ok(Box::new(MicrophoneBackend::new(config)))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    anyhow::bail!(
                        "Microphone capture needs the `microphone` feature; \
                        use audio.source = \"silence\" or \"file:<path>\" instead"
                    )
                }
            }

            AudioSource::Silence => Ok(Box::new(super::replay::ReplayBackend::silence(config))),

            AudioSource::File(path) => Ok(Box::new(super::replay::ReplayBackend::from_file(
                path, config,
            )?)),
        }
    }
}

/// Audio source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Default input device
    Microphone,
    /// Silent frames
    Silence,
    /// WAV file replayed at real-time cadence
    File(PathBuf),
}

impl FromStr for AudioSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "microphone" | "mic" => Ok(AudioSource::Microphone),
            "silence" => Ok(AudioSource::Silence),
            other => match other.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(AudioSource::File(PathBuf::from(
                    shellexpand::tilde(path).as_ref(),
                ))),
                _ => anyhow::bail!("expected `microphone`, `silence` or `file:<path>`"),
            },
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::Microphone => f.write_str("microphone"),
            AudioSource::Silence => f.write_str("silence"),
            AudioSource::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}
