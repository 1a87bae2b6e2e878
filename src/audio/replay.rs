use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use super::file::AudioFile;

/// Backend that feeds pre-recorded or silent frames at real-time cadence.
///
/// Stands in for a microphone on headless machines and lets a WAV file be
/// practiced against the full capture pipeline.
pub struct ReplayBackend {
    config: AudioBackendConfig,
    /// `None` means endless silence
    samples: Option<Arc<Vec<i16>>>,
    label: String,
    capturing: Arc<AtomicBool>,
    feeder: Option<JoinHandle<()>>,
}

impl ReplayBackend {
    pub fn silence(config: AudioBackendConfig) -> Self {
        Self {
            config,
            samples: None,
            label: "silence".to_string(),
            capturing: Arc::new(AtomicBool::new(false)),
            feeder: None,
        }
    }

    /// Replay a WAV file. Its format must match the requested rate/channels.
    pub fn from_file(path: PathBuf, config: AudioBackendConfig) -> Result<Self> {
        let audio = AudioFile::open(&path)?;

        if audio.sample_rate != config.target_sample_rate || audio.channels != config.target_channels {
            anyhow::bail!(
                "{} is {}Hz/{}ch, capture expects {}Hz/{}ch",
                path.display(),
                audio.sample_rate,
                audio.channels,
                config.target_sample_rate,
                config.target_channels
            );
        }

        info!(
            "Replay backend loaded {} ({:.1}s)",
            path.display(),
            audio.duration_seconds
        );

        Ok(Self {
            config,
            samples: Some(Arc::new(audio.samples)),
            label: format!("file:{}", path.display()),
            capturing: Arc::new(AtomicBool::new(false)),
            feeder: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for ReplayBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            anyhow::bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(64);
        let capturing = Arc::clone(&self.capturing);
        let samples = self.samples.clone();
        let frame_len = self.config.samples_per_frame();
        let sample_rate = self.config.target_sample_rate;
        let channels = self.config.target_channels;
        let frame_ms = self.config.buffer_duration_ms.max(1);

        capturing.store(true, Ordering::SeqCst);

        self.feeder = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms));
            let mut offset = 0usize;
            let mut timestamp_ms = 0u64;

            while capturing.load(Ordering::SeqCst) {
                ticker.tick().await;

                let chunk = match &samples {
                    Some(samples) => {
                        if offset >= samples.len() {
                            break;
                        }
                        let end = (offset + frame_len).min(samples.len());
                        let chunk = samples[offset..end].to_vec();
                        offset = end;
                        chunk
                    }
                    None => vec![0i16; frame_len],
                };

                let frame = AudioFrame {
                    samples: chunk,
                    sample_rate,
                    channels,
                    timestamp_ms,
                };
                timestamp_ms += frame_ms;

                if tx.send(frame).await.is_err() {
                    break;
                }
            }

            capturing.store(false, Ordering::SeqCst);
        }));

        info!("Replay capture started ({})", self.label);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
            if let Err(e) = feeder.await {
                if !e.is_cancelled() {
                    warn!("Replay feeder failed: {}", e);
                }
            }
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.label
    }
}
