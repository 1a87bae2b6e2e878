use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use super::artifact::WaveformArtifact;
use super::backend::{AudioBackend, AudioFrame};
use crate::error::PracticeError;

/// Format and time box of a single utterance capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Hard upper bound on one utterance
    pub max_duration: Duration,
    /// Directory for waveform artifacts
    pub artifact_dir: PathBuf,
}

/// One bounded recording against the backend
pub struct RecordingSession {
    pub sample_rate: u32,
    pub channels: u16,
    pub max_duration: Duration,
    pub started_at: Instant,
    is_active: Arc<AtomicBool>,
    stop_tx: Option<oneshot::Sender<()>>,
    collector: JoinHandle<Vec<Vec<i16>>>,
}

impl RecordingSession {
    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Time-boxed utterance capture.
///
/// `start()` opens the backend and spawns a collector that appends incoming
/// frames until `stop()` is requested, the backend closes its stream, or
/// `max_duration` elapses. In the last case the recording goes inactive on
/// its own and waits for `stop()` to turn the samples into a
/// [`WaveformArtifact`].
pub struct AudioCapture {
    backend: Box<dyn AudioBackend>,
    config: CaptureConfig,
    recording: Option<RecordingSession>,
}

impl AudioCapture {
    pub fn new(backend: Box<dyn AudioBackend>, config: CaptureConfig) -> Self {
        Self {
            backend,
            config,
            recording: None,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// True while samples are still being collected
    pub fn is_active(&self) -> bool {
        self.recording.as_ref().is_some_and(RecordingSession::is_active)
    }

    /// True when a recording exists, whether or not it is still collecting
    pub fn has_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// A recording that ended by itself (time box or closed stream) and
    /// still waits for `stop()`
    pub fn is_expired(&self) -> bool {
        self.recording.as_ref().is_some_and(|r| !r.is_active())
    }

    pub async fn start(&mut self) -> Result<(), PracticeError> {
        if self.recording.is_some() {
            return Err(PracticeError::AlreadyRecording);
        }

        let frames = self
            .backend
            .start()
            .await
            .map_err(|e| PracticeError::DeviceUnavailable(format!("{:#}", e)))?;

        let is_active = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = oneshot::channel();
        let started_at = Instant::now();
        let deadline = started_at + self.config.max_duration;

        let collector = tokio::spawn(collect_frames(
            frames,
            stop_rx,
            deadline,
            Arc::clone(&is_active),
        ));

        info!(
            "Capture started on {} (max {:.1}s)",
            self.backend.name(),
            self.config.max_duration.as_secs_f64()
        );

        self.recording = Some(RecordingSession {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            max_duration: self.config.max_duration,
            started_at,
            is_active,
            stop_tx: Some(stop_tx),
            collector,
        });

        Ok(())
    }

    /// Halt the device and persist what was captured.
    ///
    /// Safe to call after the recording expired on its own. With no captured
    /// chunks the artifact holds one silent frame.
    pub async fn stop(&mut self) -> Result<WaveformArtifact, PracticeError> {
        let mut recording = self.recording.take().ok_or(PracticeError::NotRecording)?;

        recording.is_active.store(false, Ordering::SeqCst);
        if let Some(stop_tx) = recording.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Err(e) = self.backend.stop().await {
            warn!("Failed to stop audio backend {}: {:#}", self.backend.name(), e);
        }

        let chunks = match recording.collector.await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("Capture collector failed: {}", e);
                Vec::new()
            }
        };

        let samples: Vec<i16> = chunks.concat();

        info!(
            "Capture stopped after {:.2}s: {} chunks, {} samples",
            recording.started_at.elapsed().as_secs_f64(),
            chunks.len(),
            samples.len()
        );

        WaveformArtifact::write(
            &self.config.artifact_dir,
            &samples,
            recording.sample_rate,
            recording.channels,
        )
    }
}

async fn collect_frames(
    mut frames: mpsc::Receiver<AudioFrame>,
    mut stop_rx: oneshot::Receiver<()>,
    deadline: Instant,
    is_active: Arc<AtomicBool>,
) -> Vec<Vec<i16>> {
    let mut chunks = Vec::new();
    let time_box = tokio::time::sleep_until(deadline);
    tokio::pin!(time_box);

    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => {
                // Keep whatever the driver already delivered
                while let Ok(frame) = frames.try_recv() {
                    chunks.push(frame.samples);
                }
                break;
            }
            _ = &mut time_box => {
                info!("Capture reached its time box");
                while let Ok(frame) = frames.try_recv() {
                    chunks.push(frame.samples);
                }
                break;
            }
            frame = frames.recv() => match frame {
                Some(frame) => chunks.push(frame.samples),
                None => {
                    info!("Audio stream closed");
                    break;
                }
            },
        }
    }

    is_active.store(false, Ordering::SeqCst);
    chunks
}
