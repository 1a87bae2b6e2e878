use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::PracticeError;

/// A finished utterance persisted as a WAV file.
///
/// The artifact owns its file: [`discard`](Self::discard) consumes it and
/// deletes the file, and an artifact dropped without being discarded
/// removes the file on drop. Either way the file is deleted once.
#[derive(Debug)]
pub struct WaveformArtifact {
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    sample_count: usize,
    removed: bool,
}

impl WaveformArtifact {
    /// Write interleaved samples to a uniquely named WAV file in `dir`.
    ///
    /// Empty input is padded to one silent frame so the file is always a
    /// valid, non-empty waveform.
    pub fn write(
        dir: &Path,
        samples: &[i16],
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, PracticeError> {
        fs::create_dir_all(dir).map_err(|e| {
            PracticeError::ArtifactIo(format!("create {}: {}", dir.display(), e))
        })?;

        let path = dir.join(format!("utterance-{}.wav", uuid::Uuid::new_v4()));
        let channels = channels.max(1);

        let silent_frame = vec![0i16; channels as usize];
        let samples = if samples.is_empty() {
            &silent_frame[..]
        } else {
            samples
        };

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let io_err = |e: hound::Error| PracticeError::ArtifactIo(format!("{}: {}", path.display(), e));

        let mut writer = hound::WavWriter::create(&path, spec).map_err(io_err)?;
        for &sample in samples {
            writer.write_sample(sample).map_err(io_err)?;
        }
        writer.finalize().map_err(io_err)?;

        info!(
            "Waveform artifact written: {} ({} samples, {:.2}s)",
            path.display(),
            samples.len(),
            samples.len() as f64 / (sample_rate as f64 * channels as f64)
        );

        Ok(Self {
            path,
            sample_rate,
            channels,
            sample_count: samples.len(),
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Interleaved sample count (always at least one frame)
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn duration_seconds(&self) -> f64 {
        self.sample_count as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Delete the backing file. Failures are logged and not retried.
    pub fn discard(mut self) {
        self.remove_file();
    }

    fn remove_file(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match fs::remove_file(&self.path) {
            Ok(()) => info!("Waveform artifact deleted: {}", self.path.display()),
            Err(e) => warn!(
                "{}",
                PracticeError::ArtifactIo(format!("delete {}: {}", self.path.display(), e))
            ),
        }
    }
}

impl Drop for WaveformArtifact {
    fn drop(&mut self) {
        if !self.removed {
            warn!("Waveform artifact dropped without discard: {}", self.path.display());
            self.remove_file();
        }
    }
}
