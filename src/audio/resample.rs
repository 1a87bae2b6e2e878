// Channel downmix and sample-rate conversion for device audio

use anyhow::{anyhow, Result};
use rubato::{FftFixedIn, Resampler};
use tracing::warn;

const RESAMPLER_CHUNK_SIZE: usize = 1024;

/// Turns interleaved device chunks into interleaved chunks at the capture
/// format. Input is buffered until the resampler has a full chunk, so a
/// single push may return nothing.
pub struct ChunkConverter {
    source_channels: usize,
    target_channels: usize,
    target_rate: u32,
    resampler: Option<FftFixedIn<f32>>,
    pending: Vec<Vec<f32>>,
}

impl ChunkConverter {
    pub fn new(
        source_rate: u32,
        source_channels: u16,
        target_rate: u32,
        target_channels: u16,
    ) -> Result<Self> {
        if source_channels == 0 || target_channels == 0 {
            return Err(anyhow!("Audio has no channels"));
        }

        let resampler = if source_rate != target_rate {
            Some(
                FftFixedIn::<f32>::new(
                    source_rate as usize,
                    target_rate as usize,
                    RESAMPLER_CHUNK_SIZE,
                    1,
                    target_channels as usize,
                )
                .map_err(|e| anyhow!("Failed to create resampler: {}", e))?,
            )
        } else {
            None
        };

        Ok(Self {
            source_channels: source_channels as usize,
            target_channels: target_channels as usize,
            target_rate,
            resampler,
            pending: vec![Vec::with_capacity(RESAMPLER_CHUNK_SIZE); target_channels as usize],
        })
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    pub fn target_channels(&self) -> u16 {
        self.target_channels as u16
    }

    pub fn push(&mut self, interleaved: &[f32]) -> Vec<f32> {
        let planar = self.downmix(interleaved);

        let Some(resampler) = self.resampler.as_mut() else {
            return interleave(&planar);
        };

        for (pending, channel) in self.pending.iter_mut().zip(planar) {
            pending.extend(channel);
        }

        let mut out = Vec::new();
        loop {
            let needed = resampler.input_frames_next();
            if self.pending[0].len() < needed {
                break;
            }

            let chunk: Vec<&[f32]> = self.pending.iter().map(|c| &c[..needed]).collect();
            match resampler.process(&chunk[..], None) {
                Ok(resampled) => out.extend(interleave(&resampled)),
                Err(e) => warn!("Resampling error: {}", e),
            }

            for pending in &mut self.pending {
                pending.drain(..needed);
            }
        }
        out
    }

    /// Splits interleaved samples into one buffer per target channel. Mono
    /// targets average every source channel; otherwise extra source channels
    /// are dropped and missing ones repeat the last available channel.
    fn downmix(&self, interleaved: &[f32]) -> Vec<Vec<f32>> {
        let frames = interleaved.len() / self.source_channels;
        let mut planar = vec![Vec::with_capacity(frames); self.target_channels];

        for frame in interleaved.chunks_exact(self.source_channels) {
            if self.target_channels == 1 {
                planar[0].push(frame.iter().sum::<f32>() / self.source_channels as f32);
            } else {
                for (c, channel) in planar.iter_mut().enumerate() {
                    channel.push(frame[c.min(self.source_channels - 1)]);
                }
            }
        }
        planar
    }
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.first().map_or(0, Vec::len);
    let mut out = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        for channel in planar {
            out.push(channel[i]);
        }
    }
    out
}
