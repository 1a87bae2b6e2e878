// Microphone backend on the default cpal input device

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SizedSample, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use super::file::f32_to_i16;
use super::resample::ChunkConverter;

/// Captures from the default input device.
///
/// `cpal::Stream` is not `Send`, so the stream lives on a dedicated thread
/// that holds it until a stop signal arrives. The driver callback converts
/// samples to the configured rate and channel count and hands them over
/// with `try_send`, never blocking.
pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    capturing: Arc<AtomicBool>,
    stop_tx: Option<std_mpsc::Sender<()>>,
    stream_thread: Option<JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self {
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            stream_thread: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            bail!("Already capturing");
        }

        let (frame_tx, frame_rx) = mpsc::channel(256);
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<String>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let sample_rate = self.config.target_sample_rate;
        let channels = self.config.target_channels;
        let capturing = Arc::clone(&self.capturing);

        let handle = std::thread::Builder::new()
            .name("microphone-stream".to_string())
            .spawn(move || {
                let stream = match open_stream(sample_rate, channels, frame_tx) {
                    Ok((stream, device_name)) => {
                        let _ = ready_tx.send(Ok(device_name));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Hold the stream until stop() or the backend is dropped
                let _ = stop_rx.recv();
                drop(stream);
                capturing.store(false, Ordering::SeqCst);
            })
            .context("Failed to spawn microphone thread")?;

        let opened = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .context("Microphone start task failed")?
            .map_err(|_| anyhow!("Microphone thread exited before opening the device"))?;

        let device_name = match opened {
            Ok(name) => name,
            Err(e) => {
                let _ = handle.join();
                return Err(e);
            }
        };

        self.capturing.store(true, Ordering::SeqCst);
        self.stop_tx = Some(stop_tx);
        self.stream_thread = Some(handle);

        info!(
            "Microphone capture started: {} ({}Hz, {} channels)",
            device_name, sample_rate, channels
        );

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.stream_thread.take() {
            tokio::task::spawn_blocking(move || {
                if handle.join().is_err() {
                    error!("Microphone thread panicked");
                }
            })
            .await
            .context("Microphone stop task failed")?;
            info!("Microphone capture stopped");
        }

        self.capturing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "microphone (cpal)"
    }
}

impl Drop for MicrophoneBackend {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

fn open_stream(
    target_rate: u32,
    target_channels: u16,
    frame_tx: mpsc::Sender<AudioFrame>,
) -> Result<(cpal::Stream, String)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No default input device found"))?;
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    // Open at the device's native format and convert in the callback
    let supported = device
        .default_input_config()
        .with_context(|| format!("Failed to get config for {}", device_name))?;
    let source_rate = supported.sample_rate().0;
    let source_channels = supported.channels();

    info!(
        "Opening {}: {}Hz/{}ch -> {}Hz/{}ch",
        device_name, source_rate, source_channels, target_rate, target_channels
    );

    let converter = ChunkConverter::new(source_rate, source_channels, target_rate, target_channels)?;
    let stream_config = StreamConfig {
        channels: source_channels,
        sample_rate: SampleRate(source_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = match supported.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, converter, frame_tx),
        SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, converter, frame_tx),
        SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, converter, frame_tx),
        other => bail!("Unsupported sample format {:?} on {}", other, device_name),
    }
    .with_context(|| {
        format!(
            "Failed to open {} at {}Hz/{}ch",
            device_name, source_rate, source_channels
        )
    })?;

    stream.play().context("Failed to start microphone stream")?;

    Ok((stream, device_name))
}

fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &StreamConfig,
    mut converter: ChunkConverter,
    frame_tx: mpsc::Sender<AudioFrame>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let target_rate = converter.target_rate();
    let target_channels = converter.target_channels();
    let started = std::time::Instant::now();

    let stream = device.build_input_stream(
        stream_config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let samples: Vec<f32> = data.iter().map(|s| s.to_sample::<f32>()).collect();
            let converted = converter.push(&samples);
            if converted.is_empty() {
                return;
            }

            let frame = AudioFrame {
                samples: converted.into_iter().map(f32_to_i16).collect(),
                sample_rate: target_rate,
                channels: target_channels,
                timestamp_ms: started.elapsed().as_millis() as u64,
            };
            // Consumer gone or lagging: drop the chunk
            let _ = frame_tx.try_send(frame);
        },
        |err| {
            warn!("Microphone stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}
