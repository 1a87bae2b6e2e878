// Integration tests for audio file processing
//
// These tests verify that we can read WAV files and extract audio data correctly.

use anyhow::Result;
use dialect_coach::audio::AudioFile;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_fixture(dir: &Path, channels: u16, samples: &[i16]) -> PathBuf {
    let path = dir.join(format!("fixture-{}ch.wav", channels));
    let spec = hound::WavSpec {
        channels,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(dir.path(), 1, &vec![250; 16000]);

    let audio = AudioFile::open(&path)?;

    assert!((audio.duration_seconds - 1.0).abs() < 1e-9);
    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 16000);
    assert!(audio.path.contains("fixture-1ch.wav"));

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_audio_file_interleaved_channels() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(dir.path(), 2, &[1, -1, 2, -2, 3, -3]);
    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.channels, 2);
    assert_eq!(audio.samples, vec![1, -1, 2, -2, 3, -3]);
    assert!((audio.duration_seconds - 3.0 / 16000.0).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_float_wav_is_converted() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("float.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for s in [0.0f32, 1.0, -1.0, 2.0] {
        writer.write_sample(s)?;
    }
    writer.finalize()?;

    let audio = AudioFile::open(&path)?;
    assert_eq!(audio.samples, vec![0, i16::MAX, -i16::MAX, i16::MAX]);

    Ok(())
}

#[test]
fn test_pcm_bytes_are_little_endian() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(dir.path(), 1, &[1, -2]);
    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.pcm_bytes(), vec![0x01, 0x00, 0xFE, 0xFF]);

    Ok(())
}

#[test]
fn test_unsupported_bit_depth_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("eight-bit.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    writer.write_sample(5i8)?;
    writer.finalize()?;

    assert!(AudioFile::open(&path).is_err());

    Ok(())
}
