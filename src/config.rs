use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{AudioBackendConfig, AudioSource, CaptureConfig};
use crate::scoring::{Dialect, NormalizationTable, ScoringConfig};
use crate::session::SessionConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub scoring: ScoringConfig,
    pub session: SessionSettings,
    pub nats: NatsConfig,
    pub lessons: LessonsConfig,
    /// Per-dialect replacement tables, replacing the built-in ones when present
    pub dialects: Option<DialectTables>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "dialect-coach".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// `silence`, `microphone` or `file:<path>`
    pub source: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub max_speak_seconds: f64,
    pub buffer_duration_ms: u64,
    /// Where utterance WAV files live while they are transcribed
    pub artifact_dir: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            source: if cfg!(feature = "microphone") {
                "microphone"
            } else {
                "silence"
            }
            .to_string(),
            sample_rate: 16000,
            channels: 1,
            max_speak_seconds: 4.0,
            buffer_duration_ms: 64,
            artifact_dir: None,
        }
    }
}

impl AudioConfig {
    pub fn source(&self) -> Result<AudioSource> {
        self.source
            .parse()
            .with_context(|| format!("Invalid audio source: {}", self.source))
    }

    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            target_sample_rate: self.sample_rate,
            target_channels: self.channels,
            buffer_duration_ms: self.buffer_duration_ms,
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        let artifact_dir = match &self.artifact_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => std::env::temp_dir().join("dialect-coach"),
        };

        CaptureConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            max_duration: Duration::from_secs_f64(self.max_speak_seconds.max(0.1)),
            artifact_dir,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub hearts: u8,
    pub feedback_display_ms: u64,
    pub tick_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            hearts: 3,
            feedback_display_ms: 2500,
            tick_ms: 16,
        }
    }
}

impl SessionSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
    pub transcribe_subject: String,
    pub generate_subject: String,
    pub request_timeout_ms: u64,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            transcribe_subject: "stt.transcribe".to_string(),
            generate_subject: "lessons.generate".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl NatsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LessonsConfig {
    pub path: Option<String>,
    /// Randomize card order on load and on restart
    pub shuffle: bool,
}

impl LessonsConfig {
    pub fn path(&self) -> Option<PathBuf> {
        self.path
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
    }
}

/// Ordered `[from, to]` pairs per dialect
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DialectTables {
    pub northern: Option<Vec<(String, String)>>,
    pub isan: Option<Vec<(String, String)>>,
    pub southern: Option<Vec<(String, String)>>,
}

impl Config {
    /// Load configuration from an optional file plus `DIALECT_COACH__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("DIALECT_COACH").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            hearts: self.session.hearts.max(1),
            feedback_display: Duration::from_millis(self.session.feedback_display_ms),
            shuffle_lessons: self.lessons.shuffle,
        }
    }

    pub fn normalization_table(&self) -> NormalizationTable {
        let mut table = NormalizationTable::builtin();
        if let Some(tables) = &self.dialects {
            let overrides = [
                (Dialect::Northern, &tables.northern),
                (Dialect::Isan, &tables.isan),
                (Dialect::Southern, &tables.southern),
            ];
            for (dialect, rules) in overrides {
                if let Some(rules) = rules {
                    table = table.with_rules(dialect, rules.clone());
                }
            }
        }
        table
    }
}
