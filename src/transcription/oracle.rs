use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;

use crate::audio::AudioFile;
use crate::nats::NatsClient;

/// Opaque speech-to-text model.
///
/// Calls may take seconds. Implementations doing blocking inference should
/// move it onto `tokio::task::spawn_blocking`.
#[async_trait::async_trait]
pub trait SpeechOracle: Send + Sync {
    /// Transcribe the WAV file at `path`
    async fn recognize(&self, path: &Path) -> Result<String>;

    /// Get oracle name for logging
    fn name(&self) -> &str;
}

/// Speech service reached through NATS request/reply
pub struct NatsSpeechOracle {
    client: Arc<NatsClient>,
    subject: String,
    language: String,
}

impl NatsSpeechOracle {
    pub fn new(client: Arc<NatsClient>, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
            language: "th".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[async_trait::async_trait]
impl SpeechOracle for NatsSpeechOracle {
    async fn recognize(&self, path: &Path) -> Result<String> {
        let audio = AudioFile::open(path)?;
        let reply = self
            .client
            .request_transcript(&self.subject, &audio, &self.language)
            .await?;

        match reply.error {
            Some(error) => Err(anyhow!("speech service error: {}", error)),
            None => Ok(reply.text),
        }
    }

    fn name(&self) -> &str {
        &self.subject
    }
}
