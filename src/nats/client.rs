use anyhow::{Context, Result};
use async_nats::{Client, ConnectOptions};
use base64::Engine;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{LessonRequest, TranscribeRequest, TranscriptReply};
use crate::audio::AudioFile;

pub struct NatsClient {
    client: Client,
    session_id: String,
    request_timeout: Duration,
}

impl NatsClient {
    /// Connect to NATS server.
    ///
    /// An unreachable server is retried in the background; until it appears
    /// every request fails with a timeout.
    pub async fn connect(url: &str, session_id: String, request_timeout: Duration) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = ConnectOptions::new()
            .retry_on_initial_connect()
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("NATS client ready (state: {:?})", client.connection_state());

        Ok(Self {
            client,
            session_id,
            request_timeout,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a recorded utterance and wait for its transcript
    pub async fn request_transcript(
        &self,
        subject: &str,
        audio: &AudioFile,
        language: &str,
    ) -> Result<TranscriptReply> {
        let message = TranscribeRequest {
            session_id: self.session_id.clone(),
            utterance_id: uuid::Uuid::new_v4().to_string(),
            pcm: base64::engine::general_purpose::STANDARD.encode(audio.pcm_bytes()),
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            language: language.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        debug!(
            "Requesting transcript on {} (utterance={}, {:.2}s)",
            subject, message.utterance_id, audio.duration_seconds
        );

        let payload = self.request_json(subject, &message).await?;
        let reply: TranscriptReply =
            serde_json::from_slice(&payload).context("Failed to parse transcript reply")?;

        Ok(reply)
    }

    /// Ask the lesson generator for cards; the reply is raw text that should
    /// contain a JSON array
    pub async fn request_lessons(&self, subject: &str, request: &LessonRequest) -> Result<String> {
        info!(
            "Requesting {} lessons on '{}' from {}",
            request.count, request.topic, subject
        );

        let payload = self.request_json(subject, request).await?;
        String::from_utf8(payload).context("Lesson reply is not UTF-8")
    }

    async fn request_json<T: Serialize>(&self, subject: &str, message: &T) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(message)?;

        let reply = tokio::time::timeout(
            self.request_timeout,
            self.client.request(subject.to_string(), payload.into()),
        )
        .await
        .with_context(|| format!("Request on {} timed out", subject))?
        .with_context(|| format!("Request on {} failed", subject))?;

        Ok(reply.payload.to_vec())
    }
}
