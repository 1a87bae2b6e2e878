use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use super::card::{validate, LessonCard};
use crate::error::PracticeError;
use crate::nats::{LessonRequest, NatsClient};
use crate::scoring::Dialect;

/// External lesson author: turns a topic into lesson cards
#[async_trait::async_trait]
pub trait LessonGenerator: Send + Sync {
    async fn generate(&self, topic: &str, count: usize) -> Result<Vec<LessonCard>>;
}

/// Lesson generator service reached through NATS request/reply
pub struct NatsLessonGenerator {
    client: Arc<NatsClient>,
    subject: String,
}

impl NatsLessonGenerator {
    pub fn new(client: Arc<NatsClient>, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

#[async_trait::async_trait]
impl LessonGenerator for NatsLessonGenerator {
    async fn generate(&self, topic: &str, count: usize) -> Result<Vec<LessonCard>> {
        let request = LessonRequest {
            topic: topic.to_string(),
            count,
            dialects: Dialect::ALL.iter().map(|d| d.id().to_string()).collect(),
        };

        let reply = self.client.request_lessons(&self.subject, &request).await?;
        let cards = parse_generated(&reply)?;

        info!("Generator returned {} usable lessons for '{}'", cards.len(), topic);
        Ok(cards)
    }
}

/// Validate generator output the same way as a lesson file. The reply may
/// wrap the JSON array in prose or a code fence.
pub fn parse_generated(reply: &str) -> Result<Vec<LessonCard>> {
    let raw = extract_json_array(reply.trim());
    if raw.is_empty() {
        return Err(PracticeError::MalformedLessonData("generator reply is empty".to_string()).into());
    }

    let data: serde_json::Value =
        serde_json::from_str(raw).context("Generator reply is not valid JSON")?;

    let cards = validate(&data);
    if cards.is_empty() {
        return Err(PracticeError::MalformedLessonData(
            "generator reply holds no usable lessons".to_string(),
        )
        .into());
    }

    Ok(cards)
}

/// Span from the first `[` to the last `]`, or the whole text
fn extract_json_array(text: &str) -> &str {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
