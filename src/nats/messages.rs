use serde::{Deserialize, Serialize};

/// Utterance sent to the speech service for transcription
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeRequest {
    pub session_id: String,
    pub utterance_id: String,
    pub pcm: String,  // Base64-encoded PCM bytes (i16 little-endian)
    pub sample_rate: u32,
    pub channels: u16,
    pub language: String,
    pub timestamp: String,  // RFC3339 timestamp
}

/// Reply from the speech service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptReply {
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Set when the model failed; `text` is then ignored
    #[serde(default)]
    pub error: Option<String>,
}

/// Request to the lesson generator
#[derive(Debug, Serialize, Deserialize)]
pub struct LessonRequest {
    pub topic: String,
    pub count: usize,
    /// Dialect ids every card should carry targets for
    pub dialects: Vec<String>,
}
