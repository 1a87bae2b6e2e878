use base64::Engine;
use dialect_coach::lessons::parse_generated;
use dialect_coach::nats::messages::{LessonRequest, TranscribeRequest, TranscriptReply};
use dialect_coach::nats::NatsClient;
use dialect_coach::scoring::Dialect;
use std::time::Duration;

#[test]
fn test_transcribe_request_serialization() {
    let msg = TranscribeRequest {
        session_id: "practice-1".to_string(),
        utterance_id: "utterance-7".to_string(),
        pcm: base64::engine::general_purpose::STANDARD.encode([0u8; 100]),
        sample_rate: 16000,
        channels: 1,
        language: "th".to_string(),
        timestamp: "2026-10-19T09:30:00Z".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("practice-1"));
    assert!(json.contains("16000"));
    assert!(json.contains("\"language\":\"th\""));

    let deserialized: TranscribeRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.utterance_id, "utterance-7");
    assert_eq!(deserialized.sample_rate, 16000);
    assert_eq!(deserialized.channels, 1);
}

#[test]
fn test_transcript_reply_deserialization() {
    let json = r#"{
        "text": "กิ๋นข้าว",
        "confidence": 0.91
    }"#;

    let msg: TranscriptReply = serde_json::from_str(json).unwrap();
    assert_eq!(msg.text, "กิ๋นข้าว");
    assert_eq!(msg.confidence, Some(0.91));
    assert!(msg.error.is_none());
}

#[test]
fn test_transcript_reply_error() {
    let json = r#"{"text": "", "error": "model not loaded"}"#;

    let msg: TranscriptReply = serde_json::from_str(json).unwrap();
    assert_eq!(msg.error.as_deref(), Some("model not loaded"));
    assert_eq!(msg.confidence, None);
}

#[test]
fn test_pcm_encoding_roundtrip() {
    let original_samples: Vec<i16> = vec![100, -200, 300, -400];

    // Convert to bytes
    let pcm_bytes: Vec<u8> = original_samples.iter().flat_map(|&s| s.to_le_bytes()).collect();

    let msg = TranscribeRequest {
        session_id: "test".to_string(),
        utterance_id: "u".to_string(),
        pcm: base64::engine::general_purpose::STANDARD.encode(&pcm_bytes),
        sample_rate: 16000,
        channels: 1,
        language: "th".to_string(),
        timestamp: "2026-10-19T09:30:00Z".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: TranscribeRequest = serde_json::from_str(&json).unwrap();

    let decoded_bytes = base64::engine::general_purpose::STANDARD
        .decode(&deserialized.pcm)
        .unwrap();
    let decoded_samples: Vec<i16> = decoded_bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    assert_eq!(decoded_samples, original_samples);
}

#[test]
fn test_lesson_request_lists_dialects() {
    let msg = LessonRequest {
        topic: "อาหาร".to_string(),
        count: 3,
        dialects: Dialect::ALL.iter().map(|d| d.id().to_string()).collect(),
    };

    let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["count"], 3);
    assert_eq!(json["dialects"], serde_json::json!(["central", "northern", "isan", "southern"]));
}

#[test]
fn test_generator_reply_in_code_fence() {
    let reply = "```json\n[\n  {\"prompt\": \"พูดว่า 'แซบ'\", \"targets\": {\"central\": [\"อร่อย\"], \"isan\": [\"แซบ\"]}},\n  {\"oops\": true}\n]\n```";

    let cards = parse_generated(reply).unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].targets_for(Dialect::Isan), ["แซบ".to_string()]);
    assert_eq!(cards[0].targets_for(Dialect::Northern), ["อร่อย".to_string()]);
}

#[tokio::test]
async fn test_unreachable_server_fails_requests_instead_of_connect() {
    let client = tokio::time::timeout(
        Duration::from_secs(5),
        NatsClient::connect(
            "nats://127.0.0.1:1",
            "practice-offline".to_string(),
            Duration::from_millis(100),
        ),
    )
    .await
    .expect("connect should not block on an absent server")
    .unwrap();

    let request = LessonRequest {
        topic: "ทักทาย".to_string(),
        count: 1,
        dialects: vec!["central".to_string()],
    };
    assert!(client.request_lessons("lessons.generate", &request).await.is_err());
}
