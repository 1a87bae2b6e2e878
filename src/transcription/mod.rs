//! Speech-to-text behind an opaque oracle

pub mod oracle;
pub mod service;

pub use oracle::{NatsSpeechOracle, SpeechOracle};
pub use service::{TranscriptionOutcome, TranscriptionService};
