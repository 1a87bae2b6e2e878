use serde::{Deserialize, Serialize};

use super::ledger::PlayerProgress;
use super::pipeline::UtteranceResult;
use super::practice::{Phase, PracticeMode};
use crate::scoring::Dialect;

/// Read-only view of the session published after every tick and command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub mode: PracticeMode,
    pub dialect: Dialect,
    pub prompt: String,
    /// Phrases the current turn is scored against
    pub targets: Vec<String>,
    pub card_index: usize,
    pub total_cards: usize,
    pub hearts: u8,
    pub starting_hearts: u8,
    pub correct: u32,
    pub recording: bool,
    /// A transcription is in flight
    pub pending: bool,
    pub last_result: Option<UtteranceResult>,
    pub last_error: Option<String>,
    pub progress: PlayerProgress,
}
