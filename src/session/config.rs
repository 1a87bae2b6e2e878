use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rules of one practice run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hearts at the start of a lesson run
    pub hearts: u8,

    /// How long a verdict stays on screen before the session moves on
    pub feedback_display: Duration,

    /// Deal cards in random order on load and on every restart
    #[serde(default)]
    pub shuffle_lessons: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hearts: 3,
            feedback_display: Duration::from_millis(2500),
            shuffle_lessons: false,
        }
    }
}
