//! Practice session orchestration
//!
//! - `PracticeSession`: the turn state machine (idle, recording,
//!   transcribing, feedback, complete)
//! - `pipeline`: the background unit of work per utterance
//! - `SessionRunner`: the foreground loop that owns the session
//! - `SessionLedger`: progress carried across lesson runs

mod config;
mod ledger;
mod pipeline;
mod practice;
mod runner;
mod snapshot;

pub use config::SessionConfig;
pub use ledger::{PlayerProgress, SessionLedger, SessionOutcome};
pub use pipeline::{dispatch, UtteranceJob, UtterancePipeline, UtteranceResult};
pub use practice::{parse_expected, Phase, PracticeMode, PracticeSession, Transition};
pub use runner::{CommandReply, SessionCommand, SessionHandle, SessionRunner};
pub use snapshot::SessionSnapshot;
