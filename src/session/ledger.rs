use serde::{Deserialize, Serialize};
use tracing::info;

/// Experience per correct answer
const XP_PER_CORRECT: i64 = 12;
/// Experience lost per heart spent
const XP_PER_LOST_HEART: i64 = 6;

/// How a lesson run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub correct: u32,
    pub hearts_remaining: u8,
    pub starting_hearts: u8,
    pub total_cards: usize,
    pub cards_answered: usize,
}

impl SessionOutcome {
    /// Every card answered with hearts to spare
    pub fn finished_all_cards(&self) -> bool {
        self.cards_answered >= self.total_cards && self.hearts_remaining > 0
    }
}

/// Player state carried across runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub experience: u64,
    pub streak: u32,
    pub best_streak: u32,
}

impl PlayerProgress {
    /// Experience a run is worth, never negative
    pub fn experience_gained(outcome: &SessionOutcome) -> u64 {
        let lost_hearts = outcome.starting_hearts.saturating_sub(outcome.hearts_remaining);
        let gained = outcome.correct as i64 * XP_PER_CORRECT - lost_hearts as i64 * XP_PER_LOST_HEART;
        gained.max(0) as u64
    }

    /// Fold one run into the progress. Pure: depends only on `self` and
    /// `outcome`.
    pub fn settle(&self, outcome: &SessionOutcome) -> PlayerProgress {
        let streak = if outcome.finished_all_cards() && outcome.correct > 0 {
            self.streak + 1
        } else {
            0
        };

        PlayerProgress {
            experience: self.experience + Self::experience_gained(outcome),
            streak,
            best_streak: self.best_streak.max(streak),
        }
    }
}

/// Accumulates progress from finished runs
#[derive(Debug, Clone, Default)]
pub struct SessionLedger {
    progress: PlayerProgress,
    runs: usize,
}

impl SessionLedger {
    pub fn new(progress: PlayerProgress) -> Self {
        Self { progress, runs: 0 }
    }

    pub fn progress(&self) -> PlayerProgress {
        self.progress
    }

    /// Runs recorded since this ledger was created
    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn record(&mut self, outcome: &SessionOutcome) -> PlayerProgress {
        self.progress = self.progress.settle(outcome);
        self.runs += 1;

        info!(
            "Run settled: {} correct, {} hearts left, +{} XP (total {}, streak {})",
            outcome.correct,
            outcome.hearts_remaining,
            PlayerProgress::experience_gained(outcome),
            self.progress.experience,
            self.progress.streak
        );

        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(correct: u32, hearts: u8, total: usize, answered: usize) -> SessionOutcome {
        SessionOutcome {
            correct,
            hearts_remaining: hearts,
            starting_hearts: 3,
            total_cards: total,
            cards_answered: answered,
        }
    }

    #[test]
    fn test_experience_for_finished_run() {
        let progress = PlayerProgress::default().settle(&outcome(5, 2, 8, 8));
        assert_eq!(progress.experience, 54);
        assert_eq!(progress.streak, 1);
        assert_eq!(progress.best_streak, 1);
    }

    #[test]
    fn test_experience_never_negative() {
        let progress = PlayerProgress {
            experience: 10,
            streak: 0,
            best_streak: 0,
        }
        .settle(&outcome(0, 0, 4, 3));
        assert_eq!(progress.experience, 10);
    }

    #[test]
    fn test_streak_resets_on_lost_run() {
        let before = PlayerProgress {
            experience: 100,
            streak: 4,
            best_streak: 4,
        };
        let after = before.settle(&outcome(2, 0, 4, 3));
        assert_eq!(after.streak, 0);
        assert_eq!(after.best_streak, 4);
    }

    #[test]
    fn test_streak_needs_a_correct_answer() {
        let before = PlayerProgress {
            experience: 0,
            streak: 2,
            best_streak: 3,
        };
        assert_eq!(before.settle(&outcome(0, 3, 4, 4)).streak, 0);
    }

    #[test]
    fn test_best_streak_tracks_maximum() {
        let mut progress = PlayerProgress::default();
        for _ in 0..3 {
            progress = progress.settle(&outcome(4, 3, 4, 4));
        }
        assert_eq!(progress.streak, 3);
        assert_eq!(progress.best_streak, 3);
        assert_eq!(progress.experience, 144);
    }

    #[test]
    fn test_settle_is_deterministic() {
        let start = PlayerProgress {
            experience: 7,
            streak: 1,
            best_streak: 2,
        };
        let run = outcome(3, 1, 5, 5);
        assert_eq!(start.settle(&run), start.settle(&run));
    }

    #[test]
    fn test_ledger_records_runs() {
        let mut ledger = SessionLedger::default();
        ledger.record(&outcome(1, 3, 1, 1));
        assert_eq!(ledger.runs(), 1);
        assert_eq!(ledger.progress().experience, 12);
    }
}
