//! Notifications for the UI collaborator.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrainerEvent {
    PuzzleLoaded {
        puzzle_id: String,
        fen: String,
        theme: String,
        rating: u32,
        player_moves: usize,
    },
    /// Loading ended back in the menu
    LoadFailed {
        reason: String,
    },
    MoveAccepted {
        san: String,
        fen: String,
        /// Forced reply to animate, already applied to `fen_after_reply`
        opponent_reply: Option<String>,
        fen_after_reply: Option<String>,
    },
    MoveRejected {
        candidate: String,
        attempts: u32,
    },
    HintRevealed {
        expected: String,
        hints_used: u32,
    },
    Paused,
    Resumed,
    PuzzleSolved {
        puzzle_id: String,
        score: u32,
        time_spent_seconds: u64,
        attempts: u32,
    },
    PuzzleFailed {
        puzzle_id: String,
        time_spent_seconds: u64,
        attempts: u32,
    },
    StatisticsUpdated {
        puzzles_solved: u32,
        streak_current: u32,
        streak_best: u32,
    },
}
