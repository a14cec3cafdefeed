//! Per-puzzle session state.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::puzzle::Puzzle;

/// Where the trainer is in the puzzle lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Menu,
    Loading,
    Playing,
    Paused,
    Solved,
    Failed,
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Solved | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Solved => "solved",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempt at one puzzle.
#[derive(Debug, Clone)]
pub struct Session {
    pub puzzle: Arc<Puzzle>,
    /// Current FEN, starts at `puzzle.fen`
    pub position: String,
    /// Accepted player and opponent moves, in SAN
    pub move_history: Vec<String>,
    /// Cursor into `puzzle.solution`
    pub expected_index: usize,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub time_spent_seconds: u64,
    pub attempts_count: u32,
    pub hints_used: u32,
    paused_at: Option<DateTime<Utc>>,
    paused_total: Duration,
}

impl Session {
    pub fn new(puzzle: Arc<Puzzle>, now: DateTime<Utc>) -> Self {
        let position = puzzle.fen.clone();
        Self {
            puzzle,
            position,
            move_history: Vec::new(),
            expected_index: 0,
            status: SessionStatus::Playing,
            started_at: now,
            time_spent_seconds: 0,
            attempts_count: 0,
            hints_used: 0,
            paused_at: None,
            paused_total: Duration::zero(),
        }
    }

    /// The solution entry the session is waiting for, if any.
    pub fn expected_move(&self) -> Option<&str> {
        self.puzzle
            .solution
            .get(self.expected_index)
            .map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.expected_index >= self.puzzle.solution.len()
    }

    /// Append an accepted move and advance the cursor.
    pub fn advance(&mut self, san: String, fen_after: String) {
        self.move_history.push(san);
        self.position = fen_after;
        self.expected_index += 1;
    }

    /// Seconds spent so far, not counting paused stretches.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        let mut paused = self.paused_total;
        if let Some(paused_at) = self.paused_at {
            paused += now - paused_at;
        }
        let active = now - self.started_at - paused;
        active.num_seconds().max(0) as u64
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
        self.status = SessionStatus::Paused;
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now - paused_at;
        }
        self.status = SessionStatus::Playing;
    }

    /// Freeze the clock and record the terminal status.
    pub fn finish(&mut self, status: SessionStatus, now: DateTime<Utc>) -> u64 {
        self.time_spent_seconds = self.elapsed_seconds(now);
        self.paused_at = None;
        self.status = status;
        self.time_spent_seconds
    }
}
