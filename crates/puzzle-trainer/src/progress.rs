//! Per-user statistics and the tracker that updates them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::TrainerError;
use crate::persister::Persister;
use crate::puzzle::{Difficulty, Puzzle};
use crate::storage::{statistics_key, KeyValueStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeProgress {
    pub solved: u32,
    /// Finished sessions in this theme
    pub attempts: u32,
    /// Mean seconds per session
    pub average_time: f64,
}

impl ThemeProgress {
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.solved) / f64::from(self.attempts)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyProgress {
    pub solved: u32,
    pub attempts: u32,
    /// Percentage, 0..=100
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub user_id: String,
    pub puzzles_solved: u32,
    /// Moves submitted across all sessions
    pub total_attempts: u64,
    pub total_time_spent: u64,
    pub streak_current: u32,
    pub streak_best: u32,
    #[serde(default)]
    pub total_score: u64,
    #[serde(default)]
    pub theme_progress: BTreeMap<String, ThemeProgress>,
    /// Keyed by difficulty name
    #[serde(default)]
    pub difficulty_progress: BTreeMap<String, DifficultyProgress>,
    #[serde(default)]
    pub solved_puzzle_ids: BTreeSet<String>,
    #[serde(default)]
    pub last_played_at: Option<DateTime<Utc>>,
}

impl UserStatistics {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn has_solved(&self, puzzle_id: &str) -> bool {
        self.solved_puzzle_ids.contains(puzzle_id)
    }

    pub fn theme(&self, theme: &str) -> Option<&ThemeProgress> {
        self.theme_progress.get(theme)
    }

    pub fn difficulty(&self, difficulty: Difficulty) -> Option<&DifficultyProgress> {
        self.difficulty_progress.get(difficulty.as_str())
    }
}

/// Everything the tracker needs to know about a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub puzzle_id: String,
    pub success: bool,
    pub time_spent_seconds: u64,
    pub attempts: u32,
    pub hints_used: u32,
    pub score: u32,
    pub finished_at: DateTime<Utc>,
}

/// Applies outcomes to statistics and hands them to the persister.
///
/// Statistics are passed in by the caller; the tracker holds no per-user
/// state of its own.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    persister: Option<Persister>,
}

impl ProgressTracker {
    pub fn new(persister: Option<Persister>) -> Self {
        Self { persister }
    }

    /// Fold one session outcome into `stats` and queue a write.
    pub fn record_outcome(&self, stats: &mut UserStatistics, puzzle: &Puzzle, outcome: &SessionOutcome) {
        stats.total_attempts += u64::from(outcome.attempts);
        stats.total_time_spent += outcome.time_spent_seconds;
        stats.total_score += u64::from(outcome.score);
        stats.last_played_at = Some(outcome.finished_at);

        if outcome.success {
            stats.puzzles_solved += 1;
            stats.streak_current += 1;
            stats.streak_best = stats.streak_best.max(stats.streak_current);
            stats.solved_puzzle_ids.insert(puzzle.id.clone());
        } else {
            stats.streak_current = 0;
        }

        let theme = stats.theme_progress.entry(puzzle.theme.clone()).or_default();
        theme.attempts += 1;
        if outcome.success {
            theme.solved += 1;
        }
        let n = f64::from(theme.attempts);
        theme.average_time =
            (theme.average_time * (n - 1.0) + outcome.time_spent_seconds as f64) / n;

        let band = stats
            .difficulty_progress
            .entry(puzzle.difficulty.as_str().to_string())
            .or_default();
        band.attempts += 1;
        if outcome.success {
            band.solved += 1;
        }
        band.success_rate = f64::from(band.solved) / f64::from(band.attempts) * 100.0;

        debug!(
            user_id = %stats.user_id,
            puzzle_id = %puzzle.id,
            success = outcome.success,
            streak = stats.streak_current,
            "Recorded outcome"
        );

        self.persist(stats);
    }

    /// Queue the full statistics blob for the user.
    pub fn persist(&self, stats: &UserStatistics) {
        let Some(persister) = &self.persister else {
            return;
        };
        match Self::export(stats) {
            Ok(value) => persister.enqueue(statistics_key(&stats.user_id), value),
            Err(e) => warn!(user_id = %stats.user_id, error = %e, "Could not serialize statistics"),
        }
    }

    pub fn export(stats: &UserStatistics) -> Result<JsonValue, TrainerError> {
        Ok(serde_json::to_value(stats)?)
    }

    pub fn import(value: JsonValue) -> Result<UserStatistics, TrainerError> {
        serde_json::from_value(value).map_err(|e| TrainerError::Import(e.to_string()))
    }

    /// Read a user's statistics from the store, if any were saved.
    pub async fn load(
        store: &dyn KeyValueStore,
        user_id: &str,
    ) -> Result<Option<UserStatistics>, TrainerError> {
        match store.get(&statistics_key(user_id)).await? {
            Some(value) => Ok(Some(Self::import(value)?)),
            None => Ok(None),
        }
    }
}
