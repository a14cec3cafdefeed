//! Session state machine.
//!
//! ```text
//! menu --load--> loading --> playing <--> paused
//!                   |           |
//!                   v           v
//!                 menu     solved | failed --next--> loading
//! ```
//!
//! Every operation settles fully before returning. Load failures land back
//! in `menu`; calls made in the wrong state are refused without side
//! effects.

use std::mem;
use std::sync::Arc;

use chess_core::{ChessRules, PromotionPolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::TrainerConfig;
use crate::error::TrainerError;
use crate::events::TrainerEvent;
use crate::persister::Persister;
use crate::progress::{ProgressTracker, SessionOutcome, UserStatistics};
use crate::puzzle::Puzzle;
use crate::repository::PuzzleRepository;
use crate::scoring;
use crate::selector::AdaptiveSelector;
use crate::session::{Session, SessionStatus};
use crate::settings::UserSettings;
use crate::storage::settings_key;
use crate::validator::{MoveOutcome, SolutionValidator};

pub struct Trainer {
    user_id: String,
    repository: Arc<PuzzleRepository>,
    rules: Arc<dyn ChessRules>,
    promotion_policy: PromotionPolicy,
    selector: AdaptiveSelector,
    tracker: ProgressTracker,
    persister: Option<Persister>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    settings: UserSettings,
    statistics: Option<UserStatistics>,
    session: Option<Session>,
    /// Status while no session exists (menu or loading)
    idle_status: SessionStatus,
    last_puzzle_id: Option<String>,
    events: Vec<TrainerEvent>,
}

impl Trainer {
    pub fn new(
        user_id: impl Into<String>,
        repository: Arc<PuzzleRepository>,
        rules: Arc<dyn ChessRules>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            repository,
            rules,
            promotion_policy: PromotionPolicy::default(),
            selector: AdaptiveSelector::default(),
            tracker: ProgressTracker::default(),
            persister: None,
            clock: Arc::new(SystemClock),
            rng: StdRng::from_entropy(),
            settings: UserSettings::default(),
            statistics: None,
            session: None,
            idle_status: SessionStatus::Menu,
            last_puzzle_id: None,
            events: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: &TrainerConfig) -> Self {
        self.promotion_policy = config.promotion_policy;
        self.selector = AdaptiveSelector::new(config.min_theme_attempts);
        self
    }

    pub fn with_promotion_policy(mut self, policy: PromotionPolicy) -> Self {
        self.promotion_policy = policy;
        self
    }

    pub fn with_persister(mut self, persister: Persister) -> Self {
        self.tracker = ProgressTracker::new(Some(persister.clone()));
        self.persister = Some(persister);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_settings(mut self, settings: UserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Statistics restored from storage. Ignored if they belong to
    /// someone else.
    pub fn with_statistics(mut self, statistics: Option<UserStatistics>) -> Self {
        self.statistics = statistics.filter(|s| {
            let ours = s.user_id == self.user_id;
            if !ours {
                warn!(expected = %self.user_id, found = %s.user_id, "Ignoring statistics for another user");
            }
            ours
        });
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(self.idle_status)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn statistics(&self) -> Option<&UserStatistics> {
        self.statistics.as_ref()
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn repository(&self) -> &PuzzleRepository {
        &self.repository
    }

    /// Drain pending UI events.
    pub fn take_events(&mut self) -> Vec<TrainerEvent> {
        mem::take(&mut self.events)
    }

    pub fn update_settings(&mut self, settings: UserSettings) {
        self.settings = settings;
        if let Some(persister) = &self.persister {
            match serde_json::to_value(&self.settings) {
                Ok(value) => persister.enqueue(settings_key(&self.user_id), value),
                Err(e) => warn!(error = %e, "Could not serialize settings"),
            }
        }
    }

    /// Load a specific puzzle, or let the selector choose when `id` is
    /// `None`. An active session is abandoned (and recorded as failed).
    pub fn load_puzzle(&mut self, id: Option<&str>) -> Result<Arc<Puzzle>, TrainerError> {
        if self.status().is_active() {
            self.abandon();
        }
        self.session = None;
        self.idle_status = SessionStatus::Loading;

        let found = match id {
            Some(id) => self
                .repository
                .get(id)
                .ok_or_else(|| TrainerError::PuzzleNotFound(id.to_string())),
            None => self
                .selector
                .select_next(
                    &self.repository,
                    self.statistics.as_ref(),
                    &self.settings,
                    self.last_puzzle_id.as_deref(),
                    &mut self.rng,
                )
                .ok_or(TrainerError::NoPuzzleAvailable),
        };

        let puzzle = match found {
            Ok(puzzle) => puzzle,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Puzzle load failed");
                self.idle_status = SessionStatus::Menu;
                self.events.push(TrainerEvent::LoadFailed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        info!(user_id = %self.user_id, puzzle_id = %puzzle.id, theme = %puzzle.theme, "Puzzle loaded");
        self.events.push(TrainerEvent::PuzzleLoaded {
            puzzle_id: puzzle.id.clone(),
            fen: puzzle.fen.clone(),
            theme: puzzle.theme.clone(),
            rating: puzzle.rating,
            player_moves: puzzle.player_move_count(),
        });
        self.last_puzzle_id = Some(puzzle.id.clone());
        self.session = Some(Session::new(Arc::clone(&puzzle), self.clock.now()));
        self.idle_status = SessionStatus::Menu;
        Ok(puzzle)
    }

    /// Move on after a solved or failed puzzle.
    pub fn load_next_puzzle(&mut self) -> Result<Arc<Puzzle>, TrainerError> {
        self.require(&[SessionStatus::Solved, SessionStatus::Failed], "load the next puzzle")?;
        self.load_puzzle(None)
    }

    pub fn make_move(&mut self, candidate: &str) -> Result<MoveOutcome, TrainerError> {
        self.require(&[SessionStatus::Playing], "make a move")?;

        let validator = SolutionValidator::new(self.rules.as_ref(), self.promotion_policy);
        let Some(session) = self.session.as_mut() else {
            return Err(self.invalid("make a move"));
        };
        let outcome = validator.accept(session, candidate);

        if !outcome.accepted {
            self.events.push(TrainerEvent::MoveRejected {
                candidate: candidate.to_string(),
                attempts: session.attempts_count,
            });
            return Ok(outcome);
        }

        if let Some(played) = &outcome.played {
            self.events.push(TrainerEvent::MoveAccepted {
                san: played.san.clone(),
                fen: played.fen_after.clone(),
                opponent_reply: outcome.opponent_reply.as_ref().map(|r| r.san.clone()),
                fen_after_reply: outcome.opponent_reply.as_ref().map(|r| r.fen_after.clone()),
            });
        }

        if outcome.session_complete {
            self.finish(true);
        }
        Ok(outcome)
    }

    /// Reveal the expected move. Does not touch the board or the score.
    pub fn show_hint(&mut self) -> Result<String, TrainerError> {
        self.require(&[SessionStatus::Playing], "show a hint")?;
        let expected = self
            .session
            .as_ref()
            .and_then(|s| s.expected_move())
            .map(str::to_owned)
            .ok_or_else(|| self.invalid("show a hint"))?;
        let Some(session) = self.session.as_mut() else {
            return Err(self.invalid("show a hint"));
        };

        session.hints_used += 1;
        self.events.push(TrainerEvent::HintRevealed {
            expected: expected.clone(),
            hints_used: session.hints_used,
        });
        Ok(expected)
    }

    pub fn give_up(&mut self) -> Result<SessionOutcome, TrainerError> {
        self.require(&[SessionStatus::Playing, SessionStatus::Paused], "give up")?;
        self.finish(false).ok_or_else(|| self.invalid("give up"))
    }

    pub fn pause_game(&mut self) -> Result<(), TrainerError> {
        self.require(&[SessionStatus::Playing], "pause")?;
        let now = self.clock.now();
        if let Some(session) = self.session.as_mut() {
            session.pause(now);
        }
        self.events.push(TrainerEvent::Paused);
        Ok(())
    }

    pub fn resume_game(&mut self) -> Result<(), TrainerError> {
        self.require(&[SessionStatus::Paused], "resume")?;
        let now = self.clock.now();
        if let Some(session) = self.session.as_mut() {
            session.resume(now);
        }
        self.events.push(TrainerEvent::Resumed);
        Ok(())
    }

    /// Leave the current puzzle. An unfinished one counts as a failure.
    pub fn return_to_menu(&mut self) {
        if self.status().is_active() {
            self.abandon();
        }
        self.session = None;
        self.idle_status = SessionStatus::Menu;
    }

    fn abandon(&mut self) {
        if let Some(session) = &self.session {
            debug!(puzzle_id = %session.puzzle.id, "Abandoning active puzzle");
        }
        self.finish(false);
    }

    /// Close the session: freeze time, score, update statistics.
    fn finish(&mut self, success: bool) -> Option<SessionOutcome> {
        let now = self.clock.now();
        let session = self.session.as_mut()?;

        let status = if success {
            SessionStatus::Solved
        } else {
            SessionStatus::Failed
        };
        let time_spent_seconds = session.finish(status, now);
        let puzzle = Arc::clone(&session.puzzle);
        let score = scoring::score(&puzzle, time_spent_seconds, session.attempts_count, success);

        let outcome = SessionOutcome {
            puzzle_id: puzzle.id.clone(),
            success,
            time_spent_seconds,
            attempts: session.attempts_count,
            hints_used: session.hints_used,
            score,
            finished_at: now,
        };

        self.events.push(if success {
            TrainerEvent::PuzzleSolved {
                puzzle_id: puzzle.id.clone(),
                score,
                time_spent_seconds,
                attempts: outcome.attempts,
            }
        } else {
            TrainerEvent::PuzzleFailed {
                puzzle_id: puzzle.id.clone(),
                time_spent_seconds,
                attempts: outcome.attempts,
            }
        });

        let stats = self
            .statistics
            .get_or_insert_with(|| UserStatistics::new(self.user_id.clone()));
        self.tracker.record_outcome(stats, &puzzle, &outcome);
        self.events.push(TrainerEvent::StatisticsUpdated {
            puzzles_solved: stats.puzzles_solved,
            streak_current: stats.streak_current,
            streak_best: stats.streak_best,
        });

        info!(
            user_id = %self.user_id,
            puzzle_id = %puzzle.id,
            success,
            score,
            time_spent_seconds,
            "Puzzle finished"
        );
        Some(outcome)
    }

    fn require(&self, allowed: &[SessionStatus], action: &'static str) -> Result<(), TrainerError> {
        if allowed.contains(&self.status()) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> TrainerError {
        TrainerError::InvalidTransition {
            action,
            status: self.status(),
        }
    }
}
