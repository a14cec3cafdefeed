//! Solution validation: checks a candidate move against the expected entry
//! of the solution line and plays forced replies.

use chess_core::notation::strip_annotations;
use chess_core::{
    moves_match, parse_long_algebraic, AppliedMove, CanonicalMove, ChessRules, PromotionPolicy,
    RulesError,
};
use tracing::{debug, warn};

use crate::puzzle::Puzzle;
use crate::session::{Session, SessionStatus};

/// Result of submitting one candidate move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub accepted: bool,
    pub session_complete: bool,
    /// The player's move as played, when accepted
    pub played: Option<AppliedMove>,
    /// Forced reply the board adapter should animate
    pub opponent_reply: Option<AppliedMove>,
}

impl MoveOutcome {
    fn rejected() -> Self {
        Self {
            accepted: false,
            session_complete: false,
            played: None,
            opponent_reply: None,
        }
    }
}

pub struct SolutionValidator<'a> {
    rules: &'a dyn ChessRules,
    policy: PromotionPolicy,
}

impl<'a> SolutionValidator<'a> {
    pub fn new(rules: &'a dyn ChessRules, policy: PromotionPolicy) -> Self {
        Self { rules, policy }
    }

    /// Check `candidate` against `solution[expected_index]`.
    ///
    /// A match advances the cursor, auto-plays a following opponent reply
    /// and marks the session solved once the line is exhausted. A mismatch
    /// only bumps `attempts_count`. A finished session is left untouched.
    pub fn accept(&self, session: &mut Session, candidate: &str) -> MoveOutcome {
        if session.status != SessionStatus::Playing || session.is_complete() {
            return MoveOutcome::rejected();
        }
        session.attempts_count += 1;

        let Some(expected) = session.expected_move().map(str::to_owned) else {
            return MoveOutcome::rejected();
        };

        let played = match self.rules.apply(&session.position, candidate) {
            Ok(applied) => applied,
            Err(e) => {
                debug!(puzzle_id = %session.puzzle.id, %candidate, error = %e, "Candidate not playable");
                return MoveOutcome::rejected();
            }
        };

        let Some(expected_move) = self.resolve_expected(&session.position, &expected) else {
            warn!(
                puzzle_id = %session.puzzle.id,
                index = session.expected_index,
                %expected,
                "Solution entry cannot be resolved in the current position"
            );
            return MoveOutcome::rejected();
        };

        if !moves_match(&expected_move, &played.canonical, self.policy) {
            debug!(puzzle_id = %session.puzzle.id, %candidate, %expected, "Wrong move");
            return MoveOutcome::rejected();
        }

        let reply_index = session.expected_index + 1;
        let opponent_reply = if reply_index < session.puzzle.solution.len()
            && Puzzle::is_opponent_ply(reply_index)
        {
            let entry = &session.puzzle.solution[reply_index];
            match apply_solution_entry(self.rules, &played.fen_after, entry) {
                Ok(reply) => Some(reply),
                Err(e) => {
                    warn!(puzzle_id = %session.puzzle.id, %entry, error = %e, "Forced reply not playable");
                    return MoveOutcome::rejected();
                }
            }
        } else {
            None
        };

        session.advance(played.san.clone(), played.fen_after.clone());
        if let Some(reply) = &opponent_reply {
            session.advance(reply.san.clone(), reply.fen_after.clone());
        }

        let session_complete = session.is_complete();
        if session_complete {
            session.status = SessionStatus::Solved;
        }

        MoveOutcome {
            accepted: true,
            session_complete,
            played: Some(played),
            opponent_reply,
        }
    }

    /// Canonical form of a solution entry. A promotion written without a
    /// piece (`e7e8`, `e8`, `exd8`) is resolved as a queen promotion and
    /// then left open.
    fn resolve_expected(&self, fen: &str, entry: &str) -> Option<CanonicalMove> {
        match self.rules.apply(fen, entry) {
            Ok(applied) => Some(applied.canonical),
            Err(_) => {
                let queened = with_queen(entry)?;
                let applied = self.rules.apply(fen, &queened).ok()?;
                Some(CanonicalMove {
                    promotion: None,
                    ..applied.canonical
                })
            }
        }
    }
}

/// Play a solution entry, promoting to a queen when the entry leaves the
/// piece unspecified.
pub(crate) fn apply_solution_entry(
    rules: &dyn ChessRules,
    fen: &str,
    entry: &str,
) -> Result<AppliedMove, RulesError> {
    match rules.apply(fen, entry) {
        Ok(applied) => Ok(applied),
        Err(e) => match with_queen(entry) {
            Some(queened) => rules.apply(fen, &queened).map_err(|_| e),
            None => Err(e),
        },
    }
}

/// `entry` with a queen promotion added, in its own notation. `None` when
/// it already names a piece.
fn with_queen(entry: &str) -> Option<String> {
    let text = strip_annotations(entry);
    match parse_long_algebraic(text) {
        Ok(canonical) if canonical.promotion.is_none() => Some(format!("{canonical}q")),
        Ok(_) => None,
        Err(_) if !text.contains('=') => Some(format!("{text}=Q")),
        Err(_) => None,
    }
}
