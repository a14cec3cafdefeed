//! Puzzle score calculation.
//!
//! `points + max(0, 100 - seconds) + difficulty bonus - 10 per extra attempt`,
//! floored at 1 for any solve and 0 for a failure. Hints are not penalized.

use crate::puzzle::{Difficulty, Puzzle};

/// Seconds after which the speed bonus is gone.
pub const TIME_BONUS_WINDOW_SECS: u64 = 100;

/// Points lost per attempt beyond the first.
pub const ATTEMPT_PENALTY: u32 = 10;

pub fn difficulty_bonus(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Beginner => 0,
        Difficulty::Intermediate => 50,
        Difficulty::Advanced => 100,
    }
}

pub fn time_bonus(time_spent_seconds: u64) -> u32 {
    TIME_BONUS_WINDOW_SECS.saturating_sub(time_spent_seconds) as u32
}

pub fn attempt_penalty(attempts: u32) -> u32 {
    attempts.saturating_sub(1).saturating_mul(ATTEMPT_PENALTY)
}

pub fn score(puzzle: &Puzzle, time_spent_seconds: u64, attempts: u32, success: bool) -> u32 {
    if !success {
        return 0;
    }

    let gross = i64::from(puzzle.points)
        + i64::from(time_bonus(time_spent_seconds))
        + i64::from(difficulty_bonus(puzzle.difficulty));
    let net = gross - i64::from(attempt_penalty(attempts));

    net.clamp(1, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn puzzle(points: u32, difficulty: Difficulty) -> Puzzle {
        Puzzle {
            id: "s".into(),
            theme: "fork".into(),
            fen: String::new(),
            solution: vec!["Nxe5".into()],
            difficulty,
            rating: 1000,
            points,
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn test_fast_first_try_beginner() {
        assert_eq!(score(&puzzle(10, Difficulty::Beginner), 10, 1, true), 100);
    }

    #[test]
    fn test_failure_scores_zero() {
        assert_eq!(score(&puzzle(500, Difficulty::Advanced), 0, 1, false), 0);
    }

    #[test]
    fn test_difficulty_bonus_applies() {
        assert_eq!(score(&puzzle(10, Difficulty::Intermediate), 100, 1, true), 60);
        assert_eq!(score(&puzzle(10, Difficulty::Advanced), 250, 1, true), 110);
    }

    #[test]
    fn test_attempt_penalty() {
        assert_eq!(score(&puzzle(10, Difficulty::Beginner), 100, 3, true), 1);
        assert_eq!(score(&puzzle(50, Difficulty::Beginner), 90, 3, true), 40);
        assert_eq!(attempt_penalty(0), 0);
        assert_eq!(attempt_penalty(1), 0);
        assert_eq!(attempt_penalty(4), 30);
    }

    #[test]
    fn test_solve_never_scores_zero() {
        assert_eq!(score(&puzzle(0, Difficulty::Beginner), 10_000, 1_000, true), 1);
    }

    #[test]
    fn test_monotonic_in_time_and_attempts() {
        let p = puzzle(20, Difficulty::Intermediate);
        for attempts in 1..8 {
            let mut last = u32::MAX;
            for secs in (0..150).step_by(7) {
                let s = score(&p, secs, attempts, true);
                assert!(s <= last);
                last = s;
            }
        }
        for secs in [0, 30, 99, 100, 500] {
            let mut last = u32::MAX;
            for attempts in 1..20 {
                let s = score(&p, secs, attempts, true);
                assert!(s <= last);
                last = s;
            }
        }
    }
}
