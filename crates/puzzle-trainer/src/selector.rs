//! Adaptive next-puzzle selection.
//!
//! Steers the player toward their weakest theme: the theme with the lowest
//! solved/attempts ratio among themes with enough history. Filters are
//! loosened step by step until something matches.

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::progress::UserStatistics;
use crate::puzzle::Puzzle;
use crate::repository::{PuzzleFilter, PuzzleRepository};
use crate::settings::UserSettings;

/// Default number of finished sessions before a theme counts.
pub const MIN_THEME_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct AdaptiveSelector {
    min_theme_attempts: u32,
}

impl Default for AdaptiveSelector {
    fn default() -> Self {
        Self::new(MIN_THEME_ATTEMPTS)
    }
}

impl AdaptiveSelector {
    pub fn new(min_theme_attempts: u32) -> Self {
        Self { min_theme_attempts }
    }

    /// Lowest success rate among themes meeting the attempt floor. Ties go
    /// to the alphabetically first theme.
    pub fn weakest_theme<'a>(&self, stats: &'a UserStatistics) -> Option<&'a str> {
        stats
            .theme_progress
            .iter()
            .filter(|(_, p)| p.attempts >= self.min_theme_attempts)
            .min_by(|(_, a), (_, b)| a.success_rate().total_cmp(&b.success_rate()))
            .map(|(theme, _)| theme.as_str())
    }

    /// Choose the next puzzle.
    ///
    /// Without statistics the settings difficulty applies. Once statistics
    /// exist, an unsolved puzzle from the weakest theme wins regardless of
    /// difficulty or what was just played. Otherwise any theme will do.
    /// `exclude` keeps the puzzle just played out of the fallback draws
    /// unless it is the only one left.
    pub fn select_next<R: Rng + ?Sized>(
        &self,
        repository: &PuzzleRepository,
        stats: Option<&UserStatistics>,
        settings: &UserSettings,
        exclude: Option<&str>,
        rng: &mut R,
    ) -> Option<Arc<Puzzle>> {
        let mut attempts: Vec<PuzzleFilter> = Vec::new();

        match stats {
            None => {
                attempts.push(
                    PuzzleFilter::new()
                        .difficulty(settings.difficulty.as_difficulty())
                        .exclude(exclude),
                );
            }
            Some(stats) => {
                if let Some(theme) = self.weakest_theme(stats) {
                    debug!(%theme, "Targeting weakest theme");
                    attempts.push(
                        PuzzleFilter::new()
                            .theme(theme)
                            .exclude(stats.solved_puzzle_ids.iter().cloned()),
                    );
                }
            }
        }

        attempts.push(PuzzleFilter::new().exclude(exclude));
        // Loosest: allow a repeat
        attempts.push(PuzzleFilter::new());

        attempts
            .iter()
            .find_map(|filter| repository.random_pick(filter, &mut *rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ThemeProgress;
    use crate::puzzle::Difficulty;
    use crate::settings::TargetDifficulty;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn puzzle(id: &str, theme: &str, rating: u32) -> Puzzle {
        Puzzle {
            id: id.into(),
            theme: theme.into(),
            fen: String::new(),
            solution: vec!["e4".into()],
            difficulty: Difficulty::for_rating(rating),
            rating,
            points: 10,
            tags: BTreeSet::new(),
        }
    }

    fn repo() -> PuzzleRepository {
        PuzzleRepository::from_trusted(vec![
            puzzle("fork-1", "fork", 900),
            puzzle("fork-2", "fork", 1400),
            puzzle("pin-1", "pin", 900),
            puzzle("pin-2", "pin", 1800),
            puzzle("mate-1", "mate", 1200),
        ])
    }

    fn stats_with(themes: &[(&str, u32, u32)]) -> UserStatistics {
        let mut stats = UserStatistics::new("u");
        for &(theme, solved, attempts) in themes {
            stats.theme_progress.insert(
                theme.to_string(),
                ThemeProgress {
                    solved,
                    attempts,
                    average_time: 0.0,
                },
            );
        }
        stats
    }

    #[test]
    fn test_weakest_theme_respects_floor() {
        let selector = AdaptiveSelector::default();
        let stats = stats_with(&[("fork", 1, 5), ("pin", 4, 5), ("mate", 0, 2)]);
        assert_eq!(selector.weakest_theme(&stats), Some("fork"));

        let thin = stats_with(&[("fork", 0, 2), ("pin", 0, 1)]);
        assert_eq!(selector.weakest_theme(&thin), None);
    }

    #[test]
    fn test_weakest_theme_tie_is_alphabetical() {
        let selector = AdaptiveSelector::default();
        let stats = stats_with(&[("pin", 1, 4), ("fork", 1, 4)]);
        assert_eq!(selector.weakest_theme(&stats), Some("fork"));
    }

    #[test]
    fn test_prefers_unsolved_weak_theme() {
        let selector = AdaptiveSelector::default();
        let mut stats = stats_with(&[("fork", 1, 5), ("pin", 4, 5)]);
        stats.solved_puzzle_ids.insert("fork-1".into());
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..25 {
            let pick = selector
                .select_next(&repo(), Some(&stats), &UserSettings::default(), None, &mut rng)
                .unwrap();
            assert_eq!(pick.id, "fork-2");
        }
    }

    #[test]
    fn test_weak_theme_exhausted_falls_back() {
        let selector = AdaptiveSelector::default();
        let mut stats = stats_with(&[("fork", 1, 5), ("pin", 4, 5)]);
        stats.solved_puzzle_ids.insert("fork-1".into());
        stats.solved_puzzle_ids.insert("fork-2".into());
        let mut rng = StdRng::seed_from_u64(3);

        let pick = selector.select_next(&repo(), Some(&stats), &UserSettings::default(), None, &mut rng);
        assert!(pick.is_some());
    }

    #[test]
    fn test_weak_theme_ignores_difficulty_setting() {
        let selector = AdaptiveSelector::default();
        let mut stats = stats_with(&[("fork", 1, 5), ("pin", 4, 5)]);
        stats.solved_puzzle_ids.insert("fork-2".into());
        let settings = UserSettings {
            difficulty: TargetDifficulty::Advanced,
            ..UserSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..25 {
            let pick = selector
                .select_next(&repo(), Some(&stats), &settings, None, &mut rng)
                .unwrap();
            assert_eq!(pick.id, "fork-1");
        }
    }

    #[test]
    fn test_weak_theme_serves_puzzle_just_given_up() {
        let selector = AdaptiveSelector::default();
        let mut stats = stats_with(&[("fork", 1, 5), ("pin", 4, 5)]);
        stats.solved_puzzle_ids.insert("fork-2".into());
        let mut rng = StdRng::seed_from_u64(6);

        for _ in 0..25 {
            let pick = selector
                .select_next(&repo(), Some(&stats), &UserSettings::default(), Some("fork-1"), &mut rng)
                .unwrap();
            assert_eq!(pick.id, "fork-1");
        }
    }

    #[test]
    fn test_thin_history_ignores_difficulty_setting() {
        let selector = AdaptiveSelector::default();
        let stats = stats_with(&[("fork", 0, 1)]);
        let settings = UserSettings {
            difficulty: TargetDifficulty::Advanced,
            ..UserSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(11);

        let mut seen = BTreeSet::new();
        for _ in 0..100 {
            let pick = selector
                .select_next(&repo(), Some(&stats), &settings, Some("mate-1"), &mut rng)
                .unwrap();
            assert_ne!(pick.id, "mate-1");
            seen.insert(pick.id.clone());
        }
        assert_eq!(seen.len(), 4, "expected every other puzzle, got {seen:?}");
    }

    #[test]
    fn test_cold_start_uses_difficulty_setting() {
        let selector = AdaptiveSelector::default();
        let settings = UserSettings {
            difficulty: TargetDifficulty::Advanced,
            ..UserSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..10 {
            let pick = selector.select_next(&repo(), None, &settings, None, &mut rng).unwrap();
            assert_eq!(pick.id, "pin-2");
        }
    }

    #[test]
    fn test_excluded_puzzle_not_repeated() {
        let selector = AdaptiveSelector::default();
        let settings = UserSettings {
            difficulty: TargetDifficulty::Advanced,
            ..UserSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(9);

        // Only advanced puzzle is excluded, so the difficulty constraint is loosened
        let pick = selector
            .select_next(&repo(), None, &settings, Some("pin-2"), &mut rng)
            .unwrap();
        assert_ne!(pick.id, "pin-2");
    }

    #[test]
    fn test_single_puzzle_can_repeat() {
        let selector = AdaptiveSelector::default();
        let repo = PuzzleRepository::from_trusted(vec![puzzle("only", "fork", 900)]);
        let mut rng = StdRng::seed_from_u64(0);
        let pick = selector
            .select_next(&repo, None, &UserSettings::default(), Some("only"), &mut rng)
            .unwrap();
        assert_eq!(pick.id, "only");
    }

    #[test]
    fn test_empty_repository_yields_none() {
        let selector = AdaptiveSelector::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(selector
            .select_next(&PuzzleRepository::default(), None, &UserSettings::default(), None, &mut rng)
            .is_none());
    }
}
