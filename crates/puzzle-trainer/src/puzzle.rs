//! Puzzle data model

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest rating a puzzle may carry.
pub const MIN_RATING: u32 = 500;
/// Highest rating a puzzle may carry.
pub const MAX_RATING: u32 = 3000;

/// Coarse difficulty band, derived from rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,     // rating < 1300
    Intermediate, // 1300..=1699
    Advanced,     // >= 1700
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    /// The band a rating belongs to.
    pub fn for_rating(rating: u32) -> Self {
        match rating {
            0..=1299 => Self::Beginner,
            1300..=1699 => Self::Intermediate,
            _ => Self::Advanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position with a known-correct line.
///
/// `solution` alternates player move, forced reply, player move, ... so
/// even indices are the player's and odd indices are auto-played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub id: String,
    pub theme: String,
    pub fen: String,
    pub solution: Vec<String>,
    pub difficulty: Difficulty,
    pub rating: u32,
    pub points: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Puzzle {
    pub fn is_player_ply(index: usize) -> bool {
        index % 2 == 0
    }

    pub fn is_opponent_ply(index: usize) -> bool {
        !Self::is_player_ply(index)
    }

    /// Number of moves the player has to find.
    pub fn player_move_count(&self) -> usize {
        self.solution.len().div_ceil(2)
    }

    /// Whether `difficulty` agrees with the rating band.
    pub fn difficulty_matches_rating(&self) -> bool {
        Difficulty::for_rating(self.rating) == self.difficulty
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Raw shape of a collection entry, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleRecord {
    pub id: Option<String>,
    pub theme: Option<String>,
    pub fen: Option<String>,
    pub solution: Option<Vec<String>>,
    pub difficulty: Option<String>,
    pub rating: Option<i64>,
    pub points: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bands() {
        assert_eq!(Difficulty::for_rating(500), Difficulty::Beginner);
        assert_eq!(Difficulty::for_rating(1299), Difficulty::Beginner);
        assert_eq!(Difficulty::for_rating(1300), Difficulty::Intermediate);
        assert_eq!(Difficulty::for_rating(1550), Difficulty::Intermediate);
        assert_eq!(Difficulty::for_rating(1699), Difficulty::Intermediate);
        assert_eq!(Difficulty::for_rating(1700), Difficulty::Advanced);
        assert_eq!(Difficulty::for_rating(3000), Difficulty::Advanced);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("Advanced"), Some(Difficulty::Advanced));
        assert_eq!(Difficulty::parse(" beginner "), Some(Difficulty::Beginner));
        assert_eq!(Difficulty::parse("expert"), None);
    }

    #[test]
    fn test_ply_parity() {
        assert!(Puzzle::is_player_ply(0));
        assert!(Puzzle::is_opponent_ply(1));
        assert!(Puzzle::is_player_ply(2));
    }

    #[test]
    fn test_player_move_count() {
        let mut puzzle = Puzzle {
            id: "p".into(),
            theme: "mate".into(),
            fen: String::new(),
            solution: vec!["Ra7".into()],
            difficulty: Difficulty::Beginner,
            rating: 900,
            points: 10,
            tags: BTreeSet::new(),
        };
        assert_eq!(puzzle.player_move_count(), 1);
        puzzle.solution = vec!["Ra7".into(), "Kg8".into(), "Rb8#".into()];
        assert_eq!(puzzle.player_move_count(), 2);
    }

    #[test]
    fn test_puzzle_json_shape() {
        let json = r#"{
            "id": "a1",
            "theme": "fork",
            "fen": "8/8/8/8/8/8/8/8 w - - 0 1",
            "solution": ["Nc7+"],
            "difficulty": "intermediate",
            "rating": 1400,
            "points": 12,
            "tags": ["short"]
        }"#;
        let puzzle: Puzzle = serde_json::from_str(json).unwrap();
        assert_eq!(puzzle.difficulty, Difficulty::Intermediate);
        assert!(puzzle.has_tag("short"));
        assert!(puzzle.difficulty_matches_rating());
    }
}
