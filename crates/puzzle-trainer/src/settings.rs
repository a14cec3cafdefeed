//! User preferences.

use serde::{Deserialize, Serialize};

use crate::puzzle::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardOrientation {
    /// Follow the side to move in the puzzle
    #[default]
    Auto,
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDifficulty {
    /// No difficulty constraint
    #[default]
    Auto,
    Beginner,
    Intermediate,
    Advanced,
}

impl TargetDifficulty {
    pub fn as_difficulty(&self) -> Option<Difficulty> {
        match self {
            Self::Auto => None,
            Self::Beginner => Some(Difficulty::Beginner),
            Self::Intermediate => Some(Difficulty::Intermediate),
            Self::Advanced => Some(Difficulty::Advanced),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("auto") {
            return Some(Self::Auto);
        }
        Difficulty::parse(value).map(Self::from)
    }
}

impl From<Difficulty> for TargetDifficulty {
    fn from(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Beginner => Self::Beginner,
            Difficulty::Intermediate => Self::Intermediate,
            Difficulty::Advanced => Self::Advanced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub board_orientation: BoardOrientation,
    pub preferred_themes: Vec<String>,
    pub difficulty: TargetDifficulty,
}
