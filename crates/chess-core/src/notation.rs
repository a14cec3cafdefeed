//! Move notation canonicalization.
//!
//! Every accepted notation is reduced to a `(from, to, promotion)` triple
//! before two moves are compared, so the matching policy lives in one place.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::{Role, Square};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("Empty move notation")]
    Empty,

    #[error("Not long algebraic notation: {0}")]
    NotLongAlgebraic(String),

    #[error("Invalid square in {0}")]
    InvalidSquare(String),

    #[error("Invalid promotion piece in {0}")]
    InvalidPromotion(String),
}

/// A move reduced to the squares it connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl CanonicalMove {
    pub fn new(from: Square, to: Square, promotion: Option<Role>) -> Self {
        Self { from, to, promotion }
    }
}

/// Renders as UCI, e.g. `e7e8q`.
impl fmt::Display for CanonicalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

/// How strictly promotion pieces are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionPolicy {
    /// A solution entry without a promotion piece accepts any promotion
    /// reaching the same square.
    #[default]
    Permissive,
    /// Promotion pieces must be identical.
    Strict,
}

impl PromotionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Strip check/mate markers and annotation glyphs (`+`, `#`, `!`, `?`).
pub fn strip_annotations(notation: &str) -> &str {
    notation
        .trim()
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
}

/// Parse long algebraic notation without a position.
///
/// Accepts plain UCI (`e2e4`, `e7e8q`) as well as the separated forms
/// `e2-e4`, `e4xd5` and `e7-e8=Q`.
pub fn parse_long_algebraic(notation: &str) -> Result<CanonicalMove, NotationError> {
    let text = strip_annotations(notation);
    if text.is_empty() {
        return Err(NotationError::Empty);
    }

    let compact: Vec<u8> = text
        .bytes()
        .enumerate()
        // 'x' only acts as a separator between the two squares
        .filter(|&(i, b)| !(b == b'-' || b == b'=' || (b == b'x' && i == 2)))
        .map(|(_, b)| b)
        .collect();

    if compact.len() != 4 && compact.len() != 5 {
        return Err(NotationError::NotLongAlgebraic(notation.to_string()));
    }

    let from = Square::from_ascii(&compact[0..2])
        .map_err(|_| NotationError::InvalidSquare(notation.to_string()))?;
    let to = Square::from_ascii(&compact[2..4])
        .map_err(|_| NotationError::InvalidSquare(notation.to_string()))?;

    let promotion = match compact.get(4) {
        None => None,
        Some(&b) => match Role::from_char(b.to_ascii_lowercase() as char) {
            Some(role @ (Role::Knight | Role::Bishop | Role::Rook | Role::Queen)) => Some(role),
            _ => return Err(NotationError::InvalidPromotion(notation.to_string())),
        },
    };

    Ok(CanonicalMove::new(from, to, promotion))
}

/// Decide whether `candidate` plays the move `expected` asks for.
pub fn moves_match(expected: &CanonicalMove, candidate: &CanonicalMove, policy: PromotionPolicy) -> bool {
    if expected.from != candidate.from || expected.to != candidate.to {
        return false;
    }
    match (expected.promotion, policy) {
        (None, PromotionPolicy::Permissive) => true,
        (promotion, _) => promotion == candidate.promotion,
    }
}
