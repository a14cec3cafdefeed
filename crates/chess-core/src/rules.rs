//! Chess rules collaborator.
//!
//! The trainer never decides legality itself. It hands a FEN and a move in
//! whatever notation the player used to a `ChessRules` implementation and
//! gets back the canonical move plus the resulting position.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};
use thiserror::Error;

use crate::notation::{parse_long_algebraic, strip_annotations, CanonicalMove};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Unrecognized move notation: {0}")]
    UnrecognizedNotation(String),

    #[error("Illegal move {notation} in {fen}")]
    IllegalMove { notation: String, fen: String },
}

/// A legal move applied to a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub canonical: CanonicalMove,
    /// SAN including the `+`/`#` suffix.
    pub san: String,
    pub fen_after: String,
    pub gives_checkmate: bool,
}

/// Legality oracle consumed by the trainer.
pub trait ChessRules: Send + Sync {
    /// Check that `fen` describes a playable position.
    fn validate_fen(&self, fen: &str) -> Result<(), RulesError>;

    /// Resolve `notation` (long algebraic or SAN) in `fen` and play it.
    fn apply(&self, fen: &str, notation: &str) -> Result<AppliedMove, RulesError>;
}

/// `ChessRules` backed by shakmaty, standard castling only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl ShakmatyRules {
    pub fn new() -> Self {
        Self
    }

    fn position(fen: &str) -> Result<Chess, RulesError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{fen}: {e}")))?;
        parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen(format!("{fen}: {e}")))
    }

    fn resolve(pos: &Chess, fen: &str, notation: &str) -> Result<Move, RulesError> {
        let illegal = || RulesError::IllegalMove {
            notation: notation.to_string(),
            fen: fen.to_string(),
        };

        // Long algebraic first: "e2e4" would not parse as SAN anyway
        if let Ok(canonical) = parse_long_algebraic(notation) {
            let uci = UciMove::Normal {
                from: canonical.from,
                to: canonical.to,
                promotion: canonical.promotion,
            };
            return uci.to_move(pos).map_err(|_| illegal());
        }

        let san: San = strip_annotations(notation)
            .parse()
            .map_err(|_| RulesError::UnrecognizedNotation(notation.to_string()))?;
        san.to_move(pos).map_err(|_| illegal())
    }
}

impl ChessRules for ShakmatyRules {
    fn validate_fen(&self, fen: &str) -> Result<(), RulesError> {
        Self::position(fen).map(|_| ())
    }

    fn apply(&self, fen: &str, notation: &str) -> Result<AppliedMove, RulesError> {
        let mut pos = Self::position(fen)?;
        let mv = Self::resolve(&pos, fen, notation)?;

        let canonical = match mv.to_uci(CastlingMode::Standard) {
            UciMove::Normal { from, to, promotion } => CanonicalMove::new(from, to, promotion),
            _ => return Err(RulesError::UnrecognizedNotation(notation.to_string())),
        };

        let mut san = San::from_move(&pos, mv.clone()).to_string();
        pos.play_unchecked(mv);

        let gives_checkmate = pos.is_checkmate();
        if gives_checkmate {
            san.push('#');
        } else if pos.is_check() {
            san.push('+');
        }

        let fen_after = Fen::from_position(&pos, EnPassantMode::Legal).to_string();
        tracing::trace!(%notation, %canonical, %fen_after, "Applied move");

        Ok(AppliedMove {
            canonical,
            san,
            fen_after,
            gives_checkmate,
        })
    }
}
