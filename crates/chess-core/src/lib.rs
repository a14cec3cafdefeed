//! Chess primitives shared by the trainer: move notation and the rules
//! collaborator.

pub mod notation;
pub mod rules;

pub use notation::{moves_match, parse_long_algebraic, CanonicalMove, NotationError, PromotionPolicy};
pub use rules::{AppliedMove, ChessRules, RulesError, ShakmatyRules};
