//! Trainer error types

use thiserror::Error;

use crate::session::SessionStatus;

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Puzzle not found: {0}")]
    PuzzleNotFound(String),

    #[error("No puzzle available")]
    NoPuzzleAvailable,

    #[error("Cannot {action} while {status}")]
    InvalidTransition {
        action: &'static str,
        status: SessionStatus,
    },

    #[error("Puzzle collection error: {0}")]
    Collection(String),

    #[error("Statistics import error: {0}")]
    Import(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
