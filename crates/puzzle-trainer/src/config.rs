//! Trainer configuration from environment variables

use std::env;
use std::path::PathBuf;

use chess_core::PromotionPolicy;

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainerConfig {
    /// JSON array of puzzle records
    pub puzzles_path: PathBuf,

    /// Directory holding one JSON file per persisted key
    pub storage_dir: PathBuf,

    /// Profile the statistics and settings belong to
    pub user_id: String,

    /// Sessions a theme needs before it can be picked as the weakest
    pub min_theme_attempts: u32,

    pub promotion_policy: PromotionPolicy,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            puzzles_path: PathBuf::from("data/puzzles.json"),
            storage_dir: PathBuf::from("data/profiles"),
            user_id: "local".to_string(),
            min_theme_attempts: 3,
            promotion_policy: PromotionPolicy::Permissive,
        }
    }
}

impl TrainerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let puzzles_path = lookup("PUZZLES_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.puzzles_path);

        let storage_dir = lookup("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        let user_id = lookup("TRAINER_USER")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.user_id);

        let min_theme_attempts = match lookup("MIN_THEME_ATTEMPTS") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MIN_THEME_ATTEMPTS",
                value,
            })?,
            None => defaults.min_theme_attempts,
        };

        let promotion_policy = match lookup("PROMOTION_POLICY") {
            Some(value) => PromotionPolicy::parse(&value).ok_or(ConfigError::InvalidValue {
                key: "PROMOTION_POLICY",
                value,
            })?,
            None => defaults.promotion_policy,
        };

        Ok(Self {
            puzzles_path,
            storage_dir,
            user_id,
            min_theme_attempts,
            promotion_policy,
        })
    }
}
