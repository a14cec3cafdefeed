//! Tactical puzzle trainer: puzzle collection, solution checking, scoring,
//! progress tracking and adaptive selection, driven by a session state
//! machine.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod persister;
pub mod progress;
pub mod puzzle;
pub mod repository;
pub mod scoring;
pub mod selector;
pub mod session;
pub mod settings;
pub mod storage;
pub mod trainer;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrainerConfig;
pub use error::{ConfigError, StorageError, TrainerError};
pub use events::TrainerEvent;
pub use persister::{PersistReport, Persister};
pub use progress::{DifficultyProgress, ProgressTracker, SessionOutcome, ThemeProgress, UserStatistics};
pub use puzzle::{Difficulty, Puzzle};
pub use repository::{DataIssue, DataIssueKind, LoadReport, PuzzleFilter, PuzzleRepository};
pub use selector::AdaptiveSelector;
pub use session::{Session, SessionStatus};
pub use settings::{BoardOrientation, TargetDifficulty, UserSettings};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use trainer::Trainer;
pub use validator::{MoveOutcome, SolutionValidator};
