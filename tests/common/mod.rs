#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chess_core::ShakmatyRules;
use puzzle_trainer::{Difficulty, ManualClock, Puzzle, PuzzleRepository, Trainer};

pub const BACK_RANK: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
pub const OPEN_GAME: &str = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
pub const LADDER: &str = "7k/8/8/8/8/8/R7/1R4K1 w - - 0 1";
pub const FORK: &str = "r3k3/8/8/3N4/8/8/8/4K3 w - - 0 1";
pub const PIN: &str = "4k3/8/2n5/8/8/8/8/4KB2 w - - 0 1";

/// The puzzle collection shipped in `data/`.
pub fn collection_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/puzzles.json")
}

pub fn shipped_collection() -> PuzzleRepository {
    let (repo, report) = PuzzleRepository::load_from_path(collection_path(), &ShakmatyRules)
        .expect("shipped collection should load");
    assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);
    repo
}

pub fn puzzle(id: &str, theme: &str, fen: &str, solution: &[&str], rating: u32) -> Puzzle {
    Puzzle {
        id: id.into(),
        theme: theme.into(),
        fen: fen.into(),
        solution: solution.iter().map(|s| s.to_string()).collect(),
        difficulty: Difficulty::for_rating(rating),
        rating,
        points: 10,
        tags: BTreeSet::new(),
    }
}

/// A trainer over `puzzles` with a hand-driven clock and a fixed seed.
pub fn trainer(user: &str, puzzles: Vec<Puzzle>) -> (Trainer, Arc<ManualClock>) {
    let (repo, report) = PuzzleRepository::from_puzzles(puzzles, &ShakmatyRules);
    assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);
    let clock = Arc::new(ManualClock::default());
    let trainer = Trainer::new(user, Arc::new(repo), Arc::new(ShakmatyRules))
    .with_clock(clock.clone())
    .with_seed(42);
    (trainer, clock)
}

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("puzzle-trainer-{label}-{}", unique_suffix()))
}
