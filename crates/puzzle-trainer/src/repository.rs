//! Static puzzle collection with filtered and random retrieval.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chess_core::ChessRules;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::error::TrainerError;
use crate::puzzle::{Difficulty, Puzzle, PuzzleRecord, MAX_RATING, MIN_RATING};
use crate::validator::apply_solution_entry;

/// Query over the collection. Empty fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PuzzleFilter {
    pub theme: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub min_rating: Option<u32>,
    pub max_rating: Option<u32>,
    /// Every tag listed must be present
    pub tags: BTreeSet<String>,
    pub exclude_ids: HashSet<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl PuzzleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn rating_range(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_rating = min;
        self.max_rating = max;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn exclude<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, puzzle: &Puzzle) -> bool {
        if let Some(theme) = &self.theme {
            if puzzle.theme != *theme {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if puzzle.difficulty != difficulty {
                return false;
            }
        }
        if self.min_rating.is_some_and(|min| puzzle.rating < min) {
            return false;
        }
        if self.max_rating.is_some_and(|max| puzzle.rating > max) {
            return false;
        }
        if !self.tags.iter().all(|t| puzzle.has_tag(t)) {
            return false;
        }
        !self.exclude_ids.contains(&puzzle.id)
    }
}

/// What was wrong with a collection entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataIssueKind {
    Malformed(String),
    MissingField(&'static str),
    DuplicateId,
    UnknownDifficulty(String),
    RatingOutOfRange(i64),
    InvalidPoints(i64),
    InvalidFen(String),
    EmptySolution,
    UnreplayableSolution { ply: usize, entry: String },
    /// Declared difficulty disagrees with the rating band
    DifficultyBandMismatch {
        declared: Difficulty,
        expected: Difficulty,
    },
}

impl DataIssueKind {
    /// Whether the entry is dropped from the repository.
    pub fn excludes(&self) -> bool {
        !matches!(self, Self::DifficultyBandMismatch { .. })
    }
}

impl fmt::Display for DataIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed record: {e}"),
            Self::MissingField(field) => write!(f, "missing field '{field}'"),
            Self::DuplicateId => write!(f, "duplicate id"),
            Self::UnknownDifficulty(d) => write!(f, "unknown difficulty '{d}'"),
            Self::RatingOutOfRange(r) => {
                write!(f, "rating {r} outside {MIN_RATING}..={MAX_RATING}")
            }
            Self::InvalidPoints(p) => write!(f, "invalid points {p}"),
            Self::InvalidFen(e) => write!(f, "{e}"),
            Self::EmptySolution => write!(f, "empty solution"),
            Self::UnreplayableSolution { ply, entry } => {
                write!(f, "solution entry {ply} ('{entry}') is not playable")
            }
            Self::DifficultyBandMismatch { declared, expected } => {
                write!(f, "difficulty '{declared}' does not match rating band '{expected}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIssue {
    /// Record id, or `#<index>` when the id itself is missing
    pub puzzle_id: String,
    pub kind: DataIssueKind,
}

/// Outcome of loading a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub issues: Vec<DataIssue>,
}

impl LoadReport {
    pub fn excluded(&self) -> usize {
        self.issues.iter().filter(|i| i.kind.excludes()).count()
    }

    pub fn issues_for(&self, puzzle_id: &str) -> Vec<&DataIssueKind> {
        self.issues
            .iter()
            .filter(|i| i.puzzle_id == puzzle_id)
            .map(|i| &i.kind)
            .collect()
    }
}

/// Read-only puzzle store shared by every session.
#[derive(Debug, Clone, Default)]
pub struct PuzzleRepository {
    puzzles: Vec<Arc<Puzzle>>,
    by_id: HashMap<String, usize>,
}

impl PuzzleRepository {
    /// Build from puzzle values, applying the same checks as `load`.
    pub fn from_puzzles(
        puzzles: impl IntoIterator<Item = Puzzle>,
        rules: &dyn ChessRules,
    ) -> (Self, LoadReport) {
        let records = puzzles
            .into_iter()
            .map(|p| serde_json::to_value(p).unwrap_or(JsonValue::Null))
            .collect();
        Self::load(records, rules)
    }

    /// Skips validation, for fixtures whose positions are irrelevant.
    #[cfg(test)]
    pub(crate) fn from_trusted(puzzles: impl IntoIterator<Item = Puzzle>) -> Self {
        let mut repo = Self::default();
        for puzzle in puzzles {
            if !repo.by_id.contains_key(&puzzle.id) {
                repo.insert(puzzle);
            }
        }
        repo
    }

    /// Validate raw records, keeping every entry that passes.
    pub fn load(records: Vec<JsonValue>, rules: &dyn ChessRules) -> (Self, LoadReport) {
        let mut repo = Self::default();
        let mut report = LoadReport::default();

        for (index, raw) in records.into_iter().enumerate() {
            let fallback_id = raw
                .get("id")
                .and_then(JsonValue::as_str)
                .map(String::from)
                .unwrap_or_else(|| format!("#{index}"));

            let record: PuzzleRecord = match serde_json::from_value(raw) {
                Ok(record) => record,
                Err(e) => {
                    report.issues.push(DataIssue {
                        puzzle_id: fallback_id,
                        kind: DataIssueKind::Malformed(e.to_string()),
                    });
                    continue;
                }
            };

            let puzzle_id = record.id.clone().unwrap_or(fallback_id);
            match validate_record(record, rules) {
                Ok((puzzle, warnings)) => {
                    if repo.by_id.contains_key(&puzzle.id) {
                        report.issues.push(DataIssue {
                            puzzle_id,
                            kind: DataIssueKind::DuplicateId,
                        });
                        continue;
                    }
                    report.issues.extend(warnings.into_iter().map(|kind| DataIssue {
                        puzzle_id: puzzle_id.clone(),
                        kind,
                    }));
                    repo.insert(puzzle);
                }
                Err(kind) => report.issues.push(DataIssue { puzzle_id, kind }),
            }
        }

        report.loaded = repo.len();
        for issue in &report.issues {
            warn!(
                puzzle_id = %issue.puzzle_id,
                excluded = issue.kind.excludes(),
                "Puzzle data issue: {}",
                issue.kind
            );
        }
        info!(
            loaded = report.loaded,
            excluded = report.excluded(),
            "Puzzle collection loaded"
        );

        (repo, report)
    }

    /// Load from a JSON array of puzzle records.
    pub fn from_json_str(
        json: &str,
        rules: &dyn ChessRules,
    ) -> Result<(Self, LoadReport), TrainerError> {
        let value: JsonValue = serde_json::from_str(json)?;
        let JsonValue::Array(records) = value else {
            return Err(TrainerError::Collection(
                "expected a JSON array of puzzles".into(),
            ));
        };
        Ok(Self::load(records, rules))
    }

    pub fn load_from_path<P: AsRef<Path>>(
        path: P,
        rules: &dyn ChessRules,
    ) -> Result<(Self, LoadReport), TrainerError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json, rules)
    }

    fn insert(&mut self, puzzle: Puzzle) {
        self.by_id.insert(puzzle.id.clone(), self.puzzles.len());
        self.puzzles.push(Arc::new(puzzle));
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Puzzle>> {
        self.by_id.get(id).map(|&i| Arc::clone(&self.puzzles[i]))
    }

    /// Matching puzzles in collection order, paged by `offset`/`limit`.
    pub fn list(&self, filter: &PuzzleFilter) -> Vec<Arc<Puzzle>> {
        self.puzzles
            .iter()
            .filter(|p| filter.matches(p))
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Number of puzzles matching, ignoring paging.
    pub fn count(&self, filter: &PuzzleFilter) -> usize {
        self.puzzles.iter().filter(|p| filter.matches(p)).count()
    }

    /// Uniform draw over `list(filter)`; `None` when nothing matches.
    pub fn random_pick<R: Rng + ?Sized>(
        &self,
        filter: &PuzzleFilter,
        rng: &mut R,
    ) -> Option<Arc<Puzzle>> {
        self.list(filter).choose(rng).cloned()
    }

    /// Distinct themes, sorted.
    pub fn themes(&self) -> Vec<String> {
        self.puzzles
            .iter()
            .map(|p| p.theme.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Turn a raw record into a puzzle. Returns non-fatal findings alongside.
fn validate_record(
    record: PuzzleRecord,
    rules: &dyn ChessRules,
) -> Result<(Puzzle, Vec<DataIssueKind>), DataIssueKind> {
    let id = non_empty(record.id).ok_or(DataIssueKind::MissingField("id"))?;
    let theme = non_empty(record.theme).ok_or(DataIssueKind::MissingField("theme"))?;
    let fen = non_empty(record.fen).ok_or(DataIssueKind::MissingField("fen"))?;
    let solution = record.solution.ok_or(DataIssueKind::MissingField("solution"))?;
    let difficulty_raw = record
        .difficulty
        .ok_or(DataIssueKind::MissingField("difficulty"))?;
    let rating = record.rating.ok_or(DataIssueKind::MissingField("rating"))?;
    let points = record.points.ok_or(DataIssueKind::MissingField("points"))?;

    let difficulty = Difficulty::parse(&difficulty_raw)
        .ok_or(DataIssueKind::UnknownDifficulty(difficulty_raw))?;

    if !(i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&rating) {
        return Err(DataIssueKind::RatingOutOfRange(rating));
    }
    let rating = rating as u32;

    let points = u32::try_from(points).map_err(|_| DataIssueKind::InvalidPoints(points))?;

    if solution.is_empty() {
        return Err(DataIssueKind::EmptySolution);
    }

    rules
        .validate_fen(&fen)
        .map_err(|e| DataIssueKind::InvalidFen(e.to_string()))?;

    let mut position = fen.clone();
    for (ply, entry) in solution.iter().enumerate() {
        match apply_solution_entry(rules, &position, entry) {
            Ok(applied) => position = applied.fen_after,
            Err(_) => {
                return Err(DataIssueKind::UnreplayableSolution {
                    ply,
                    entry: entry.clone(),
                })
            }
        }
    }

    let mut warnings = Vec::new();
    let expected = Difficulty::for_rating(rating);
    if expected != difficulty {
        warnings.push(DataIssueKind::DifficultyBandMismatch {
            declared: difficulty,
            expected,
        });
    }

    let puzzle = Puzzle {
        id,
        theme,
        fen,
        solution,
        difficulty,
        rating,
        points,
        tags: record.tags.into_iter().collect(),
    };
    Ok((puzzle, warnings))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
