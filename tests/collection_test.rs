/// Puzzle collection loading, data-quality reporting and solution replay.
mod common;

use std::sync::Arc;

use chess_core::{PromotionPolicy, ShakmatyRules};
use common::*;
use puzzle_trainer::{
    DataIssueKind, Difficulty, PuzzleFilter, PuzzleRepository, Session, SolutionValidator,
};
use serde_json::json;

#[test]
fn test_shipped_collection_is_clean() {
    let repo = shipped_collection();
    assert_eq!(repo.len(), 6);
    assert_eq!(
        repo.themes(),
        vec!["backRankMate", "fork", "mate", "pin", "promotion", "smotheredMate"]
    );
    for puzzle in repo.list(&PuzzleFilter::new()) {
        assert!(!puzzle.solution.is_empty());
        assert!(puzzle.difficulty_matches_rating(), "{} is mis-banded", puzzle.id);
    }
}

#[test]
fn test_every_solution_replays_to_completion() {
    let repo = shipped_collection();
    let validator = SolutionValidator::new(&ShakmatyRules, PromotionPolicy::Strict);

    for puzzle in repo.list(&PuzzleFilter::new()) {
        let mut session = Session::new(Arc::clone(&puzzle), chrono::Utc::now());
        let mut last = None;
        while let Some(expected) = session.expected_move().map(str::to_owned) {
            let outcome = validator.accept(&mut session, &expected);
            assert!(outcome.accepted, "{}: '{expected}' rejected", puzzle.id);
            last = Some(outcome);
        }
        let last = last.unwrap();
        assert!(last.session_complete, "{} did not complete", puzzle.id);
        assert_eq!(session.move_history.len(), puzzle.solution.len());
        assert_eq!(session.attempts_count as usize, puzzle.player_move_count());
    }
}

#[test]
fn test_mis_banded_difficulty_is_flagged() {
    let records = vec![json!({
        "id": "banding",
        "theme": "fork",
        "fen": OPEN_GAME,
        "solution": ["Nxe5"],
        "difficulty": "advanced",
        "rating": 1550,
        "points": 10,
    })];
    let (repo, report) = PuzzleRepository::load(records, &ShakmatyRules);

    assert_eq!(
        report.issues_for("banding"),
        vec![&DataIssueKind::DifficultyBandMismatch {
            declared: Difficulty::Advanced,
            expected: Difficulty::Intermediate,
        }]
    );
    // Flagged, not dropped
    assert_eq!(report.excluded(), 0);
    assert!(repo.get("banding").is_some());
}

#[test]
fn test_bad_records_are_excluded_not_fatal() {
    let good = json!({
        "id": "good", "theme": "mate", "fen": BACK_RANK, "solution": ["Ra8#"],
        "difficulty": "beginner", "rating": 800, "points": 10,
    });
    let records = vec![
        good.clone(),
        good,
        json!({"id": "no-fen", "theme": "mate", "solution": ["Ra8#"], "difficulty": "beginner", "rating": 800, "points": 10}),
        json!({"id": "bad-fen", "theme": "mate", "fen": "not a fen", "solution": ["Ra8#"], "difficulty": "beginner", "rating": 800, "points": 10}),
        json!({"id": "empty", "theme": "mate", "fen": BACK_RANK, "solution": [], "difficulty": "beginner", "rating": 800, "points": 10}),
        json!({"id": "illegal", "theme": "mate", "fen": BACK_RANK, "solution": ["Ra8#", "Kh8"], "difficulty": "beginner", "rating": 800, "points": 10}),
        json!({"id": "cheap", "theme": "mate", "fen": BACK_RANK, "solution": ["Ra8#"], "difficulty": "beginner", "rating": 120, "points": 10}),
        json!("not even an object"),
    ];
    let (repo, report) = PuzzleRepository::load(records, &ShakmatyRules);

    assert_eq!(repo.len(), 1);
    assert_eq!(report.loaded, 1);
    assert_eq!(report.excluded(), 7);
    assert_eq!(report.issues_for("good"), vec![&DataIssueKind::DuplicateId]);
    assert_eq!(report.issues_for("no-fen"), vec![&DataIssueKind::MissingField("fen")]);
    assert!(matches!(report.issues_for("bad-fen").as_slice(), [DataIssueKind::InvalidFen(_)]));
    assert_eq!(report.issues_for("empty"), vec![&DataIssueKind::EmptySolution]);
    assert!(matches!(
        report.issues_for("illegal").as_slice(),
        [DataIssueKind::UnreplayableSolution { ply: 1, .. }]
    ));
    assert_eq!(report.issues_for("cheap"), vec![&DataIssueKind::RatingOutOfRange(120)]);
    assert!(matches!(report.issues_for("#7").as_slice(), [DataIssueKind::Malformed(_)]));
}

#[test]
fn test_collection_must_be_an_array() {
    let err = PuzzleRepository::from_json_str(r#"{"id": "x"}"#, &ShakmatyRules).unwrap_err();
    assert!(err.to_string().contains("array"));
}

#[test]
fn test_filters_and_paging() {
    let repo = shipped_collection();

    let beginner = PuzzleFilter::new().difficulty(Some(Difficulty::Beginner));
    assert_eq!(repo.count(&beginner), 4);

    let page: Vec<_> = repo
        .list(&beginner.clone().page(1, 2))
        .iter()
        .map(|p| p.id.clone())
        .collect();
    assert_eq!(page, vec!["ladder-001", "promotion-001"]);

    let rated = PuzzleFilter::new().rating_range(Some(1000), Some(1500));
    let ids: Vec<_> = repo.list(&rated).iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec!["promotion-001", "smothered-001", "fork-001"]);

    let knights = PuzzleFilter::new().tag("knight").theme("fork");
    assert_eq!(repo.count(&knights), 1);

    let nothing = PuzzleFilter::new().theme("zugzwang");
    let mut rng = rand::thread_rng();
    assert!(repo.list(&nothing).is_empty());
    assert!(repo.random_pick(&nothing, &mut rng).is_none());
    assert!(repo.get("zugzwang-001").is_none());
}
