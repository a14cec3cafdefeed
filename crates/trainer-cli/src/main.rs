use std::sync::Arc;

use anyhow::Context;
use chess_core::ShakmatyRules;
use puzzle_trainer::storage::settings_key;
use puzzle_trainer::{
    JsonFileStore, KeyValueStore, Persister, ProgressTracker, PuzzleRepository, TargetDifficulty,
    Trainer, TrainerConfig, TrainerError, TrainerEvent, UserSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  next                 load a puzzle picked for you
  load <id>            load a specific puzzle
  move <m>             play a move (e2e4, e7e8q or SAN)
  hint                 show the expected move
  pause | resume
  giveup               give up the current puzzle
  menu                 leave the current puzzle
  stats                show your statistics
  export               print statistics as JSON
  themes               list puzzle themes
  difficulty <level>   auto, beginner, intermediate or advanced
  quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with the board output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = TrainerConfig::from_env().context("Invalid configuration")?;
    let rules = Arc::new(ShakmatyRules);

    tracing::info!(path = %config.puzzles_path.display(), "Loading puzzles...");
    let (repository, report) = PuzzleRepository::load_from_path(&config.puzzles_path, rules.as_ref())
        .with_context(|| format!("Failed to load {}", config.puzzles_path.display()))?;
    tracing::info!(
        loaded = report.loaded,
        excluded = report.excluded(),
        issues = report.issues.len(),
        "Puzzle collection ready"
    );

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&config.storage_dir));
    let statistics = match ProgressTracker::load(store.as_ref(), &config.user_id).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!(error = %e, "Could not load statistics, starting fresh");
            None
        }
    };
    let settings = match store.get(&settings_key(&config.user_id)).await {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable settings");
            UserSettings::default()
        }),
        Ok(None) => UserSettings::default(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not load settings");
            UserSettings::default()
        }
    };

    let (persister, writer) = Persister::spawn(Arc::clone(&store));

    let mut trainer = Trainer::new(config.user_id.clone(), Arc::new(repository), rules)
        .with_config(&config)
        .with_persister(persister.clone())
        .with_settings(settings)
        .with_statistics(statistics);

    println!("Puzzle trainer ready for {}. Type 'help' for commands.", config.user_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        if command == "quit" || command == "exit" {
            break;
        }
        if let Err(e) = run_command(&mut trainer, command, arg) {
            println!("! {e}");
        }
        for event in trainer.take_events() {
            print_event(&event);
        }
    }

    trainer.return_to_menu();
    for event in trainer.take_events() {
        print_event(&event);
    }

    if let Some(report) = persister.flush().await {
        tracing::info!(written = report.written, failed = report.failed, "Saved progress");
    }
    drop(trainer);
    drop(persister);
    writer.await.context("Persistence task failed")?;

    Ok(())
}

fn run_command(trainer: &mut Trainer, command: &str, arg: &str) -> Result<(), TrainerError> {
    match command {
        "help" => println!("{HELP}"),
        "next" => {
            if trainer.status().is_finished() {
                trainer.load_next_puzzle()?;
            } else {
                trainer.load_puzzle(None)?;
            }
        }
        "load" if !arg.is_empty() => {
            trainer.load_puzzle(Some(arg))?;
        }
        "move" if !arg.is_empty() => {
            let outcome = trainer.make_move(arg)?;
            if !outcome.accepted {
                println!("Not the move. Try again.");
            }
        }
        "hint" => {
            trainer.show_hint()?;
        }
        "pause" => trainer.pause_game()?,
        "resume" => trainer.resume_game()?,
        "giveup" => {
            trainer.give_up()?;
            if let Some(session) = trainer.session() {
                println!("Solution: {}", session.puzzle.solution.join(" "));
            }
        }
        "menu" => trainer.return_to_menu(),
        "stats" => print_stats(trainer),
        "export" => match trainer.statistics() {
            Some(stats) => println!("{}", serde_json::to_string_pretty(&ProgressTracker::export(stats)?)?),
            None => println!("No statistics yet."),
        },
        "themes" => {
            for theme in trainer.repository().themes() {
                println!("  {theme}");
            }
        }
        "difficulty" => match TargetDifficulty::parse(arg) {
            Some(difficulty) => {
                let settings = UserSettings {
                    difficulty,
                    ..trainer.settings().clone()
                };
                trainer.update_settings(settings);
                println!("Difficulty set to {arg}.");
            }
            None => println!("Unknown difficulty '{arg}'."),
        },
        _ => println!("Unknown command. Type 'help'."),
    }
    Ok(())
}

fn print_event(event: &TrainerEvent) {
    match event {
        TrainerEvent::PuzzleLoaded {
            puzzle_id,
            fen,
            theme,
            rating,
            player_moves,
        } => {
            println!("Puzzle {puzzle_id} ({theme}, {rating}), {player_moves} move(s) to find");
            println!("  {fen}");
        }
        TrainerEvent::LoadFailed { reason } => println!("Could not load a puzzle: {reason}"),
        TrainerEvent::MoveAccepted {
            san,
            opponent_reply,
            fen_after_reply,
            fen,
        } => {
            println!("Correct: {san}");
            match (opponent_reply, fen_after_reply) {
                (Some(reply), Some(after)) => println!("Opponent plays {reply}\n  {after}"),
                _ => println!("  {fen}"),
            }
        }
        TrainerEvent::MoveRejected { .. } => {}
        TrainerEvent::HintRevealed { expected, .. } => println!("Hint: {expected}"),
        TrainerEvent::Paused => println!("Paused."),
        TrainerEvent::Resumed => println!("Resumed."),
        TrainerEvent::PuzzleSolved {
            score,
            time_spent_seconds,
            ..
        } => println!("Solved in {time_spent_seconds}s for {score} points."),
        TrainerEvent::PuzzleFailed { puzzle_id, .. } => println!("Puzzle {puzzle_id} failed."),
        TrainerEvent::StatisticsUpdated {
            puzzles_solved,
            streak_current,
            streak_best,
        } => println!("Solved {puzzles_solved}, streak {streak_current} (best {streak_best})"),
    }
}

fn print_stats(trainer: &Trainer) {
    let Some(stats) = trainer.statistics() else {
        println!("No statistics yet.");
        return;
    };
    println!(
        "Solved {} | attempts {} | time {}s | score {} | streak {} (best {})",
        stats.puzzles_solved,
        stats.total_attempts,
        stats.total_time_spent,
        stats.total_score,
        stats.streak_current,
        stats.streak_best
    );
    for (theme, progress) in &stats.theme_progress {
        println!(
            "  {theme:<16} {}/{} solved, avg {:.0}s",
            progress.solved, progress.attempts, progress.average_time
        );
    }
    for (band, progress) in &stats.difficulty_progress {
        println!("  {band:<16} {:.0}% of {}", progress.success_rate, progress.attempts);
    }
}
