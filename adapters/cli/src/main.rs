#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that hosts the MindSpan training games.

mod config;
mod history_transfer;
mod play;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use mindspan_core::{GameKind, GamePlan, Level, Rating, SymptomReport};
use mindspan_session::{query, Session};
use mindspan_store::{FileStore, Journal, KeyValueStore};

use crate::config::AppConfig;
use crate::history_transfer::{HistorySnapshot, TRANSFER_HEADER};

/// Command-line arguments accepted by the `mindspan` binary.
#[derive(Debug, Parser)]
#[command(name = "mindspan", version, about = "Terminal cognitive training suite")]
struct Cli {
    /// Configuration file consulted before flags.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Store file holding history, progress and check-ins.
    #[arg(long, global = true, value_name = "PATH")]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

/// Subcommands offered by the binary.
#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Runs one interactive training session.
    Play {
        /// Game to play; defaults to the configured game.
        game: Option<String>,

        /// Pins the sequence seed for a reproducible session.
        #[arg(long)]
        seed: Option<u64>,

        /// Presentation speed scale; larger is faster.
        #[arg(long, value_name = "SCALE")]
        speed: Option<f64>,

        /// Disables spoken digit announcements.
        #[arg(long)]
        no_narration: bool,
    },
    /// Prints recorded sessions for one game, or for all games.
    History {
        /// Game to list; defaults to every game.
        game: Option<String>,
    },
    /// Prints which games were completed on which days.
    Progress,
    /// Records today's symptom check-in.
    Checkin {
        /// Sleep quality rating.
        #[arg(long, value_name = "0-10")]
        sleep: u8,

        /// Fatigue severity rating.
        #[arg(long, value_name = "0-10")]
        fatigue: u8,

        /// Concentration difficulty rating.
        #[arg(long, value_name = "0-10")]
        concentration: u8,

        /// Mood rating.
        #[arg(long, value_name = "0-10")]
        mood: u8,

        /// Headache severity rating.
        #[arg(long, value_name = "0-10")]
        headache: u8,

        /// Free-text note attached to the check-in.
        #[arg(long)]
        note: Option<String>,
    },
    /// Prints a single-line transfer string carrying one game's history.
    Export {
        /// Game whose history is exported.
        game: String,
    },
    /// Merges a transfer string into the stored history.
    Import {
        /// Transfer string produced by `export`.
        line: String,
    },
}

/// Entry point for the MindSpan command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?.with_data_file(cli.data_file);

    let Some(command) = cli.command else {
        print_welcome();
        return Ok(());
    };

    let store = FileStore::open(config.data_file()).with_context(|| {
        format!(
            "failed to open the data file {}",
            config.data_file().display()
        )
    })?;
    let mut journal = Journal::new(store);

    match command {
        CliCommand::Play {
            game,
            seed,
            speed,
            no_narration,
        } => {
            let kind = match game {
                Some(value) => parse_game(&value)?,
                None => config.default_game(),
            };
            let options = play::SessionOptions {
                seed: seed.unwrap_or_else(rand::random),
                speed: match speed {
                    Some(value) => config::validate_speed(value)?,
                    None => config.speed(),
                },
                narration: config.narration() && !no_narration,
            };
            play::run(kind, options, &mut journal)
        }
        CliCommand::History { game } => {
            let game = game.map(|value| parse_game(&value)).transpose()?;
            print_history(&journal, game);
            Ok(())
        }
        CliCommand::Progress => {
            print_progress(&journal);
            Ok(())
        }
        CliCommand::Checkin {
            sleep,
            fatigue,
            concentration,
            mood,
            headache,
            note,
        } => {
            let report = SymptomReport {
                date: today(),
                sleep_quality: Rating::try_from(sleep)?,
                fatigue: Rating::try_from(fatigue)?,
                concentration: Rating::try_from(concentration)?,
                mood: Rating::try_from(mood)?,
                headache: Rating::try_from(headache)?,
                note,
            };
            record_checkin(&mut journal, report);
            Ok(())
        }
        CliCommand::Export { game } => {
            let kind = parse_game(&game)?;
            let records = journal.history(kind);
            if records.is_empty() {
                bail!("no recorded sessions for {}", kind.title());
            }
            let snapshot = HistorySnapshot {
                game: kind,
                records,
            };
            println!("{}", snapshot.encode());
            Ok(())
        }
        CliCommand::Import { line } => {
            let snapshot = HistorySnapshot::decode(&line).with_context(|| {
                format!("expected a '{TRANSFER_HEADER}:<game>:<payload>' transfer line")
            })?;
            let added = journal.merge_history(snapshot.game, &snapshot.records);
            println!(
                "Merged {added} new record(s) into {}.",
                snapshot.game.title()
            );
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_welcome() {
    let session = Session::new(GamePlan::standard(GameKind::DigitSpan));
    println!("{}", query::welcome_banner(&session));
    println!();
    println!("Games:");
    for kind in GameKind::ALL {
        println!("  {:<20} {}", kind.slug(), kind.title());
    }
    println!();
    println!("Run `mindspan play <game>` to start a session.");
}

fn print_history<S>(journal: &Journal<S>, game: Option<GameKind>)
where
    S: KeyValueStore,
{
    let kinds = match game {
        Some(kind) => vec![kind],
        None => GameKind::ALL.to_vec(),
    };

    for kind in kinds {
        println!("{}", kind.title());
        let records = journal.history(kind);
        if records.is_empty() {
            println!("  no sessions recorded");
        } else {
            for record in &records {
                println!(
                    "  {}  level {:>2}  score {:>4}  {}  {:>4}s",
                    record.date,
                    display_level_for(kind, record.level),
                    record.score.get(),
                    if record.won { "won " } else { "lost" },
                    record.seconds,
                );
            }
            if let Some(date) = journal.last_played(kind) {
                println!("  last played {date}");
            }
        }
        println!();
    }
}

fn print_progress<S>(journal: &Journal<S>)
where
    S: KeyValueStore,
{
    let progress = journal.daily_progress();
    if progress.is_empty() {
        println!("No games completed yet.");
        return;
    }
    for (date, slugs) in progress {
        println!("{date}: {}", slugs.join(", "));
    }
}

fn record_checkin<S>(journal: &mut Journal<S>, report: SymptomReport)
where
    S: KeyValueStore,
{
    let replaced = journal.symptoms_on(&report.date).is_some();
    journal.record_symptoms(&report);
    if replaced {
        println!("Updated the check-in for {}.", report.date);
    } else {
        println!("Recorded the check-in for {}.", report.date);
    }

    let history = journal.symptom_history();
    if history.len() > 1 {
        println!();
        println!("Recent check-ins:");
        for entry in history.iter().rev().take(7) {
            println!(
                "  {}  sleep {}  fatigue {}  concentration {}  mood {}  headache {}",
                entry.date,
                entry.sleep_quality.get(),
                entry.fatigue.get(),
                entry.concentration.get(),
                entry.mood.get(),
                entry.headache.get(),
            );
        }
    }
}

/// Resolves a game slug, listing the known slugs on failure.
fn parse_game(value: &str) -> Result<GameKind> {
    GameKind::from_slug(value).ok_or_else(|| {
        let known = GameKind::ALL.map(|kind| kind.slug()).join(", ");
        anyhow!("unknown game '{value}' (known games: {known})")
    })
}

/// Level number shown to players for a recorded level.
fn display_level_for(kind: GameKind, level: Level) -> u32 {
    match GamePlan::standard(kind) {
        GamePlan::Span(rules) => rules.display_level(level),
        GamePlan::Sort(_) | GamePlan::Fluency(_) => level.get(),
    }
}

/// Today's calendar date in `YYYY-MM-DD` form.
fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}
