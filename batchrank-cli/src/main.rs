mod config;
mod output;
mod parse;
mod prompt;
mod simulate;
mod terminal;

use anyhow::{bail, Context, Result};
use batchrank_core::{
    OrderOracle, RankError, RankingSession, SessionConfig, StopReason, SubmitOutcome,
};
use clap::Parser;
use std::collections::HashSet;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{parse_strategy, BatchrankConfig};
use crate::terminal::TerminalOracle;

/// Shown when no items are given.
const DEFAULT_SONGS: [&str; 10] = [
    "Bohemian Rhapsody - Queen",
    "Stairway to Heaven - Led Zeppelin",
    "Hotel California - Eagles",
    "Imagine - John Lennon",
    "Like a Rolling Stone - Bob Dylan",
    "Smells Like Teen Spirit - Nirvana",
    "Hey Jude - The Beatles",
    "Sweet Child O' Mine - Guns N' Roses",
    "I Want to Hold Your Hand - The Beatles",
    "Purple Haze - Jimi Hendrix",
];

#[derive(Parser)]
#[command(name = "batchrank", version, about = "Rank items by ordering small groups at a time")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Rank a list of items interactively
    Rank(RankArgs),
    /// Measure how well sessions recover a hidden order under a noisy judge
    Simulate(SimulateArgs),
    /// Create a default config file at ~/.config/batchrank/config.toml
    Init,
}

/// Session parameters shared by `rank` and `simulate`.
#[derive(clap::Args)]
struct SessionArgs {
    /// Items per group (at least 2)
    #[arg(long)]
    group_size: Option<usize>,

    /// Maximum number of rounds
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Stop early once average confidence reaches this value, in (0, 1]
    #[arg(long)]
    confidence_threshold: Option<f64>,

    /// Grouping strategy: "adaptive" or "score-only"
    #[arg(long)]
    strategy: Option<String>,

    /// Seed for the within-group shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Path to config file (default: ~/.config/batchrank/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct RankArgs {
    /// File with one item per line, or a JSON array of strings
    #[arg(long)]
    items: Option<PathBuf>,

    /// Inline item (repeatable)
    #[arg(long = "item")]
    inline_items: Vec<String>,

    /// With no items given, rank this many built-in sample songs
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    session: SessionArgs,
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// Number of simulated items
    #[arg(long, default_value_t = 30)]
    num_items: usize,

    /// Number of independent sessions
    #[arg(long, default_value_t = 20)]
    trials: usize,

    /// Standard deviation of the judge's perception noise
    #[arg(long, default_value_t = 0.5)]
    noise: f64,

    /// Seed for hidden strengths and judge noise
    #[arg(long, default_value_t = 1)]
    truth_seed: u64,

    /// Output JSON instead of a report
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    session: SessionArgs,
}

/// Parse a string as either a JSON array of strings or plain text (one item per line).
fn parse_items_from_str(content: &str) -> Result<Vec<String>> {
    let trimmed = content.trim();
    if trimmed.starts_with('[') {
        let items: Vec<String> = serde_json::from_str(trimmed)
            .context("File looks like JSON but failed to parse")?;
        Ok(items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else {
        Ok(trimmed
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// The first `count` sample songs, or generated names past the end of the list.
fn default_items(count: usize) -> Vec<String> {
    if count <= DEFAULT_SONGS.len() {
        DEFAULT_SONGS[..count].iter().map(|s| s.to_string()).collect()
    } else {
        (1..=count).map(|i| format!("Song{i}")).collect()
    }
}

/// Load items from --items file and --item flags, falling back to the sample songs.
fn load_items(args: &RankArgs) -> Result<Vec<String>> {
    let mut items = Vec::new();

    if let Some(ref path) = args.items {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read items file {}", path.display()))?;
        items = parse_items_from_str(&content)?;
    }

    items.extend(args.inline_items.iter().map(|s| s.trim().to_string()));

    if items.is_empty() {
        items = default_items(args.count);
    }

    if items.is_empty() {
        bail!("No items to rank. Use --items <file>, --item <name>, or --count <n>.");
    }

    // Names double as input tokens, so they must be unambiguous.
    let mut seen = HashSet::new();
    for item in &items {
        if !seen.insert(item.to_lowercase()) {
            bail!("Duplicate item \"{item}\"");
        }
    }
    Ok(items)
}

/// Merge CLI args over the config file over built-in defaults.
fn resolve_session_config(args: &SessionArgs) -> Result<SessionConfig> {
    let cfg = match args.config {
        Some(ref path) => config::load_config(path)?,
        None => load_default_config()?,
    };
    merge_session_config(args, cfg)
}

fn load_default_config() -> Result<BatchrankConfig> {
    match config::config_path() {
        Ok(path) => config::load_config(&path),
        // No HOME: nothing to load.
        Err(_) => Ok(BatchrankConfig::default()),
    }
}

fn merge_session_config(args: &SessionArgs, cfg: BatchrankConfig) -> Result<SessionConfig> {
    let defaults = SessionConfig::default();
    let strategy = match args.strategy.as_deref().or(cfg.strategy.as_deref()) {
        Some(name) => parse_strategy(name)?,
        None => defaults.strategy,
    };

    let session = SessionConfig {
        group_size: args.group_size.or(cfg.group_size).unwrap_or(defaults.group_size),
        max_rounds: args.max_rounds.or(cfg.max_rounds).unwrap_or(defaults.max_rounds),
        confidence_threshold: args
            .confidence_threshold
            .or(cfg.confidence_threshold)
            .unwrap_or(defaults.confidence_threshold),
        strategy,
        seed: args.seed.or(cfg.seed),
    };
    session.validate()?;
    Ok(session)
}

/// Pull groups from the session and push the oracle's orders back until it
/// terminates. Malformed orders are reported and the same group is asked again.
fn drive_session<R: BufRead, W: Write>(
    session: &mut RankingSession,
    oracle: &mut TerminalOracle<R, W>,
) -> Result<()> {
    while let Some(group) = session.next_group().cloned() {
        let order = oracle.request_order(&group).map_err(RankError::Oracle)?;

        match session.submit_order(&group, &order) {
            Ok(SubmitOutcome::GroupAccepted { .. }) => {}
            Ok(SubmitOutcome::RoundCompleted { round, confidence }) => {
                oracle.notice(&format!("Round {}: average confidence = {confidence:.2}", round + 1))?;
            }
            Ok(SubmitOutcome::Terminated { round, confidence, stop_reason }) => {
                oracle.notice(&format!("Round {}: average confidence = {confidence:.2}", round + 1))?;
                if stop_reason == StopReason::ConfidenceReached {
                    oracle.notice(&format!("Stopping early at round {} due to high confidence.", round + 1))?;
                }
            }
            Err(RankError::MalformedOrder(violation)) => {
                oracle.notice(&format!("  That order doesn't fit this group: {violation}. Try again."))?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn run_rank(args: RankArgs) -> Result<()> {
    let session_config = resolve_session_config(&args.session)?;
    let items = load_items(&args)?;
    let item_ids: Vec<i64> = (0..items.len() as i64).collect();

    if !io::stdin().is_terminal() {
        info!("stdin is not a terminal; reading group orders from piped input");
    }

    eprintln!(
        "Ranking {} items in groups of {} (up to {} rounds)",
        items.len(),
        session_config.group_size,
        session_config.max_rounds,
    );

    let mut session = RankingSession::start(&item_ids, session_config)?;
    let stdin = io::stdin();
    let mut oracle = TerminalOracle::new(stdin.lock(), io::stderr(), items.clone());
    drive_session(&mut session, &mut oracle)?;

    let result = session.result()?;
    if args.json {
        output::print_json(result, &items)?;
    } else {
        println!("\nFinal ranking:");
        output::print_table(result, &items);
    }
    Ok(())
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let session_config = resolve_session_config(&args.session)?;
    if args.num_items == 0 {
        bail!("--num-items must be at least 1");
    }
    if !args.noise.is_finite() || args.noise < 0.0 {
        bail!("--noise must be non-negative");
    }

    let report = simulate::run_simulation(
        args.num_items,
        args.trials,
        args.noise,
        &session_config,
        args.truth_seed,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        simulate::print_report(&report, args.num_items, &session_config, args.noise);
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rank(args) => run_rank(args),
        Commands::Simulate(args) => run_simulate(args),
        Commands::Init => {
            let path = config::create_default_config()?;
            println!("Created config at {}", path.display());
            println!("Edit it to set your default group size, rounds, etc.");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn no_args() -> SessionArgs {
        SessionArgs {
            group_size: None,
            max_rounds: None,
            confidence_threshold: None,
            strategy: None,
            seed: None,
            config: None,
        }
    }

    #[test]
    fn test_parse_items_plain_and_json() {
        assert_eq!(parse_items_from_str("a\n\n  b \n").unwrap(), vec!["a", "b"]);
        assert_eq!(parse_items_from_str(r#"["x", " ", "y"]"#).unwrap(), vec!["x", "y"]);
        assert!(parse_items_from_str("[not json").is_err());
    }

    #[test]
    fn test_default_items() {
        assert_eq!(default_items(2), vec!["Bohemian Rhapsody - Queen", "Stairway to Heaven - Led Zeppelin"]);
        let many = default_items(12);
        assert_eq!(many.len(), 12);
        assert_eq!(many[11], "Song12");
    }

    #[test]
    fn test_cli_args_override_config() {
        let mut args = no_args();
        args.group_size = Some(3);
        let cfg = BatchrankConfig {
            group_size: Some(6),
            max_rounds: Some(4),
            strategy: Some("score-only".to_string()),
            ..BatchrankConfig::default()
        };
        let session = merge_session_config(&args, cfg).unwrap();

        assert_eq!(session.group_size, 3);
        assert_eq!(session.max_rounds, 4);
        assert_eq!(session.confidence_threshold, 0.9);
        assert_eq!(session.strategy, batchrank_core::GroupingStrategy::ScoreOnly);
    }

    #[test]
    fn test_invalid_merged_config_is_rejected() {
        let mut args = no_args();
        args.group_size = Some(1);
        assert!(merge_session_config(&args, BatchrankConfig::default()).is_err());
    }

    #[test]
    fn test_drive_session_reasks_after_malformed_order() {
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let config = SessionConfig { group_size: 3, max_rounds: 1, seed: Some(1), ..SessionConfig::default() };
        let mut session = RankingSession::start(&[0, 1, 2], config).unwrap();

        // "1,1,2" repeats an item; the blank line then accepts the shown order.
        let input = Cursor::new("1,1,2\n\n");
        let mut out = Vec::new();
        let mut oracle = TerminalOracle::new(input, &mut out, names);
        drive_session(&mut session, &mut oracle).unwrap();

        assert!(session.is_terminated());
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("appears more than once"));
        assert!(shown.contains("Round 1: average confidence"));
    }
}
