//! Musha Arena - tournament runner
//!
//! Loads a roster, lets every fighter duel every other one for a number of
//! rounds and prints the standings.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use musha_arena::combat::duel::Duel;
use musha_arena::core::config::{set_config, ArenaConfig};
use musha_arena::core::error::{ArenaError, Result};
use musha_arena::roster::Roster;
use musha_arena::tournament::{Tournament, TournamentReport};

/// Round-robin duels between learning fighters
#[derive(Parser, Debug)]
#[command(name = "musha-arena")]
#[command(about = "Run round-robin duels between learning fighters and print the standings")]
struct Args {
    /// Roster file (TOML)
    #[arg(long, default_value = "data/roster.toml")]
    roster: PathBuf,

    /// Arena settings file (TOML); defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rounds of every-pair duels
    #[arg(long, default_value_t = 100)]
    rounds: u32,

    /// Random seed for repeatable runs (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Fight duels one at a time
    #[arg(long)]
    sequential: bool,

    /// Print the standings as JSON
    #[arg(long)]
    json: bool,

    /// Narrate one exhibition duel between the first two fighters before
    /// the tournament
    #[arg(long)]
    commentary: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => ArenaConfig::load(path)?,
        None => ArenaConfig::default(),
    };
    if args.seed.is_some() {
        settings.rng_seed = args.seed;
    }
    set_config(settings).map_err(|_| ArenaError::Config("configuration already installed".into()))?;

    let roster = Roster::load(&args.roster)?;
    let characters = roster.build()?;
    tracing::info!(fighters = characters.len(), roster = %args.roster.display(), "roster loaded");

    if args.commentary {
        if let [first, second, ..] = characters.as_slice() {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "=== Exhibition ===")?;
            writeln!(out, "{}", first)?;
            writeln!(out, "{}", second)?;
            Duel::new(Arc::clone(first), Arc::clone(second))
                .with_report(&mut out)
                .fight();
        } else {
            tracing::warn!("exhibition needs at least two fighters");
        }
    }

    let mut tournament = Tournament::new(characters, args.rounds);
    if args.sequential {
        tournament = tournament.sequential();
    }
    let report = tournament.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_standings(&report);
    }
    Ok(())
}

fn print_standings(report: &TournamentReport) {
    println!("Tournament Result");
    println!("=================");
    println!("Rounds: {}", report.rounds);
    println!("Duels:  {} ({} drawn)", report.duels, report.draws);
    println!();
    for (place, standing) in report.standings.iter().enumerate() {
        println!(
            "{:>3}. {:<20} {:<10} {:>6}",
            place + 1,
            standing.name,
            standing.controller,
            standing.points
        );
    }
}
