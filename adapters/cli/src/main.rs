#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Spellgrid match between
//! autopilot seats and prints the final scoreboard.

mod config;

use std::{fmt::Write as _, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use spellgrid_brains::Autopilot;
use spellgrid_system_players::Player;
use spellgrid_system_spells::SpellCatalog;
use spellgrid_system_turns::{ArenaConfig, Orchestrator};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Ticks allowed per requested turn before the match is abandoned.
const TICKS_PER_TURN: u64 = 64;

/// Command-line arguments accepted by the binary.
#[derive(Debug, Parser)]
#[command(name = "spellgrid", about = "Plays a headless match between autopilot seats")]
struct Cli {
    /// TOML file with arena settings; flags below take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of seats.
    #[arg(long)]
    players: Option<u8>,
    /// Seed of the match.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of grid columns.
    #[arg(long)]
    width: Option<i32>,
    /// Number of grid rows.
    #[arg(long)]
    height: Option<i32>,
    /// Full turns to play.
    #[arg(long, default_value_t = 20)]
    turns: u32,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn arena(&self) -> Result<ArenaConfig> {
        let mut arena = config::load(self.config.as_deref())?;
        if let Some(players) = self.players {
            arena.players = players;
        }
        if let Some(seed) = self.seed {
            arena.seed = seed;
        }
        if let Some(width) = self.width {
            arena.width = width;
        }
        if let Some(height) = self.height {
            arena.height = height;
        }
        Ok(arena)
    }
}

/// Entry point for the Spellgrid command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let arena = cli.arena()?;
    let catalog = SpellCatalog::standard();
    let mut orchestrator =
        Orchestrator::new(arena, &catalog).context("failed to prepare the arena")?;
    for _ in 0..orchestrator.config().players {
        let _ = orchestrator.add_brain(Box::new(Autopilot::new()))?;
    }

    let ceiling = u64::from(cli.turns.max(1)) * TICKS_PER_TURN;
    let mut ticks = 0u64;
    while orchestrator.turns() < cli.turns && ticks < ceiling {
        orchestrator.tick();
        ticks += 1;
    }

    if orchestrator.turns() < cli.turns {
        warn!(
            turns = orchestrator.turns(),
            ticks, "tick ceiling reached before the last turn"
        );
    }
    info!(turns = orchestrator.turns(), ticks, "match finished");

    print!("{}", scoreboard(orchestrator.players()));
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log filter `{level}`"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!(error))
}

/// One line per seat: kills, deaths and remaining health.
fn scoreboard(players: &[Player]) -> String {
    let mut board = String::new();
    for player in players {
        let _ = writeln!(
            board,
            "seat {}: kills {}, deaths {}, health {}",
            player.id().index(),
            player.kills(),
            player.deaths(),
            player.health()
        );
    }
    board
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use spellgrid_core::PlayerId;
    use spellgrid_system_players::Player;

    use super::{scoreboard, Cli};

    #[test]
    fn flags_override_the_defaults() {
        let cli = Cli::parse_from(["spellgrid", "--players", "4", "--seed", "9", "--width", "24"]);
        let arena = cli.arena().expect("arena");
        assert_eq!(arena.players, 4);
        assert_eq!(arena.seed, 9);
        assert_eq!(arena.width, 24);
        assert_eq!(arena.height, 30);
        assert_eq!(cli.turns, 20);
    }

    #[test]
    fn scoreboard_lists_every_seat() {
        let players = [Player::new(PlayerId::new(0)), Player::new(PlayerId::new(1))];
        let board = scoreboard(&players);
        assert_eq!(
            board,
            "seat 0: kills 0, deaths 0, health 0\nseat 1: kills 0, deaths 0, health 0\n"
        );
    }
}
