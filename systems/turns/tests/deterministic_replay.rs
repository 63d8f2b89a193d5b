use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use spellgrid_brains::Autopilot;
use spellgrid_core::{Direction, PlayerId, Position};
use spellgrid_system_spells::SpellCatalog;
use spellgrid_system_turns::{ArenaConfig, Orchestrator, Phase};

const TURNS: u32 = 12;
const TICK_CEILING: u32 = 2_000;

#[test]
fn deterministic_replay_produces_identical_matches() {
    let first = replay(7);
    let second = replay(7);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.turns, TURNS);
    assert_eq!(
        first.fingerprint(),
        second.fingerprint(),
        "fingerprint mismatch"
    );
}

#[test]
fn seeds_change_the_arena() {
    let catalog = SpellCatalog::standard();
    let config = |seed| ArenaConfig {
        seed,
        ..ArenaConfig::default()
    };
    let first = Orchestrator::new(config(1), &catalog).expect("orchestrator");
    let second = Orchestrator::new(config(2), &catalog).expect("orchestrator");
    assert_ne!(first.grid(), second.grid());
}

#[test]
fn every_seat_spawns_before_the_first_move() {
    let catalog = SpellCatalog::standard();
    let mut orchestrator = seated(&catalog, 3, 11);

    let mut ticks = 0;
    while orchestrator.phase() != Phase::AskMove && ticks < TICK_CEILING {
        orchestrator.tick();
        ticks += 1;
    }

    assert_eq!(orchestrator.phase(), Phase::AskMove);
    for player in orchestrator.players() {
        assert!(player.is_alive());
        assert!(orchestrator.grid().is_player(player.position()));
        assert_ne!(player.facing(), Direction::Any);
        assert_eq!(player.charged_spells().count(), 1);
    }
    assert_eq!(orchestrator.turns(), 0);
}

fn seated(catalog: &SpellCatalog, players: u8, seed: u64) -> Orchestrator<'_> {
    let config = ArenaConfig {
        width: 24,
        height: 18,
        room_factor: 12,
        seed,
        players,
        portal_count: 6,
        portal_safe_zone: 4,
        spawn_safe_zone: 4,
        move_steps: 6,
        ..ArenaConfig::default()
    };
    let mut orchestrator = Orchestrator::new(config, catalog).expect("orchestrator");
    for seat in 0..players {
        let id = orchestrator
            .add_brain(Box::new(Autopilot::new()))
            .expect("seat");
        assert_eq!(id, PlayerId::new(seat));
    }
    orchestrator
}

fn replay(seed: u64) -> ReplayOutcome {
    let catalog = SpellCatalog::standard();
    let mut orchestrator = seated(&catalog, 2, seed);
    let mut phases = Vec::new();

    let mut ticks = 0;
    while orchestrator.turns() < TURNS && ticks < TICK_CEILING {
        orchestrator.tick();
        phases.push(format!("{:?}", orchestrator.phase()));
        ticks += 1;
    }

    let players = orchestrator
        .players()
        .iter()
        .map(|player| PlayerRecord {
            position: player.position(),
            health: player.health(),
            kills: player.kills(),
            deaths: player.deaths(),
        })
        .collect();

    ReplayOutcome {
        turns: orchestrator.turns(),
        ticks,
        phases,
        players,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    turns: u32,
    ticks: u32,
    phases: Vec<String>,
    players: Vec<PlayerRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PlayerRecord {
    position: Position,
    health: i32,
    kills: i32,
    deaths: u32,
}
