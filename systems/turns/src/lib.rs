#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn orchestrator driving a match through its phases.
//!
//! The orchestrator owns the grid, the portals, the players and the incident
//! buffer. Brains are only reached through [`Brain::send`] and
//! [`Brain::poll`], so [`Orchestrator::tick`] never blocks: a host calls it
//! repeatedly and each call advances at most one phase. Every waiting phase
//! is a barrier that clears only once each seat answered the request it was
//! sent with a reply of the expected kind stamped with the request's tick.

mod barrier;
mod config;
mod fight;
mod moves;
mod update;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use spellgrid_core::{Brain, Direction, Incident, Message, MessageBody, PlayerId, Tick};
use spellgrid_system_incidents::IncidentLog;
use spellgrid_system_players::Player;
use spellgrid_system_portals::Portals;
use spellgrid_system_spells::SpellCatalog;
use spellgrid_world::{Grid, GridError};
use thiserror::Error;
use tracing::debug;

use crate::barrier::Seat;

pub use config::ArenaConfig;

/// Errors raised while preparing a match.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    /// Every seat already has a brain.
    #[error("all {capacity} seats are taken")]
    SeatsFull {
        /// Number of seats in the match.
        capacity: u8,
    },
    /// The configuration cannot describe a playable match.
    #[error("invalid arena configuration: {0}")]
    InvalidConfig(&'static str),
    /// The arena could not be generated.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Step of the turn cycle the orchestrator is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for every seat to receive a brain.
    Starting,
    /// Waiting for every seat to acknowledge the handshake.
    WaitReady,
    /// Waiting for every seat to acknowledge the map.
    WaitMap,
    /// Waiting for one seat to choose its first spawn cell.
    WaitInitSpawn {
        /// Seat currently choosing.
        seat: PlayerId,
    },
    /// Waiting for the update that closes the initial spawns.
    WaitPlayerUpdateAck,
    /// About to offer destinations, or spawn cells to the dead.
    AskMove,
    /// Waiting for every seat's destination or spawn cell.
    WaitMove,
    /// Waiting for the update that closes the move phase.
    WaitMovePlayerUpdateAck,
    /// About to offer spells and targets.
    AskFight,
    /// Waiting for every seat's cast.
    WaitFight,
    /// Waiting for the update that closes the turn.
    WaitFightPlayerUpdateAck,
}

/// Authoritative match state and the phase machine that advances it.
pub struct Orchestrator<'a> {
    config: ArenaConfig,
    catalog: &'a SpellCatalog,
    rng: ChaCha8Rng,
    grid: Grid,
    portals: Portals,
    players: Vec<Player>,
    seats: Vec<Seat>,
    incidents: IncidentLog,
    phase: Phase,
    tick: Tick,
    turns: u32,
}

impl<'a> Orchestrator<'a> {
    /// Generates an arena from the configuration and prepares an empty table.
    ///
    /// The grid, the portals and every later random decision derive from
    /// `config.seed`.
    pub fn new(config: ArenaConfig, catalog: &'a SpellCatalog) -> Result<Self, OrchestratorError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut grid =
            Grid::generate_with(config.width, config.height, config.room_factor, &mut rng)?;
        let portals = Portals::setup(
            &mut grid,
            catalog,
            &mut rng,
            config.portal_count,
            config.portal_safe_zone,
        );
        Ok(Self::assemble(config, catalog, rng, grid, portals))
    }

    /// Prepares a table around an arena built elsewhere.
    ///
    /// The grid dimensions and portal settings of `config` are ignored.
    pub fn with_arena(
        config: ArenaConfig,
        catalog: &'a SpellCatalog,
        grid: Grid,
        portals: Portals,
    ) -> Result<Self, OrchestratorError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self::assemble(config, catalog, rng, grid, portals))
    }

    fn assemble(
        config: ArenaConfig,
        catalog: &'a SpellCatalog,
        rng: ChaCha8Rng,
        mut grid: Grid,
        portals: Portals,
    ) -> Self {
        grid.clear_players();
        let players = (0..config.players)
            .map(|id| Player::new(PlayerId::new(id)))
            .collect();
        Self {
            seats: Vec::with_capacity(usize::from(config.players)),
            config,
            catalog,
            rng,
            grid,
            portals,
            players,
            incidents: IncidentLog::new(),
            phase: Phase::Starting,
            tick: Tick::new(0),
            turns: 0,
        }
    }

    /// Seats `brain` at the next free place.
    pub fn add_brain(&mut self, brain: Box<dyn Brain>) -> Result<PlayerId, OrchestratorError> {
        let capacity = self.config.players;
        let id = u8::try_from(self.seats.len())
            .ok()
            .filter(|id| *id < capacity)
            .map(PlayerId::new)
            .ok_or(OrchestratorError::SeatsFull { capacity })?;
        self.seats.push(Seat::new(id, brain));
        Ok(id)
    }

    /// Advances the match by one step.
    ///
    /// The tick counter moves first, so requests sent during this call carry
    /// the new tick.
    pub fn tick(&mut self) {
        self.tick = self.tick.next();
        let phase = self.phase;
        let next = self.step(phase);
        if next != phase {
            debug!(tick = %self.tick, from = ?phase, to = ?next, "phase transition");
        }
        self.phase = next;
    }

    fn step(&mut self, phase: Phase) -> Phase {
        match phase {
            Phase::Starting => {
                if self.seats.len() < self.players.len() {
                    return phase;
                }
                self.broadcast(&MessageBody::AskReady);
                Phase::WaitReady
            }
            Phase::WaitReady => {
                if !self.all_answered() {
                    return phase;
                }
                let map = self
                    .grid
                    .to_map_payload(self.portals.placements(), self.config.players);
                self.broadcast(&MessageBody::Map(map));
                Phase::WaitMap
            }
            Phase::WaitMap => {
                if !self.all_answered() {
                    return phase;
                }
                let seat = PlayerId::new(0);
                self.ask_spawn(seat);
                Phase::WaitInitSpawn { seat }
            }
            Phase::WaitInitSpawn { seat } => {
                if !self.all_answered() {
                    return phase;
                }
                self.resolve_spawn(seat);
                let next = PlayerId::new(seat.get() + 1);
                if next.index() < self.players.len() {
                    self.ask_spawn(next);
                    return Phase::WaitInitSpawn { seat: next };
                }
                self.update_players();
                Phase::WaitPlayerUpdateAck
            }
            Phase::WaitPlayerUpdateAck | Phase::WaitFightPlayerUpdateAck => {
                if !self.all_answered() {
                    return phase;
                }
                Phase::AskMove
            }
            Phase::AskMove => {
                self.ask_moves();
                Phase::WaitMove
            }
            Phase::WaitMove => {
                if !self.all_answered() {
                    return phase;
                }
                self.resolve_moves();
                self.update_players();
                Phase::WaitMovePlayerUpdateAck
            }
            Phase::WaitMovePlayerUpdateAck => {
                if !self.all_answered() {
                    return phase;
                }
                Phase::AskFight
            }
            Phase::AskFight => {
                self.ask_fight();
                Phase::WaitFight
            }
            Phase::WaitFight => {
                if !self.all_answered() {
                    return phase;
                }
                let casts = self.collect_casts();
                self.resolve_fight(casts);
                self.apply_poison();
                self.resolve_deaths();
                for player in &mut self.players {
                    player.time_effects();
                }
                self.update_players();
                self.turns += 1;
                self.portals
                    .activate(self.turns, self.catalog, &mut self.rng);
                Phase::WaitFightPlayerUpdateAck
            }
        }
    }

    fn all_answered(&mut self) -> bool {
        barrier::all_answered(&mut self.seats)
    }

    fn send(&mut self, seat: PlayerId, body: MessageBody) {
        let message = Message::new(self.tick, body);
        if let Some(seat) = self.seats.get_mut(seat.index()) {
            seat.send(message);
        }
    }

    fn broadcast(&mut self, body: &MessageBody) {
        for seat in &mut self.seats {
            seat.send(Message::new(self.tick, body.clone()));
        }
    }

    /// Rebuilds the grid's player flags from the living players.
    fn sync_player_flags(&mut self) {
        self.grid.clear_players();
        for player in &self.players {
            if player.is_alive() {
                self.grid.set_player(player.position());
            }
        }
    }

    /// Phase the orchestrator will run on the next tick.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Tick of the most recent step.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Number of completed fight phases.
    #[must_use]
    pub const fn turns(&self) -> u32 {
        self.turns
    }

    /// Every player in seat order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player occupying a seat.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    /// Authoritative grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Authoritative portal set.
    #[must_use]
    pub const fn portals(&self) -> &Portals {
        &self.portals
    }

    /// Incidents recorded since the last player update.
    #[must_use]
    pub fn pending_incidents(&self) -> &[Incident] {
        self.incidents.as_slice()
    }

    /// Configuration the match runs with.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }
}

/// Facing to use when a reply names no usable one.
fn usable_facing(facing: Direction) -> Direction {
    if facing.is_facing() {
        facing
    } else {
        Direction::North
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, collections::VecDeque, rc::Rc, sync::Arc};

    use spellgrid_core::{Brain, Message, MessageBody, MessageKind, PlayerId, Tick};
    use spellgrid_system_portals::Portals;
    use spellgrid_system_spells::SpellCatalog;
    use spellgrid_world::Grid;

    use super::{ArenaConfig, Orchestrator, OrchestratorError, Phase};

    #[derive(Default)]
    pub(crate) struct Mailbox {
        pub(crate) inbox: Vec<Arc<Message>>,
        pub(crate) outbox: VecDeque<Message>,
    }

    impl Mailbox {
        pub(crate) fn last(&self) -> Option<&Arc<Message>> {
            self.inbox.last()
        }

        pub(crate) fn reply(&mut self, tick: Tick, body: MessageBody) {
            self.outbox.push_back(Message::new(tick, body));
        }
    }

    pub(crate) struct Scripted(pub(crate) Rc<RefCell<Mailbox>>);

    impl Brain for Scripted {
        fn send(&mut self, message: Arc<Message>) {
            self.0.borrow_mut().inbox.push(message);
        }

        fn poll(&mut self) -> Option<Message> {
            self.0.borrow_mut().outbox.pop_front()
        }
    }

    pub(crate) fn open_table(
        catalog: &SpellCatalog,
        players: u8,
    ) -> (Orchestrator<'_>, Vec<Rc<RefCell<Mailbox>>>) {
        let config = ArenaConfig {
            players,
            ..ArenaConfig::default()
        };
        let grid = Grid::open(12, 12).expect("grid");
        let mut orchestrator =
            Orchestrator::with_arena(config, catalog, grid, Portals::new()).expect("orchestrator");
        let mailboxes: Vec<_> = (0..players)
            .map(|_| Rc::new(RefCell::new(Mailbox::default())))
            .collect();
        for mailbox in &mailboxes {
            let _ = orchestrator
                .add_brain(Box::new(Scripted(Rc::clone(mailbox))))
                .expect("seat");
        }
        (orchestrator, mailboxes)
    }

    #[test]
    fn seats_fill_in_order_until_full() {
        let catalog = SpellCatalog::standard();
        let (mut orchestrator, _) = open_table(&catalog, 2);
        let extra = Rc::new(RefCell::new(Mailbox::default()));
        assert_eq!(
            orchestrator.add_brain(Box::new(Scripted(extra))).err(),
            Some(OrchestratorError::SeatsFull { capacity: 2 })
        );
    }

    #[test]
    fn starting_waits_for_every_seat() {
        let catalog = SpellCatalog::standard();
        let config = ArenaConfig {
            players: 2,
            ..ArenaConfig::default()
        };
        let grid = Grid::open(8, 8).expect("grid");
        let mut orchestrator =
            Orchestrator::with_arena(config, &catalog, grid, Portals::new()).expect("orchestrator");
        let mailbox = Rc::new(RefCell::new(Mailbox::default()));
        assert_eq!(
            orchestrator
                .add_brain(Box::new(Scripted(Rc::clone(&mailbox))))
                .expect("seat"),
            PlayerId::new(0)
        );

        orchestrator.tick();
        orchestrator.tick();
        assert_eq!(orchestrator.phase(), Phase::Starting);
        assert!(mailbox.borrow().inbox.is_empty());
        assert_eq!(orchestrator.current_tick(), Tick::new(2));
    }

    #[test]
    fn barrier_holds_until_the_last_seat_answers_correctly() {
        let catalog = SpellCatalog::standard();
        let (mut orchestrator, mailboxes) = open_table(&catalog, 4);

        orchestrator.tick();
        assert_eq!(orchestrator.phase(), Phase::WaitReady);
        let asked = mailboxes[0].borrow().last().expect("ask").tick();
        assert_eq!(asked, Tick::new(1));

        for mailbox in &mailboxes[..3] {
            mailbox.borrow_mut().reply(asked, MessageBody::ReplyReady);
        }
        mailboxes[3]
            .borrow_mut()
            .reply(Tick::new(99), MessageBody::ReplyReady);

        orchestrator.tick();
        assert_eq!(orchestrator.phase(), Phase::WaitReady);
        orchestrator.tick();
        assert_eq!(orchestrator.phase(), Phase::WaitReady);

        mailboxes[3]
            .borrow_mut()
            .reply(asked, MessageBody::ReplyReady);
        orchestrator.tick();
        assert_eq!(orchestrator.phase(), Phase::WaitMap);

        for mailbox in &mailboxes {
            let mailbox = mailbox.borrow();
            let map = mailbox.last().expect("map");
            assert_eq!(map.kind(), MessageKind::Map);
            let MessageBody::Map(payload) = map.body() else {
                panic!("expected a map");
            };
            assert_eq!(payload.player_count, 4);
            assert_eq!(payload.width, 12);
        }
    }

    #[test]
    fn initial_spawns_are_asked_one_seat_at_a_time() {
        let catalog = SpellCatalog::standard();
        let (mut orchestrator, mailboxes) = open_table(&catalog, 2);

        orchestrator.tick();
        for mailbox in &mailboxes {
            let tick = mailbox.borrow().last().expect("ask").tick();
            mailbox.borrow_mut().reply(tick, MessageBody::ReplyReady);
        }
        orchestrator.tick();
        for mailbox in &mailboxes {
            let tick = mailbox.borrow().last().expect("map").tick();
            mailbox.borrow_mut().reply(tick, MessageBody::ReplyMap);
        }
        orchestrator.tick();
        assert_eq!(
            orchestrator.phase(),
            Phase::WaitInitSpawn {
                seat: PlayerId::new(0)
            }
        );
        assert_eq!(mailboxes[1].borrow().inbox.len(), 2);

        let (tick, options) = {
            let mailbox = mailboxes[0].borrow();
            let request = mailbox.last().expect("spawn");
            let MessageBody::AskSpawn { player, options } = request.body() else {
                panic!("expected a spawn request");
            };
            assert_eq!(*player, PlayerId::new(0));
            (request.tick(), options.clone())
        };
        assert!(!options.is_empty());
        mailboxes[0].borrow_mut().reply(
            tick,
            MessageBody::ReplySpawn {
                position: options[0],
                facing: spellgrid_core::Direction::East,
            },
        );

        orchestrator.tick();
        assert_eq!(
            orchestrator.phase(),
            Phase::WaitInitSpawn {
                seat: PlayerId::new(1)
            }
        );
        let first = orchestrator.player(PlayerId::new(0)).expect("player");
        assert!(first.is_alive());
        assert_eq!(first.position(), options[0]);
        assert!(orchestrator.grid().is_player(options[0]));
    }
}
