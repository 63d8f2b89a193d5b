use std::{collections::VecDeque, sync::Arc};

use spellgrid_core::{
    Brain, Direction, FightOffer, Message, MessageBody, PlayerUpdate, Position, PositionSet,
};
use spellgrid_system_players::Roster;
use spellgrid_system_spells::SpellCatalog;
use spellgrid_world::Grid;
use tracing::debug;

/// Deterministic brain that answers each request on the next poll.
///
/// It rebuilds the map from the `Map` broadcast and tracks opponents from
/// player updates. It walks toward the nearest known opponent, or as far as
/// it can while nobody is in sight, and casts the first offensive spell that
/// can reach an opponent.
#[derive(Debug)]
pub struct Autopilot {
    catalog: SpellCatalog,
    grid: Option<Grid>,
    roster: Roster,
    replies: VecDeque<Message>,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}

impl Autopilot {
    /// Creates an autopilot that knows the standard spell catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(SpellCatalog::standard())
    }

    /// Creates an autopilot that reads spell ids from `catalog`.
    #[must_use]
    pub fn with_catalog(catalog: SpellCatalog) -> Self {
        Self {
            catalog,
            grid: None,
            roster: Roster::default(),
            replies: VecDeque::new(),
        }
    }

    /// Client-side mirror of the seats.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    fn answer(&mut self, request: &Message) -> Option<Message> {
        let body = match request.body() {
            MessageBody::Map(payload) => {
                match Grid::from_map_payload(payload) {
                    Ok(grid) => self.grid = Some(grid),
                    Err(error) => debug!(%error, "map could not be rebuilt"),
                }
                self.roster = Roster::new(payload.player_count);
                MessageBody::ReplyMap
            }
            MessageBody::PlayerUpdate(update) => {
                self.observe(update);
                MessageBody::ReplyPlayerUpdate
            }
            MessageBody::AskSpawn { options, .. } => self.choose_spawn(options),
            MessageBody::AskMove { options } => self.choose_move(options),
            MessageBody::AskFight { offers } => self.choose_cast(offers),
            _ => return request.acknowledgement(),
        };
        Some(Message::new(request.tick(), body))
    }

    fn observe(&mut self, update: &PlayerUpdate) {
        self.roster.apply_update(update);
    }

    fn position(&self) -> Option<Position> {
        let me = self.roster.me()?;
        self.roster
            .get(me)
            .map(|state| state.position)
            .filter(|position| position.is_known())
    }

    fn nearest_opponent(&self, from: Position) -> Option<Position> {
        self.roster
            .visible_opponents()
            .filter(|state| state.health > 0)
            .map(|state| state.position)
            .min_by_key(|position| from.distance_squared(*position))
    }

    fn choose_spawn(&self, options: &[Position]) -> MessageBody {
        let position = options.first().copied().unwrap_or(Position::UNKNOWN);
        let facing = match &self.grid {
            Some(grid) => {
                let centre = Position::new(grid.width() / 2, grid.height() / 2);
                Direction::toward(position, centre)
            }
            None => Direction::North,
        };
        MessageBody::ReplySpawn { position, facing }
    }

    fn choose_move(&self, options: &[Position]) -> MessageBody {
        let here = self.position().or_else(|| options.first().copied());
        let Some(here) = here else {
            return MessageBody::ReplyMove {
                destination: Position::UNKNOWN,
                facing: Direction::North,
            };
        };
        let offered: PositionSet = options.iter().copied().collect();

        if let (Some(opponent), Some(grid)) = (self.nearest_opponent(here), &self.grid) {
            let destination = grid.closest(opponent, &offered).unwrap_or(here);
            return MessageBody::ReplyMove {
                destination,
                facing: facing_or(Direction::toward(destination, opponent), Direction::North),
            };
        }

        let destination = options
            .iter()
            .copied()
            .fold(here, |best, candidate| {
                if here.distance_squared(candidate) > here.distance_squared(best) {
                    candidate
                } else {
                    best
                }
            });
        MessageBody::ReplyMove {
            destination,
            facing: facing_or(Direction::toward(here, destination), Direction::North),
        }
    }

    fn choose_cast(&self, offers: &[FightOffer]) -> MessageBody {
        let opponents: Vec<Position> = self
            .roster
            .visible_opponents()
            .filter(|state| state.health > 0)
            .map(|state| state.position)
            .collect();

        let cast = offers
            .iter()
            .filter(|offer| {
                self.catalog
                    .get_by_id(offer.spell)
                    .is_some_and(|spell| !spell.is_defensive())
            })
            .find_map(|offer| {
                opponents
                    .iter()
                    .find(|opponent| offer.targets.contains(opponent))
                    .map(|target| (offer.spell, *target))
            });

        match cast {
            Some((spell, target)) => MessageBody::ReplyFight {
                spell: Some(spell),
                target,
            },
            None => MessageBody::ReplyFight {
                spell: None,
                target: Position::UNKNOWN,
            },
        }
    }
}

fn facing_or(facing: Direction, fallback: Direction) -> Direction {
    if facing.is_facing() {
        facing
    } else {
        fallback
    }
}

impl Brain for Autopilot {
    fn send(&mut self, message: Arc<Message>) {
        if let Some(reply) = self.answer(&message) {
            self.replies.push_back(reply);
        }
    }

    fn poll(&mut self) -> Option<Message> {
        self.replies.pop_front()
    }
}
