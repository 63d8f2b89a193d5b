//! Request/reply catalog exchanged between the orchestrator and brains.

use serde::{Deserialize, Serialize};

use crate::{Direction, ElementKind, Incident, PlayerId, Position, SpellId, Tick};

/// Discriminant of every message in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Handshake request.
    AskReady,
    /// Handshake acknowledgement.
    ReplyReady,
    /// Full map broadcast.
    Map,
    /// Map acknowledgement.
    ReplyMap,
    /// Request to choose a spawn cell.
    AskSpawn,
    /// Chosen spawn cell and facing.
    ReplySpawn,
    /// Request to choose a destination.
    AskMove,
    /// Chosen destination and facing.
    ReplyMove,
    /// Request to choose a spell and target.
    AskFight,
    /// Chosen spell and target.
    ReplyFight,
    /// Redacted per-player state broadcast.
    PlayerUpdate,
    /// Player update acknowledgement.
    ReplyPlayerUpdate,
    /// End of match summary.
    Report,
    /// Report acknowledgement.
    ReplyReport,
}

impl MessageKind {
    /// Reply kind that answers this request, if it is a request.
    #[must_use]
    pub const fn expected_reply(self) -> Option<MessageKind> {
        match self {
            MessageKind::AskReady => Some(MessageKind::ReplyReady),
            MessageKind::Map => Some(MessageKind::ReplyMap),
            MessageKind::AskSpawn => Some(MessageKind::ReplySpawn),
            MessageKind::AskMove => Some(MessageKind::ReplyMove),
            MessageKind::AskFight => Some(MessageKind::ReplyFight),
            MessageKind::PlayerUpdate => Some(MessageKind::ReplyPlayerUpdate),
            MessageKind::Report => Some(MessageKind::ReplyReport),
            MessageKind::ReplyReady
            | MessageKind::ReplyMap
            | MessageKind::ReplySpawn
            | MessageKind::ReplyMove
            | MessageKind::ReplyFight
            | MessageKind::ReplyPlayerUpdate
            | MessageKind::ReplyReport => None,
        }
    }
}

/// Tick-stamped message exchanged with a brain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    tick: Tick,
    body: MessageBody,
}

impl Message {
    /// Creates a message stamped with the provided tick.
    #[must_use]
    pub const fn new(tick: Tick, body: MessageBody) -> Self {
        Self { tick, body }
    }

    /// Tick the message was issued at, or the tick a reply answers.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Payload of the message.
    #[must_use]
    pub const fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Consumes the message, yielding its payload.
    #[must_use]
    pub fn into_body(self) -> MessageBody {
        self.body
    }

    /// Discriminant of the payload.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    /// Builds the payload-free acknowledgement for this request.
    ///
    /// Only handshake, map, update and report requests can be acknowledged
    /// without a decision; the other requests return `None`.
    #[must_use]
    pub fn acknowledgement(&self) -> Option<Message> {
        let body = match self.kind() {
            MessageKind::AskReady => MessageBody::ReplyReady,
            MessageKind::Map => MessageBody::ReplyMap,
            MessageKind::PlayerUpdate => MessageBody::ReplyPlayerUpdate,
            MessageKind::Report => MessageBody::ReplyReport,
            _ => return None,
        };
        Some(Message::new(self.tick, body))
    }
}

/// Payload of a [`Message`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    /// Asks the seat to confirm it is connected.
    AskReady,
    /// Confirms the seat is connected.
    ReplyReady,
    /// Full map description sent once per session.
    Map(MapPayload),
    /// Confirms the map was received.
    ReplyMap,
    /// Asks the seat to choose where to (re)spawn.
    AskSpawn {
        /// Seat being spawned.
        player: PlayerId,
        /// Cells the seat may choose from.
        options: Vec<Position>,
    },
    /// Chosen spawn cell.
    ReplySpawn {
        /// Selected cell, expected to be one of the offered options.
        position: Position,
        /// Initial facing.
        facing: Direction,
    },
    /// Asks the seat to choose a destination.
    AskMove {
        /// Reachable destinations.
        options: Vec<Position>,
    },
    /// Chosen destination.
    ReplyMove {
        /// Selected cell, expected to be one of the offered options.
        destination: Position,
        /// Facing after the move.
        facing: Direction,
    },
    /// Asks the seat to choose a spell and a target.
    AskFight {
        /// One offer per element the seat can cast.
        offers: Vec<FightOffer>,
    },
    /// Chosen spell and target.
    ReplyFight {
        /// Spell to cast, or `None` to skip the fight phase.
        spell: Option<SpellId>,
        /// Targeted cell.
        target: Position,
    },
    /// Redacted view of the world for one seat.
    PlayerUpdate(Box<PlayerUpdate>),
    /// Confirms the update was processed.
    ReplyPlayerUpdate,
    /// End of match summary.
    Report,
    /// Confirms the report was received.
    ReplyReport,
}

impl MessageBody {
    /// Discriminant of the payload.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            MessageBody::AskReady => MessageKind::AskReady,
            MessageBody::ReplyReady => MessageKind::ReplyReady,
            MessageBody::Map(_) => MessageKind::Map,
            MessageBody::ReplyMap => MessageKind::ReplyMap,
            MessageBody::AskSpawn { .. } => MessageKind::AskSpawn,
            MessageBody::ReplySpawn { .. } => MessageKind::ReplySpawn,
            MessageBody::AskMove { .. } => MessageKind::AskMove,
            MessageBody::ReplyMove { .. } => MessageKind::ReplyMove,
            MessageBody::AskFight { .. } => MessageKind::AskFight,
            MessageBody::ReplyFight { .. } => MessageKind::ReplyFight,
            MessageBody::PlayerUpdate(_) => MessageKind::PlayerUpdate,
            MessageBody::ReplyPlayerUpdate => MessageKind::ReplyPlayerUpdate,
            MessageBody::Report => MessageKind::Report,
            MessageBody::ReplyReport => MessageKind::ReplyReport,
        }
    }
}

/// Portal location and element announced with the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalPlacement {
    /// Cell hosting the portal.
    pub position: Position,
    /// Element of spells the portal grants.
    pub kind: ElementKind,
}

/// Complete grid description.
///
/// `cells` stores raw flag bytes in column-major order, one byte per cell at
/// index `x * height + y`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPayload {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
    /// Raw cell flag bytes.
    pub cells: Vec<u8>,
    /// Every portal on the map.
    pub portals: Vec<PortalPlacement>,
    /// Number of seats in the session.
    pub player_count: u8,
}

/// A spell a seat may cast together with the cells it may target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightOffer {
    /// Element slot of the spell.
    pub kind: ElementKind,
    /// Spell held in that slot.
    pub spell: SpellId,
    /// Charges remaining before the cast.
    pub charges: u8,
    /// Visible cells within the spell's maximum range.
    pub targets: Vec<Position>,
}

/// Spell held in one element slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeldSpellState {
    /// Spell held.
    pub spell: SpellId,
    /// Charges remaining.
    pub charges: u8,
}

/// Lingering effect reported by spell and remaining duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEffectState {
    /// Spell that caused the effect.
    pub spell: SpellId,
    /// Turns left before the effect expires.
    pub remaining: i32,
}

/// Wire form of a player's public state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Seat of the player.
    pub id: PlayerId,
    /// Current cell, or [`Position::UNKNOWN`] while dead.
    pub position: Position,
    /// Current facing.
    pub facing: Direction,
    /// Remaining health.
    pub health: i32,
    /// Kill counter, reduced by self-inflicted deaths.
    pub kills: i32,
    /// Death counter.
    pub deaths: u32,
    /// Spell slots indexed by [`ElementKind::index`].
    pub spells: [Option<HeldSpellState>; ElementKind::COUNT],
    /// Active lingering effects.
    pub effects: Vec<StatusEffectState>,
}

/// Portal seen by a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalSighting {
    /// Cell hosting the portal.
    pub position: Position,
    /// Element of spells the portal grants.
    pub kind: ElementKind,
    /// Spell currently on offer, if any.
    pub spell: Option<SpellId>,
}

/// Everything one player is allowed to learn at the end of a phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    /// Full state of the receiving player.
    pub me: PlayerState,
    /// Cells the receiving player can currently see.
    pub line_of_sight: Vec<Position>,
    /// Other players that are visible or tagged.
    pub others: Vec<PlayerState>,
    /// Portals within line of sight.
    pub portals: Vec<PortalSighting>,
    /// Incidents of the phase, redacted for the receiver.
    pub incidents: Vec<Incident>,
}

#[cfg(test)]
mod tests {
    use super::{
        FightOffer, HeldSpellState, MapPayload, Message, MessageBody, MessageKind, PlayerState,
        PlayerUpdate, PortalPlacement, PortalSighting, StatusEffectState,
    };
    use crate::tests::assert_round_trip;
    use crate::{
        AppliedEffect, Direction, EffectKind, EffectPayload, ElementKind, Incident, IncidentKind,
        PlayerId, Position, SpellId, Tick,
    };

    fn sample_state(id: u8) -> PlayerState {
        let mut spells = [None; ElementKind::COUNT];
        spells[ElementKind::Fire.index()] = Some(HeldSpellState {
            spell: SpellId::new(14),
            charges: 3,
        });
        PlayerState {
            id: PlayerId::new(id),
            position: Position::new(4, 2),
            facing: Direction::East,
            health: 76,
            kills: -1,
            deaths: 2,
            spells,
            effects: vec![StatusEffectState {
                spell: SpellId::new(2),
                remaining: 2,
            }],
        }
    }

    #[test]
    fn requests_name_their_replies() {
        assert_eq!(
            MessageKind::AskMove.expected_reply(),
            Some(MessageKind::ReplyMove)
        );
        assert_eq!(
            MessageKind::PlayerUpdate.expected_reply(),
            Some(MessageKind::ReplyPlayerUpdate)
        );
        assert_eq!(MessageKind::ReplyFight.expected_reply(), None);
    }

    #[test]
    fn acknowledgement_keeps_request_tick() {
        let request = Message::new(Tick::new(41), MessageBody::AskReady);
        let reply = request.acknowledgement().expect("ready can be acknowledged");
        assert_eq!(reply.tick(), Tick::new(41));
        assert_eq!(reply.kind(), MessageKind::ReplyReady);

        let ask_move = Message::new(Tick::new(3), MessageBody::AskMove { options: vec![] });
        assert!(ask_move.acknowledgement().is_none());
    }

    #[test]
    fn map_message_round_trips_through_bincode() {
        let message = Message::new(
            Tick::new(2),
            MessageBody::Map(MapPayload {
                width: 2,
                height: 2,
                cells: vec![2, 0, 4, 2],
                portals: vec![PortalPlacement {
                    position: Position::new(1, 0),
                    kind: ElementKind::Water,
                }],
                player_count: 2,
            }),
        );
        assert_round_trip(&message);
    }

    #[test]
    fn fight_messages_round_trip_through_bincode() {
        assert_round_trip(&Message::new(
            Tick::new(8),
            MessageBody::AskFight {
                offers: vec![FightOffer {
                    kind: ElementKind::Air,
                    spell: SpellId::new(9),
                    charges: 4,
                    targets: vec![Position::new(1, 1), Position::new(2, 1)],
                }],
            },
        ));
        assert_round_trip(&Message::new(
            Tick::new(8),
            MessageBody::ReplyFight {
                spell: None,
                target: Position::UNKNOWN,
            },
        ));
    }

    #[test]
    fn player_update_round_trips_through_bincode() {
        let mut incident = Incident::new(IncidentKind::Spell, Position::new(4, 2))
            .with_origin(PlayerId::new(0))
            .with_spell(SpellId::new(14), ElementKind::Fire);
        incident.add_target(Position::new(6, 2)).effects.push(AppliedEffect {
            kind: EffectKind::Damage,
            victim: PlayerId::new(1),
            at: Position::new(6, 2),
            payload: EffectPayload::Damage(30),
        });

        let update = PlayerUpdate {
            me: sample_state(0),
            line_of_sight: vec![Position::new(4, 2), Position::new(5, 2)],
            others: vec![sample_state(1)],
            portals: vec![PortalSighting {
                position: Position::new(5, 2),
                kind: ElementKind::Earth,
                spell: Some(SpellId::new(5)),
            }],
            incidents: vec![incident],
        };
        assert_round_trip(&Message::new(
            Tick::new(17),
            MessageBody::PlayerUpdate(Box::new(update)),
        ));
    }
}
