use spellgrid_core::{Direction, Incident, IncidentKind, MessageBody, PlayerId, Position};
use spellgrid_system_spells::Spell;
use tracing::{debug, info};

use crate::{usable_facing, Orchestrator};

impl Orchestrator<'_> {
    /// Offers spawn cells to a seat.
    ///
    /// When every open cell is watched or crowded, any empty cell is offered
    /// instead so the seat can still come back.
    pub(crate) fn ask_spawn(&mut self, seat: PlayerId) {
        let mut options = self.grid.valid_spawns(
            self.config.spawn_options,
            self.config.spawn_safe_zone,
            &mut self.rng,
        );
        if options.is_empty() {
            debug!(seat = %seat, "no safe spawn cell, offering any empty cell");
            options = self.grid.empty_spaces();
            options.shuffle(&mut self.rng);
        }
        let options = options.iter().take(self.config.spawn_options).collect();
        self.send(
            seat,
            MessageBody::AskSpawn {
                player: seat,
                options,
            },
        );
    }

    /// Applies the answer to an outstanding spawn request.
    pub(crate) fn resolve_spawn(&mut self, seat: PlayerId) {
        let Some((request, reply)) = self
            .seats
            .get_mut(seat.index())
            .and_then(|seat| seat.take_exchange())
        else {
            return;
        };
        if let (
            MessageBody::AskSpawn { options, .. },
            MessageBody::ReplySpawn { position, facing },
        ) = (request.body(), reply.body())
        {
            self.spawn(seat, options, *position, *facing);
        }
    }

    /// Offers destinations to the living and spawn cells to the dead.
    pub(crate) fn ask_moves(&mut self) {
        for index in 0..self.players.len() {
            let player = &self.players[index];
            let seat = player.id();
            if player.is_alive() {
                let options = self
                    .grid
                    .valid_moves(player.position(), self.config.move_steps);
                self.send(
                    seat,
                    MessageBody::AskMove {
                        options: options.into(),
                    },
                );
            } else {
                self.ask_spawn(seat);
            }
        }
    }

    /// Tags visible opponents, then applies every seat's move or spawn.
    pub(crate) fn resolve_moves(&mut self) {
        self.tag_visible_opponents();

        for index in 0..self.seats.len() {
            let Some((request, reply)) = self.seats[index].take_exchange() else {
                continue;
            };
            let seat = self.players[index].id();
            match (request.body(), reply.body()) {
                (
                    MessageBody::AskSpawn { options, .. },
                    MessageBody::ReplySpawn { position, facing },
                ) => self.spawn(seat, options, *position, *facing),
                (
                    MessageBody::AskMove { options },
                    MessageBody::ReplyMove {
                        destination,
                        facing,
                    },
                ) => self.relocate(seat, options, *destination, *facing),
                _ => {}
            }
        }
    }

    /// Remembers every opponent each player sees before anyone moves.
    ///
    /// A tag lasts until the next move phase, so an opponent that walks out
    /// of sight is still reported once more.
    fn tag_visible_opponents(&mut self) {
        let positions: Vec<(PlayerId, Position)> = self
            .players
            .iter()
            .filter(|player| player.is_alive())
            .map(|player| (player.id(), player.position()))
            .collect();

        for player in &mut self.players {
            player.clear_tags();
            for (other, position) in &positions {
                if *other != player.id() && player.line_of_sight().contains(*position) {
                    player.tag(*other);
                }
            }
        }
    }

    pub(crate) fn spawn(
        &mut self,
        seat: PlayerId,
        options: &[Position],
        position: Position,
        facing: Direction,
    ) {
        if self.players[seat.index()].is_alive() {
            return;
        }
        let Some(fallback) = options.first().copied() else {
            debug!(seat = %seat, "no spawn cell was offered");
            return;
        };
        let position = if options.contains(&position) {
            position
        } else {
            fallback
        };

        let granted = self.players[seat.index()].spawn(
            &self.grid,
            self.catalog,
            &mut self.rng,
            position,
            usable_facing(facing),
        );
        self.sync_player_flags();
        info!(
            seat = %seat,
            %position,
            spell = granted.map_or("none", |spell| self.catalog.name(spell)),
            "player spawned"
        );
    }

    pub(crate) fn relocate(
        &mut self,
        seat: PlayerId,
        options: &[Position],
        destination: Position,
        facing: Direction,
    ) {
        let player = &self.players[seat.index()];
        if !player.is_alive() {
            return;
        }
        let from = player.position();
        let destination = if options.contains(&destination) {
            destination
        } else {
            from
        };

        let mut incident = Incident::new(IncidentKind::PlayerMove, from).with_origin(seat);
        let _ = incident.add_target(destination);
        self.incidents.record(incident);

        let _ = self.players[seat.index()].place(&self.grid, destination, usable_facing(facing));
        self.sync_player_flags();
        self.visit_portal(seat);
    }

    /// Grants the portal's spell to a player standing on it.
    ///
    /// Nothing happens while the player still holds a charged spell of the
    /// portal's element.
    fn visit_portal(&mut self, seat: PlayerId) {
        let catalog = self.catalog;
        let player = &mut self.players[seat.index()];
        let position = player.position();
        let Some(portal) = self.portals.get_at_mut(position) else {
            return;
        };
        let kind = portal.kind();
        if player.spell(kind).is_some_and(|held| held.charges() > 0) {
            return;
        }
        let ready_again = self.turns.saturating_add(self.config.portal_cooldown);
        let Some(spell) = portal.grant(ready_again) else {
            return;
        };

        let charges = catalog.get_by_id(spell).map_or(0, Spell::charges);
        player.grant_spell(kind, spell, charges);
        self.incidents.record(
            Incident::new(IncidentKind::Portal, position)
                .with_origin(seat)
                .with_spell(spell, kind),
        );
        info!(
            seat = %seat,
            %position,
            spell = catalog.name(spell),
            "portal granted a spell"
        );
    }
}
