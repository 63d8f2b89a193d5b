use spellgrid_core::{MessageBody, PlayerId, PlayerUpdate};
use spellgrid_system_incidents::Observer;

use crate::Orchestrator;

impl Orchestrator<'_> {
    /// Everything `id` may learn at the end of the current phase.
    ///
    /// Other players are listed when they are tagged or in sight; a dead
    /// observer sees every other player. Players left out are omitted
    /// entirely.
    pub(crate) fn build_player_update(&self, id: PlayerId) -> Option<PlayerUpdate> {
        let me = self.players.get(id.index())?;
        let sight = me.line_of_sight();
        let alive = me.is_alive();

        let others = self
            .players
            .iter()
            .filter(|other| other.id() != id)
            .filter(|other| {
                !alive || me.is_tagged(other.id()) || sight.contains(other.position())
            })
            .map(|other| other.snapshot())
            .collect();

        Some(PlayerUpdate {
            me: me.snapshot(),
            line_of_sight: sight.as_slice().to_vec(),
            others,
            portals: self.portals.sightings_in(sight),
            incidents: self
                .incidents
                .redacted_for(&Observer::new(id, alive, sight)),
        })
    }

    /// Sends every seat its update and empties the incident buffer.
    pub(crate) fn update_players(&mut self) {
        for index in 0..self.players.len() {
            let id = self.players[index].id();
            if let Some(update) = self.build_player_update(id) {
                self.send(id, MessageBody::PlayerUpdate(Box::new(update)));
            }
        }
        self.incidents.clear();
    }
}
