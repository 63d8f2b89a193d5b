#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-turn incident buffer and its per-observer redaction.
//!
//! Incidents accumulate while a phase resolves and are projected into every
//! player update before the buffer is cleared. Projection never mutates the
//! buffer, so redacting twice for the same observer yields the same output.

use spellgrid_core::{Incident, IncidentTarget, PlayerId, Position, PositionSet};

/// What a single player is allowed to learn about an incident.
#[derive(Clone, Copy, Debug)]
pub struct Observer<'a> {
    id: PlayerId,
    alive: bool,
    line_of_sight: &'a PositionSet,
}

impl<'a> Observer<'a> {
    /// Creates an observer from its seat, liveness and visible cells.
    #[must_use]
    pub const fn new(id: PlayerId, alive: bool, line_of_sight: &'a PositionSet) -> Self {
        Self {
            id,
            alive,
            line_of_sight,
        }
    }

    /// Dead observers see everything; living ones see their line of sight.
    fn sees(&self, position: Position) -> bool {
        !self.alive || self.line_of_sight.contains(position)
    }

    /// Copy of `incident` holding only what the observer may learn.
    ///
    /// Kind, origin cell and element always survive. The acting player and
    /// the spell survive when the observer acted, is dead or can see the
    /// origin cell. A target survives when the actor is known or the target
    /// cell is visible; its effects survive only where they are visible.
    #[must_use]
    pub fn redact(&self, incident: &Incident) -> Incident {
        let caster_seen = incident.origin == Some(self.id) || self.sees(incident.from);

        let targets = incident
            .targets
            .iter()
            .filter(|target| caster_seen || self.sees(target.position))
            .map(|target| self.redact_target(target))
            .collect();

        Incident {
            kind: incident.kind,
            from: incident.from,
            origin: incident.origin.filter(|_| caster_seen),
            spell: incident.spell.filter(|_| caster_seen),
            element: incident.element,
            targets,
        }
    }

    fn redact_target(&self, target: &IncidentTarget) -> IncidentTarget {
        let mut redacted = IncidentTarget::at(target.position);
        if self.sees(target.position) {
            redacted.effects = target
                .effects
                .iter()
                .filter(|effect| self.sees(effect.at))
                .copied()
                .collect();
        }
        redacted
    }
}

/// Incidents recorded during the current phase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncidentLog {
    incidents: Vec<Incident>,
}

impl IncidentLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an incident.
    pub fn record(&mut self, incident: Incident) {
        self.incidents.push(incident);
    }

    /// Drops every recorded incident.
    pub fn clear(&mut self) {
        self.incidents.clear();
    }

    /// Number of recorded incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Reports whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Recorded incidents in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Incident] {
        &self.incidents
    }

    /// Every incident redacted for `observer`, in recording order.
    #[must_use]
    pub fn redacted_for(&self, observer: &Observer<'_>) -> Vec<Incident> {
        self.incidents
            .iter()
            .map(|incident| observer.redact(incident))
            .collect()
    }
}
