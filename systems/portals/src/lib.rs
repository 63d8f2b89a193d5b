#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Portals hand out elemental spells to players standing on them.
//!
//! A portal offers at most one spell at a time. Granting the spell arms a
//! cooldown; once the cooldown turn is reached the next activation sweep
//! rolls a fresh spell of the portal's element.

use rand::Rng;
use spellgrid_core::{
    ElementKind, MapPayload, PortalPlacement, PortalSighting, Position, PositionSet, SpellId,
};
use spellgrid_system_spells::SpellCatalog;
use spellgrid_world::Grid;

/// A single portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Portal {
    position: Position,
    kind: ElementKind,
    spell: Option<SpellId>,
    ready_again: Option<u32>,
}

impl Portal {
    /// Creates a portal offering `spell`, not cooling down.
    #[must_use]
    pub const fn new(position: Position, kind: ElementKind, spell: Option<SpellId>) -> Self {
        Self {
            position,
            kind,
            spell,
            ready_again: None,
        }
    }

    /// Cell the portal occupies.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Element of the spells the portal hands out.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Spell currently on offer.
    #[must_use]
    pub const fn spell(&self) -> Option<SpellId> {
        self.spell
    }

    /// Turn on which the portal rolls a new spell, if cooling down.
    #[must_use]
    pub const fn ready_again(&self) -> Option<u32> {
        self.ready_again
    }

    /// Hands out the current spell and starts cooling down until
    /// `ready_again`.
    ///
    /// The cooldown is armed even when nothing was on offer.
    pub fn grant(&mut self, ready_again: u32) -> Option<SpellId> {
        self.ready_again = Some(ready_again);
        self.spell
    }

    /// Wire form announcing the portal in a map payload.
    #[must_use]
    pub const fn placement(&self) -> PortalPlacement {
        PortalPlacement {
            position: self.position,
            kind: self.kind,
        }
    }

    /// Wire form reporting the portal to an observer.
    #[must_use]
    pub const fn sighting(&self) -> PortalSighting {
        PortalSighting {
            position: self.position,
            kind: self.kind,
            spell: self.spell,
        }
    }
}

/// Every portal of an arena.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Portals {
    portals: Vec<Portal>,
}

impl Portals {
    /// Creates an empty portal set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places up to `count` portals on spawn-safe cells of the grid.
    ///
    /// Elements are assigned round-robin and every portal starts with a
    /// random spell of its element.
    pub fn setup<R>(
        grid: &mut Grid,
        catalog: &SpellCatalog,
        rng: &mut R,
        count: usize,
        safe_zone: u8,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let cells = grid.valid_spawns(count, safe_zone, rng);
        let mut portals = Self::new();
        for (index, position) in cells.iter().enumerate() {
            let kind = ElementKind::ALL[index % ElementKind::COUNT];
            grid.set_portal(position);
            portals.add_kind(catalog, rng, kind, position);
        }
        portals
    }

    /// Mirrors the portals announced in a map payload, none offering a spell.
    #[must_use]
    pub fn from_map_payload(payload: &MapPayload) -> Self {
        Self {
            portals: payload
                .portals
                .iter()
                .map(|placement| Portal::new(placement.position, placement.kind, None))
                .collect(),
        }
    }

    /// Adds a portal offering a random spell of its element.
    pub fn add_kind<R>(
        &mut self,
        catalog: &SpellCatalog,
        rng: &mut R,
        kind: ElementKind,
        position: Position,
    ) where
        R: Rng + ?Sized,
    {
        let spell = catalog.get_random(kind, rng).map(|spell| spell.id());
        self.portals.push(Portal::new(position, kind, spell));
    }

    /// Portal occupying the cell, if any.
    #[must_use]
    pub fn get_at(&self, position: Position) -> Option<&Portal> {
        self.portals
            .iter()
            .find(|portal| portal.position == position)
    }

    /// Mutable access to the portal occupying the cell.
    pub fn get_at_mut(&mut self, position: Position) -> Option<&mut Portal> {
        self.portals
            .iter_mut()
            .find(|portal| portal.position == position)
    }

    /// Runs the per-turn activation sweep.
    ///
    /// Portals whose cooldown has elapsed roll a new spell and stop cooling
    /// down. Portals still cooling down never offer a spell.
    pub fn activate<R>(&mut self, turn: u32, catalog: &SpellCatalog, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for portal in &mut self.portals {
            match portal.ready_again {
                Some(ready) if ready <= turn => {
                    portal.spell = catalog
                        .get_random(portal.kind, rng)
                        .map(|spell| spell.id());
                    portal.ready_again = None;
                }
                Some(_) => portal.spell = None,
                None => {}
            }
        }
    }

    /// Applies the portal states reported in a player update.
    ///
    /// Sightings of unknown cells are ignored.
    pub fn apply_sightings(&mut self, sightings: &[PortalSighting]) {
        for sighting in sightings {
            if let Some(portal) = self.get_at_mut(sighting.position) {
                portal.kind = sighting.kind;
                portal.spell = sighting.spell;
            }
        }
    }

    /// Placements of every portal, in creation order.
    #[must_use]
    pub fn placements(&self) -> Vec<PortalPlacement> {
        self.portals.iter().map(Portal::placement).collect()
    }

    /// Sightings of the portals inside `area`.
    #[must_use]
    pub fn sightings_in(&self, area: &PositionSet) -> Vec<PortalSighting> {
        self.portals
            .iter()
            .filter(|portal| area.contains(portal.position))
            .map(Portal::sighting)
            .collect()
    }

    /// Iterates over every portal.
    pub fn iter(&self) -> impl Iterator<Item = &Portal> + '_ {
        self.portals.iter()
    }

    /// Number of portals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.portals.len()
    }

    /// Reports whether no portal exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }
}
