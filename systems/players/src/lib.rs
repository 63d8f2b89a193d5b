#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player model shared by the orchestrator and the client-side mirror.
//!
//! A [`Player`] is the authoritative record of one seat: position, facing,
//! health, counters, held spells, lingering effects and the cells it can see.
//! The orchestrator owns every player exclusively. The [`Roster`] is the
//! reduced view a brain rebuilds from the updates it receives.

use rand::Rng;
use spellgrid_core::{
    Direction, EffectKind, ElementKind, HeldSpellState, PlayerId, PlayerState, Position,
    PositionSet, SpellId, MAX_HEALTH,
};
use spellgrid_system_spells::SpellCatalog;
use spellgrid_world::Grid;

mod effects;
mod roster;

pub use effects::StatusEffect;
pub use roster::Roster;

/// A spell held in one elemental slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HeldSpell {
    spell: SpellId,
    charges: u8,
}

impl HeldSpell {
    /// Creates a slot holding `spell` with `charges` casts left.
    #[must_use]
    pub const fn new(spell: SpellId, charges: u8) -> Self {
        Self { spell, charges }
    }

    /// Spell held.
    #[must_use]
    pub const fn spell(&self) -> SpellId {
        self.spell
    }

    /// Casts left.
    #[must_use]
    pub const fn charges(&self) -> u8 {
        self.charges
    }
}

/// Authoritative state of one seat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    position: Position,
    facing: Direction,
    health: i32,
    kills: i32,
    deaths: u32,
    spells: [Option<HeldSpell>; ElementKind::COUNT],
    tagged: u32,
    injured_by: u32,
    effects: Vec<StatusEffect>,
    line_of_sight: PositionSet,
}

impl Player {
    /// Creates a player that has not spawned yet.
    #[must_use]
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            position: Position::UNKNOWN,
            facing: Direction::Any,
            health: 0,
            kills: 0,
            deaths: 0,
            spells: [None; ElementKind::COUNT],
            tagged: 0,
            injured_by: 0,
            effects: Vec::new(),
            line_of_sight: PositionSet::new(),
        }
    }

    /// Seat of the player.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Current cell, [`Position::UNKNOWN`] while dead.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Kill counter.
    #[must_use]
    pub const fn kills(&self) -> i32 {
        self.kills
    }

    /// Death counter.
    #[must_use]
    pub const fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Reports whether the player has health left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Cells the player can currently see.
    #[must_use]
    pub fn line_of_sight(&self) -> &PositionSet {
        &self.line_of_sight
    }

    /// Brings the player back with full health and one random spell.
    ///
    /// Returns the spell granted, if the catalog had one for the rolled
    /// element.
    pub fn spawn<R>(
        &mut self,
        grid: &Grid,
        catalog: &SpellCatalog,
        rng: &mut R,
        position: Position,
        facing: Direction,
    ) -> Option<SpellId>
    where
        R: Rng + ?Sized,
    {
        self.health = MAX_HEALTH;
        let kind = ElementKind::ALL[rng.gen_range(0..ElementKind::COUNT)];
        let granted = catalog.get_random(kind, rng).map(|spell| {
            self.spells[kind.index()] = Some(HeldSpell::new(spell.id(), spell.charges()));
            spell.id()
        });
        self.position = position;
        self.facing = facing;
        self.line_of_sight = grid.line_of_sight(position, facing);
        granted
    }

    /// Resets the player to the dead baseline and counts the death.
    pub fn kill(&mut self) {
        self.health = 0;
        self.injured_by = 0;
        self.tagged = 0;
        self.effects.clear();
        self.spells = [None; ElementKind::COUNT];
        self.position = Position::UNKNOWN;
        self.line_of_sight.clear();
        self.deaths += 1;
    }

    /// Moves or turns the player.
    ///
    /// Line of sight is recomputed only when the position or the facing
    /// actually changed. Returns whether anything changed.
    pub fn place(&mut self, grid: &Grid, position: Position, facing: Direction) -> bool {
        if position == self.position && facing == self.facing {
            return false;
        }
        self.position = position;
        self.facing = facing;
        self.line_of_sight = grid.line_of_sight(position, facing);
        true
    }

    /// Marks `other` as recently seen.
    pub fn tag(&mut self, other: PlayerId) {
        self.tagged |= other.mask();
    }

    /// Reports whether `other` was recently seen.
    #[must_use]
    pub const fn is_tagged(&self, other: PlayerId) -> bool {
        self.tagged & other.mask() != 0
    }

    /// Forgets every recently seen player.
    pub fn clear_tags(&mut self) {
        self.tagged = 0;
    }

    /// Spell slot for an element.
    #[must_use]
    pub fn spell(&self, kind: ElementKind) -> Option<HeldSpell> {
        self.spells[kind.index()]
    }

    /// Slots holding at least one charge, with their element.
    pub fn charged_spells(&self) -> impl Iterator<Item = (ElementKind, HeldSpell)> + '_ {
        ElementKind::ALL.into_iter().filter_map(move |kind| {
            self.spell(kind)
                .filter(|held| held.charges > 0)
                .map(|held| (kind, held))
        })
    }

    /// Element slot holding `spell` with at least one charge.
    #[must_use]
    pub fn charged_slot(&self, spell: SpellId) -> Option<ElementKind> {
        self.charged_spells()
            .find(|(_, held)| held.spell == spell)
            .map(|(kind, _)| kind)
    }

    /// Fills a slot, replacing whatever it held.
    pub fn grant_spell(&mut self, kind: ElementKind, spell: SpellId, charges: u8) {
        self.spells[kind.index()] = Some(HeldSpell::new(spell, charges));
    }

    /// Uses one charge of the slot, reporting whether a charge was available.
    pub fn spend_charge(&mut self, kind: ElementKind) -> bool {
        match &mut self.spells[kind.index()] {
            Some(held) if held.charges > 0 => {
                held.charges -= 1;
                true
            }
            _ => false,
        }
    }

    /// Attaches a lingering effect.
    pub fn add_effect(&mut self, effect: StatusEffect) {
        self.effects.push(effect);
    }

    /// Active lingering effects in the order they were applied.
    #[must_use]
    pub fn effects(&self) -> &[StatusEffect] {
        &self.effects
    }

    /// Counts every effect down by one turn and drops the expired ones.
    pub fn time_effects(&mut self) {
        self.effects.retain_mut(StatusEffect::tick);
    }

    /// Sum of the active modifiers of one kind.
    #[must_use]
    pub fn modifier(&self, kind: EffectKind) -> i32 {
        self.effects
            .iter()
            .filter(|effect| effect.kind() == kind)
            .map(|effect| effect.effect().modifier())
            .sum()
    }

    /// Removes health, never below zero, and remembers the attacker of any
    /// positive amount.
    ///
    /// Returns the health actually removed.
    pub fn take_damage(&mut self, amount: i32, attacker: PlayerId) -> i32 {
        let removed = amount.clamp(0, self.health);
        self.health -= removed;
        if amount > 0 {
            self.injured_by |= attacker.mask();
        }
        removed
    }

    /// Restores health up to the maximum and returns the amount restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let restored = amount.clamp(0, MAX_HEALTH - self.health);
        self.health += restored;
        restored
    }

    /// Seats that hurt the player since it was last healthy.
    #[must_use]
    pub const fn injured_by(&self) -> u32 {
        self.injured_by
    }

    /// Forgets the attackers of a player that survived the phase.
    pub fn clear_injuries(&mut self) {
        self.injured_by = 0;
    }

    /// Adds one kill.
    pub fn credit_kill(&mut self) {
        self.kills += 1;
    }

    /// Removes one kill, used for self-inflicted deaths.
    pub fn forfeit_kill(&mut self) {
        self.kills -= 1;
    }

    /// Wire form of the player.
    #[must_use]
    pub fn snapshot(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            position: self.position,
            facing: self.facing,
            health: self.health,
            kills: self.kills,
            deaths: self.deaths,
            spells: self.spells.map(|slot| {
                slot.map(|held| HeldSpellState {
                    spell: held.spell,
                    charges: held.charges,
                })
            }),
            effects: self.effects.iter().map(StatusEffect::snapshot).collect(),
        }
    }
}
