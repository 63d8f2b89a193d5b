use spellgrid_core::{EffectKind, PlayerId, SpellId, StatusEffectState};
use spellgrid_system_spells::SpellEffect;

/// A lingering effect attached to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StatusEffect {
    effect: SpellEffect,
    spell: SpellId,
    remaining: i32,
    caster: PlayerId,
}

impl StatusEffect {
    /// Creates an effect lasting `remaining` turns.
    #[must_use]
    pub const fn new(
        effect: SpellEffect,
        spell: SpellId,
        remaining: i32,
        caster: PlayerId,
    ) -> Self {
        Self {
            effect,
            spell,
            remaining,
            caster,
        }
    }

    /// Effect descriptor taken from the spell.
    #[must_use]
    pub const fn effect(&self) -> SpellEffect {
        self.effect
    }

    /// Incident category of the effect.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        self.effect.kind()
    }

    /// Spell the effect came from.
    #[must_use]
    pub const fn spell(&self) -> SpellId {
        self.spell
    }

    /// Turns left before the effect expires.
    #[must_use]
    pub const fn remaining(&self) -> i32 {
        self.remaining
    }

    /// Player that cast the originating spell.
    #[must_use]
    pub const fn caster(&self) -> PlayerId {
        self.caster
    }

    /// Wire form of the effect.
    #[must_use]
    pub const fn snapshot(&self) -> StatusEffectState {
        StatusEffectState {
            spell: self.spell,
            remaining: self.remaining,
        }
    }

    /// Counts down one turn and reports whether the effect is still active.
    pub(crate) fn tick(&mut self) -> bool {
        self.remaining -= 1;
        self.remaining > 0
    }
}
