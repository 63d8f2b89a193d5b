//! Incident records describing notable in-turn events.

use serde::{Deserialize, Serialize};

use crate::{ElementKind, PlayerId, Position, SpellId};

/// Category of a notable in-turn event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    /// A player cast a spell.
    Spell,
    /// A player picked up a spell from a portal.
    Portal,
    /// A lingering effect such as poison ticked.
    DelayedEffect,
    /// A player died and was removed from the map.
    PlayerKilled,
    /// A player moved or turned.
    PlayerMove,
}

/// Kind of effect applied to a victim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Direct damage from a spell or a lingering effect.
    Damage,
    /// Area damage around the resolved target cell.
    Splash,
    /// Knock the victim away from the caster.
    Push,
    /// Drag the victim toward the caster.
    Pull,
    /// Displace the victim to a random nearby cell.
    RandomPush,
    /// Damage over time.
    Poison,
    /// Reserved for vision blocking effects.
    Obscure,
    /// Restore health.
    Heal,
    /// Adjusts damage taken by the victim.
    DamageModifier,
    /// Adjusts the victim's chance to hit.
    HitModifier,
    /// Adjusts the chance of the victim being hit.
    BeHitModifier,
}

impl EffectKind {
    /// Reports whether the effect is a summed stat modifier.
    #[must_use]
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            EffectKind::DamageModifier | EffectKind::HitModifier | EffectKind::BeHitModifier
        )
    }
}

/// Value carried by an applied effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectPayload {
    /// No additional data.
    None,
    /// Health removed from the victim.
    Damage(i32),
    /// Health restored to the victim.
    Heal(i32),
    /// Cell the victim was moved to.
    NewPosition(Position),
    /// Number of turns a lingering effect lasts.
    Duration(i32),
}

/// One effect that landed on a victim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppliedEffect {
    /// Effect that was applied.
    pub kind: EffectKind,
    /// Player that received the effect.
    pub victim: PlayerId,
    /// Cell the victim occupied when the effect landed.
    pub at: Position,
    /// Effect specific data.
    pub payload: EffectPayload,
}

/// A cell affected by an incident together with the effects that landed there.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentTarget {
    /// Cell the incident resolved against.
    pub position: Position,
    /// Effects applied at or around the cell.
    pub effects: Vec<AppliedEffect>,
}

impl IncidentTarget {
    /// Creates a target without any effects.
    #[must_use]
    pub fn at(position: Position) -> Self {
        Self {
            position,
            effects: Vec::new(),
        }
    }
}

/// Structured record of one notable event.
///
/// Once redacted for an observer, `origin` and `spell` may be cleared and
/// `targets` may be trimmed; `kind`, `from` and `element` always survive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incident {
    /// Category of the event.
    pub kind: IncidentKind,
    /// Cell the event originated from.
    pub from: Position,
    /// Acting player, if any and if visible.
    pub origin: Option<PlayerId>,
    /// Spell involved, if any and if visible.
    pub spell: Option<SpellId>,
    /// Element of the spell involved.
    pub element: Option<ElementKind>,
    /// Cells affected by the event.
    pub targets: Vec<IncidentTarget>,
}

impl Incident {
    /// Creates an incident with no targets.
    #[must_use]
    pub fn new(kind: IncidentKind, from: Position) -> Self {
        Self {
            kind,
            from,
            origin: None,
            spell: None,
            element: None,
            targets: Vec::new(),
        }
    }

    /// Records the acting player.
    #[must_use]
    pub fn with_origin(mut self, origin: PlayerId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Records the spell involved together with its element.
    #[must_use]
    pub fn with_spell(mut self, spell: SpellId, element: ElementKind) -> Self {
        self.spell = Some(spell);
        self.element = Some(element);
        self
    }

    /// Appends a new target and returns it for effect recording.
    pub fn add_target(&mut self, position: Position) -> &mut IncidentTarget {
        self.targets.push(IncidentTarget::at(position));
        let last = self.targets.len() - 1;
        &mut self.targets[last]
    }
}
