#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable spell catalog shared by the orchestrator and the brains.
//!
//! Spells are described by static [`SpellTemplate`] tables. Building a
//! [`SpellCatalog`] assigns every template a [`SpellId`] in table order,
//! starting at one, so every process that builds the same tables agrees on
//! the ids that cross the message boundary.

use rand::Rng;
use spellgrid_core::{EffectKind, ElementKind, SpellId};

mod tables;

/// What happens to a burst that misses its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MissPolicy {
    /// Lands somewhere along the line toward the target and still hurts
    /// whoever stands there, the caster included.
    #[default]
    Scatter,
    /// Lands on a random cell reachable from the target.
    Bounce,
    /// Cancels the remaining bursts of the cast.
    Interrupt,
    /// The burst is lost without effect.
    None,
}

/// Hit chance and damage for targets up to a given range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RangeBand {
    range: i32,
    hit: i32,
    min: i32,
    max: i32,
}

impl RangeBand {
    /// Creates a band covering targets up to `range` cells away.
    #[must_use]
    pub const fn new(range: i32, hit: i32, min: i32, max: i32) -> Self {
        Self {
            range,
            hit,
            min,
            max,
        }
    }

    /// Furthest distance covered by the band.
    #[must_use]
    pub const fn range(&self) -> i32 {
        self.range
    }

    /// Resolved hit chance and damage range of the band.
    #[must_use]
    pub const fn stats(&self) -> BandStats {
        BandStats {
            hit: self.hit,
            min: self.min,
            max: self.max,
        }
    }
}

/// Hit chance in percent and inclusive damage range at some distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BandStats {
    /// Chance to hit, in percent.
    pub hit: i32,
    /// Lowest damage roll.
    pub min: i32,
    /// Highest damage roll.
    pub max: i32,
}

/// Secondary effect applied around the resolved target of a cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpellEffect {
    /// Damage to every visible player around the target, reduced by `drop`
    /// for every `step` cells of distance.
    Splash {
        /// Distance covered by one falloff step.
        step: i32,
        /// Damage lost per step.
        drop: i32,
        /// Lowest damage roll.
        min: i32,
        /// Highest damage roll.
        max: i32,
    },
    /// Knocks the victim away from the caster.
    Push {
        /// Fewest cells moved.
        min: i32,
        /// Most cells moved.
        max: i32,
    },
    /// Drags the victim toward the caster.
    Pull {
        /// Fewest cells moved.
        min: i32,
        /// Most cells moved.
        max: i32,
    },
    /// Moves the victim to a random cell between `min` and `max` steps away.
    RandomPush {
        /// Fewest movement steps away from the target.
        min: i32,
        /// Most movement steps away from the target.
        max: i32,
    },
    /// Restores health.
    Heal {
        /// Smallest amount restored.
        min: i32,
        /// Largest amount restored.
        max: i32,
    },
    /// Damage dealt at the end of each turn while the effect lasts.
    Poison {
        /// Lowest damage per turn.
        min: i32,
        /// Highest damage per turn.
        max: i32,
        /// Turns the poison lasts.
        duration: i32,
    },
    /// Reserved for vision blocking.
    Obscure {
        /// Turns the effect lasts.
        duration: i32,
    },
    /// Adds `amount` to damage taken.
    DamageModifier {
        /// Added to every damage roll against the victim.
        amount: i32,
        /// Turns the modifier lasts.
        duration: i32,
    },
    /// Adds `amount` to the victim's own hit chance.
    HitModifier {
        /// Added to the victim's hit chance.
        amount: i32,
        /// Turns the modifier lasts.
        duration: i32,
    },
    /// Adds `amount` to the chance of the victim being hit.
    BeHitModifier {
        /// Added to the attacker's hit chance against the victim.
        amount: i32,
        /// Turns the modifier lasts.
        duration: i32,
    },
}

impl SpellEffect {
    /// Incident category reported for the effect.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            SpellEffect::Splash { .. } => EffectKind::Splash,
            SpellEffect::Push { .. } => EffectKind::Push,
            SpellEffect::Pull { .. } => EffectKind::Pull,
            SpellEffect::RandomPush { .. } => EffectKind::RandomPush,
            SpellEffect::Heal { .. } => EffectKind::Heal,
            SpellEffect::Poison { .. } => EffectKind::Poison,
            SpellEffect::Obscure { .. } => EffectKind::Obscure,
            SpellEffect::DamageModifier { .. } => EffectKind::DamageModifier,
            SpellEffect::HitModifier { .. } => EffectKind::HitModifier,
            SpellEffect::BeHitModifier { .. } => EffectKind::BeHitModifier,
        }
    }

    /// Magnitude contributed to modifier sums, zero for other effects.
    #[must_use]
    pub const fn modifier(&self) -> i32 {
        match self {
            SpellEffect::DamageModifier { amount, .. }
            | SpellEffect::HitModifier { amount, .. }
            | SpellEffect::BeHitModifier { amount, .. } => *amount,
            _ => 0,
        }
    }

    /// Turns a lingering effect lasts, `None` for instant effects.
    #[must_use]
    pub const fn duration(&self) -> Option<i32> {
        match self {
            SpellEffect::Poison { duration, .. }
            | SpellEffect::Obscure { duration }
            | SpellEffect::DamageModifier { duration, .. }
            | SpellEffect::HitModifier { duration, .. }
            | SpellEffect::BeHitModifier { duration, .. } => Some(*duration),
            _ => None,
        }
    }
}

/// Static description of a spell before it receives an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpellTemplate {
    name: &'static str,
    speed: i32,
    charges: u8,
    burst: u8,
    defensive: bool,
    bands: &'static [RangeBand],
    miss: MissPolicy,
    bounce_max: u8,
    effects: &'static [SpellEffect],
}

impl SpellTemplate {
    /// Creates an offensive template without secondary effects.
    ///
    /// Bands must be listed by increasing range.
    #[must_use]
    pub const fn new(
        name: &'static str,
        speed: i32,
        charges: u8,
        burst: u8,
        bands: &'static [RangeBand],
    ) -> Self {
        Self {
            name,
            speed,
            charges,
            burst,
            defensive: false,
            bands,
            miss: MissPolicy::Scatter,
            bounce_max: 0,
            effects: &[],
        }
    }

    /// Marks the spell as worth casting without an opponent in sight.
    #[must_use]
    pub const fn defensive(mut self) -> Self {
        self.defensive = true;
        self
    }

    /// Replaces the miss policy and the bounce radius.
    #[must_use]
    pub const fn with_miss(mut self, miss: MissPolicy, bounce_max: u8) -> Self {
        self.miss = miss;
        self.bounce_max = bounce_max;
        self
    }

    /// Replaces the secondary effects.
    #[must_use]
    pub const fn with_effects(mut self, effects: &'static [SpellEffect]) -> Self {
        self.effects = effects;
        self
    }
}

/// A catalogued spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Spell {
    id: SpellId,
    kind: ElementKind,
    template: SpellTemplate,
}

impl Spell {
    /// Identifier assigned when the catalog was built.
    #[must_use]
    pub const fn id(&self) -> SpellId {
        self.id
    }

    /// Element the spell belongs to.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.template.name
    }

    /// Resolution priority; faster spells resolve first.
    #[must_use]
    pub const fn speed(&self) -> i32 {
        self.template.speed
    }

    /// Charges granted when the spell is picked up.
    #[must_use]
    pub const fn charges(&self) -> u8 {
        self.template.charges
    }

    /// Shots rolled per cast.
    #[must_use]
    pub const fn burst(&self) -> u8 {
        self.template.burst
    }

    /// Reports whether the spell is offered even without an opponent in sight.
    #[must_use]
    pub const fn is_defensive(&self) -> bool {
        self.template.defensive
    }

    /// Range bands by increasing range.
    #[must_use]
    pub const fn bands(&self) -> &'static [RangeBand] {
        self.template.bands
    }

    /// Behaviour of a missed burst.
    #[must_use]
    pub const fn miss_policy(&self) -> MissPolicy {
        self.template.miss
    }

    /// Movement radius searched when a missed burst bounces.
    #[must_use]
    pub const fn bounce_max(&self) -> u8 {
        self.template.bounce_max
    }

    /// Secondary effects in application order.
    #[must_use]
    pub const fn effects(&self) -> &'static [SpellEffect] {
        self.template.effects
    }

    /// Range of the last band, zero for spells without bands.
    #[must_use]
    pub fn max_range(&self) -> i32 {
        self.template.bands.last().map_or(0, RangeBand::range)
    }

    /// Stats of the first band reaching `distance_squared`, all zero when the
    /// target lies outside every band.
    #[must_use]
    pub fn stats(&self, distance_squared: u32) -> BandStats {
        let distance = i64::from(distance_squared);
        self.template
            .bands
            .iter()
            .find(|band| {
                let range = i64::from(band.range);
                distance <= range * range
            })
            .map(RangeBand::stats)
            .unwrap_or_default()
    }
}

/// Lookup table of every spell in a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpellCatalog {
    spells: Vec<Spell>,
    by_kind: [Vec<SpellId>; ElementKind::COUNT],
}

impl SpellCatalog {
    /// Builds the catalog from the shipped tables.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_lists(&tables::STANDARD)
    }

    /// Builds a catalog from custom element lists.
    ///
    /// Ids are assigned sequentially from one in the order the lists and
    /// their templates are given. Id zero never names a spell.
    #[must_use]
    pub fn from_lists(lists: &[(ElementKind, &[SpellTemplate])]) -> Self {
        let mut spells = Vec::new();
        let mut by_kind: [Vec<SpellId>; ElementKind::COUNT] = Default::default();

        for (kind, templates) in lists {
            for template in *templates {
                let id = u8::try_from(spells.len() + 1)
                    .map_or(SpellId::new(u8::MAX), SpellId::new);
                by_kind[kind.index()].push(id);
                spells.push(Spell {
                    id,
                    kind: *kind,
                    template: *template,
                });
            }
        }

        Self { spells, by_kind }
    }

    /// Looks up a spell by id.
    #[must_use]
    pub fn get_by_id(&self, id: SpellId) -> Option<&Spell> {
        let index = usize::from(id.get()).checked_sub(1)?;
        self.spells.get(index)
    }

    /// Picks a uniformly random spell of the given element.
    pub fn get_random<R>(&self, kind: ElementKind, rng: &mut R) -> Option<&Spell>
    where
        R: Rng + ?Sized,
    {
        let ids = &self.by_kind[kind.index()];
        if ids.is_empty() {
            return None;
        }
        let id = ids[rng.gen_range(0..ids.len())];
        self.get_by_id(id)
    }

    /// Band stats of a spell at `distance_squared`, all zero for unknown ids.
    #[must_use]
    pub fn get_stats(&self, id: SpellId, distance_squared: u32) -> BandStats {
        self.get_by_id(id)
            .map(|spell| spell.stats(distance_squared))
            .unwrap_or_default()
    }

    /// Maximum range of a spell, zero for unknown ids.
    #[must_use]
    pub fn max_range(&self, id: SpellId) -> i32 {
        self.get_by_id(id).map_or(0, Spell::max_range)
    }

    /// Name of a spell, or `"none"` for unknown ids.
    #[must_use]
    pub fn name(&self, id: SpellId) -> &'static str {
        self.get_by_id(id).map_or("none", Spell::name)
    }

    /// Spells of one element in id order.
    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Spell> + '_ {
        self.by_kind[kind.index()]
            .iter()
            .filter_map(move |id| self.get_by_id(*id))
    }

    /// Every spell in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Spell> + '_ {
        self.spells.iter()
    }

    /// Number of catalogued spells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spells.len()
    }

    /// Reports whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use spellgrid_core::{EffectKind, ElementKind, SpellId};

    use super::{BandStats, MissPolicy, RangeBand, SpellCatalog, SpellEffect, SpellTemplate};

    #[test]
    fn ids_follow_table_order() {
        let catalog = SpellCatalog::standard();
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.name(SpellId::new(1)), "Whip");
        assert_eq!(catalog.name(SpellId::new(5)), "Boulder");
        assert_eq!(catalog.name(SpellId::new(9)), "Swipe");
        assert_eq!(catalog.name(SpellId::new(16)), "Torch");
        assert!(catalog.get_by_id(SpellId::new(0)).is_none());
        assert!(catalog.get_by_id(SpellId::new(17)).is_none());

        for spell in catalog.of_kind(ElementKind::Air) {
            assert_eq!(spell.kind(), ElementKind::Air);
        }
        assert_eq!(catalog, SpellCatalog::standard());
    }

    #[test]
    fn stats_pick_first_band_in_reach() {
        let catalog = SpellCatalog::standard();
        let cannon = SpellId::new(10);
        assert_eq!(catalog.name(cannon), "Cannon");
        assert_eq!(catalog.max_range(cannon), 50);

        assert_eq!(
            catalog.get_stats(cannon, 100),
            BandStats {
                hit: 80,
                min: 20,
                max: 50
            }
        );
        assert_eq!(catalog.get_stats(cannon, 101).hit, 70);
        assert_eq!(catalog.get_stats(cannon, 2500).hit, 50);
        assert_eq!(catalog.get_stats(cannon, 2501), BandStats::default());
        assert_eq!(catalog.get_stats(SpellId::new(0), 1), BandStats::default());
    }

    #[test]
    fn shipped_templates_keep_their_traits() {
        let catalog = SpellCatalog::standard();
        let grenade = catalog.get_by_id(SpellId::new(8)).expect("grenade");
        assert_eq!(grenade.name(), "Grenade");
        assert_eq!(grenade.miss_policy(), MissPolicy::Bounce);
        assert_eq!(grenade.bounce_max(), 15);
        assert_eq!(grenade.effects().len(), 4);

        let defensive: Vec<_> = catalog
            .iter()
            .filter(|spell| spell.is_defensive())
            .map(|spell| spell.name())
            .collect();
        assert_eq!(defensive, vec!["Baptize", "Iron suit", "On Fire"]);

        for spell in catalog.iter() {
            let ranges: Vec<_> = spell.bands().iter().map(RangeBand::range).collect();
            assert!(
                ranges.windows(2).all(|pair| pair[0] <= pair[1]),
                "{}",
                spell.name()
            );
        }
    }

    #[test]
    fn random_spell_matches_requested_element() {
        let catalog = SpellCatalog::standard();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for kind in ElementKind::ALL {
            for _ in 0..8 {
                let spell = catalog.get_random(kind, &mut rng).expect("spell");
                assert_eq!(spell.kind(), kind);
            }
        }
    }

    #[test]
    fn custom_lists_number_from_one() {
        const FIRE: &[SpellTemplate] = &[SpellTemplate::new(
            "Strike",
            90,
            1,
            1,
            &[RangeBand::new(5, 100, 1, 1)],
        )];
        const WATER: &[SpellTemplate] =
            &[SpellTemplate::new("Ward", 10, 2, 1, &[RangeBand::new(3, 100, 0, 0)])
                .defensive()
                .with_effects(&[SpellEffect::HitModifier {
                    amount: 5,
                    duration: 2,
                }])];

        let catalog =
            SpellCatalog::from_lists(&[(ElementKind::Fire, FIRE), (ElementKind::Water, WATER)]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog
                .get_random(ElementKind::Water, &mut rng)
                .map(|spell| spell.id()),
            Some(SpellId::new(2))
        );
        assert!(catalog.get_random(ElementKind::Air, &mut rng).is_none());

        let ward = catalog.get_by_id(SpellId::new(2)).expect("ward");
        assert!(ward.is_defensive());
        assert_eq!(ward.effects()[0].kind(), EffectKind::HitModifier);
        assert_eq!(ward.effects()[0].modifier(), 5);
        assert_eq!(ward.effects()[0].duration(), Some(2));
    }
}
