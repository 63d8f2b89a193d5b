//! Fight phase: offers, speed tiers, spell application and deaths.

use rand::Rng;
use spellgrid_core::{
    AppliedEffect, Direction, EffectKind, EffectPayload, FightOffer, Incident, IncidentKind,
    IncidentTarget, MessageBody, PlayerId, Position, SpellId,
};
use spellgrid_system_players::StatusEffect;
use spellgrid_system_spells::{MissPolicy, Spell, SpellEffect};
use tracing::{info, trace};

use crate::Orchestrator;

const SCATTER_MIN_STEPS: u64 = 3;
const SCATTER_MAX_STEPS: u64 = 30;

/// A cast submitted during the fight phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cast {
    pub(crate) caster: PlayerId,
    pub(crate) spell: SpellId,
    pub(crate) target: Position,
}

impl Orchestrator<'_> {
    /// Offers every charged spell with the visible cells it can reach.
    ///
    /// Dead seats are asked too, with nothing on offer, so the barrier still
    /// hears from everyone.
    pub(crate) fn ask_fight(&mut self) {
        for index in 0..self.players.len() {
            let player = &self.players[index];
            let seat = player.id();
            let offers: Vec<FightOffer> = if player.is_alive() {
                player
                    .charged_spells()
                    .map(|(kind, held)| FightOffer {
                        kind,
                        spell: held.spell(),
                        charges: held.charges(),
                        targets: self
                            .grid
                            .reduce_to_distance(
                                player.position(),
                                player.line_of_sight(),
                                self.catalog.max_range(held.spell()),
                            )
                            .into(),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            self.send(seat, MessageBody::AskFight { offers });
        }
    }

    /// Drains the fight replies that name a spell.
    ///
    /// A reply only counts when it picks a target offered for that spell.
    pub(crate) fn collect_casts(&mut self) -> Vec<Cast> {
        let mut casts = Vec::new();
        for index in 0..self.seats.len() {
            let Some((request, reply)) = self.seats[index].take_exchange() else {
                continue;
            };
            let MessageBody::ReplyFight {
                spell: Some(spell),
                target,
            } = reply.into_body()
            else {
                continue;
            };
            let caster = self.players[index].id();
            if !was_offered(request.body(), spell, target) {
                trace!(seat = %caster, spell = spell.get(), %target, "cast not offered");
                continue;
            }
            casts.push(Cast {
                caster,
                spell,
                target,
            });
        }
        casts
    }

    /// Resolves casts from the fastest speed tier down.
    ///
    /// Every cast of a tier is validated before any of them is applied, and
    /// deaths are settled before the next tier, so a fast lethal spell voids
    /// the slower casts of its victim.
    pub(crate) fn resolve_fight(&mut self, mut pending: Vec<Cast>) {
        let catalog = self.catalog;
        let speed = |cast: &Cast| catalog.get_by_id(cast.spell).map_or(i32::MIN, Spell::speed);

        while let Some(fastest) = pending.iter().map(speed).max() {
            let (tier, slower): (Vec<Cast>, Vec<Cast>) =
                pending.into_iter().partition(|cast| speed(cast) == fastest);
            pending = slower;

            let valid: Vec<Cast> = tier
                .into_iter()
                .filter(|cast| self.can_cast(cast))
                .collect();
            for cast in valid {
                self.apply_spell(cast);
            }
            self.resolve_deaths();
        }
    }

    fn can_cast(&self, cast: &Cast) -> bool {
        let Some(caster) = self.players.get(cast.caster.index()) else {
            return false;
        };
        let origin = caster.position();
        let valid = caster.is_alive()
            && caster.charged_slot(cast.spell).is_some()
            && origin.within_distance(cast.target, self.catalog.max_range(cast.spell))
            && self.grid.has_los(origin, cast.target);
        if !valid {
            trace!(
                seat = %cast.caster,
                spell = cast.spell.get(),
                target = %cast.target,
                "cast dropped"
            );
        }
        valid
    }

    fn apply_spell(&mut self, cast: Cast) {
        let catalog = self.catalog;
        let Some(spell) = catalog.get_by_id(cast.spell) else {
            return;
        };
        let caster = &mut self.players[cast.caster.index()];
        let Some(slot) = caster.charged_slot(cast.spell) else {
            return;
        };
        let _ = caster.spend_charge(slot);
        let origin = caster.position();
        let stats = spell.stats(origin.distance_squared(cast.target));
        let hit_chance = stats.hit
            + self.be_hit_bonus(cast.caster, cast.target)
            + self.players[cast.caster.index()].modifier(EffectKind::HitModifier);

        trace!(
            seat = %cast.caster,
            spell = spell.name(),
            target = %cast.target,
            hit_chance,
            "casting"
        );

        let mut incident = Incident::new(IncidentKind::Spell, origin)
            .with_origin(cast.caster)
            .with_spell(spell.id(), spell.kind());

        for _ in 0..spell.burst() {
            let hit = hit_chance > 0 && self.rng.gen_range(0..100) < hit_chance;
            let mut landed = if hit {
                let mut landed = IncidentTarget::at(cast.target);
                self.damage_at(cast.caster, cast.target, stats.min, stats.max, false, &mut landed);
                landed
            } else {
                match spell.miss_policy() {
                    MissPolicy::Scatter => {
                        let at = self.scatter(origin, cast.target);
                        let miss = spell.stats(origin.distance_squared(at));
                        let mut landed = IncidentTarget::at(at);
                        self.damage_at(cast.caster, at, miss.min, miss.max, true, &mut landed);
                        landed
                    }
                    MissPolicy::Bounce => {
                        let mut around = self.grid.valid_moves(cast.target, spell.bounce_max());
                        let _ = around.remove(cast.target);
                        let Some(at) = around.choose(&mut self.rng) else {
                            continue;
                        };
                        let mut landed = IncidentTarget::at(at);
                        self.damage_at(cast.caster, at, stats.min, stats.max, true, &mut landed);
                        landed
                    }
                    MissPolicy::Interrupt => break,
                    MissPolicy::None => continue,
                }
            };

            let at = landed.position;
            self.apply_effects(cast.caster, spell, at, &mut landed);
            incident.targets.push(landed);
        }

        self.incidents.record(incident);
    }

    /// Sum of the be-hit modifiers of the opponents standing on `target`.
    fn be_hit_bonus(&self, caster: PlayerId, target: Position) -> i32 {
        self.players
            .iter()
            .filter(|player| player.id() != caster && player.position() == target)
            .map(|player| player.modifier(EffectKind::BeHitModifier))
            .sum()
    }

    /// Where a scattered burst lands.
    ///
    /// The aim drifts sideways from `to` by a random share of the squared
    /// distance, between three and thirty cells, and the flight stops in
    /// front of the first wall.
    fn scatter(&mut self, from: Position, to: Position) -> Position {
        let spread = u64::from(from.distance_squared(to));
        let steps = (spread * self.rng.gen_range(0..100u64) / 100)
            .clamp(SCATTER_MIN_STEPS, SCATTER_MAX_STEPS);

        let mut x = to.x();
        let mut y = to.y();
        for _ in 0..steps {
            if (x - from.x()).abs() > (y - from.y()).abs() {
                y += if y > from.y() { 1 } else { -1 };
            } else {
                x += if x > from.x() { 1 } else { -1 };
            }
        }
        self.grid.ends_up_at(from, Position::new(x, y))
    }

    /// Rolls damage against every player standing on `at`.
    ///
    /// The caster is spared unless `hurts_caster` is set. Players already
    /// dead before this round of damage are skipped.
    fn damage_at(
        &mut self,
        caster: PlayerId,
        at: Position,
        min: i32,
        max: i32,
        hurts_caster: bool,
        landed: &mut IncidentTarget,
    ) {
        if max <= 0 {
            return;
        }

        for index in 0..self.players.len() {
            let victim = &self.players[index];
            if victim.position() != at || (!hurts_caster && victim.id() == caster) {
                continue;
            }
            if victim.health() == 0 && victim.injured_by() == 0 {
                continue;
            }

            let roll = self.rng.gen_range(min.min(max)..=max);
            let damage = (roll + victim.modifier(EffectKind::DamageModifier)).max(0);
            landed.effects.push(AppliedEffect {
                kind: EffectKind::Damage,
                victim: victim.id(),
                at,
                payload: EffectPayload::Damage(damage),
            });
            if damage > 0 {
                let _ = self.players[index].take_damage(damage, caster);
            }
        }
    }

    fn apply_effects(
        &mut self,
        caster: PlayerId,
        spell: &Spell,
        at: Position,
        landed: &mut IncidentTarget,
    ) {
        for effect in spell.effects() {
            match *effect {
                SpellEffect::Splash { .. } => self.splash(caster, *effect, at, landed),
                SpellEffect::Push { min, max } | SpellEffect::Pull { min, max } => {
                    self.shove(caster, *effect, at, min, max, landed);
                }
                SpellEffect::RandomPush { min, max } => {
                    self.random_push(at, min, max, landed);
                }
                SpellEffect::Heal { min, max } => self.heal_at(at, min, max, landed),
                SpellEffect::Poison { duration, .. }
                | SpellEffect::DamageModifier { duration, .. }
                | SpellEffect::HitModifier { duration, .. }
                | SpellEffect::BeHitModifier { duration, .. } => {
                    self.linger(caster, spell.id(), *effect, duration, at, landed);
                }
                SpellEffect::Obscure { .. } => {}
            }
        }
    }

    /// Damages every player visible from `at`, weaker with distance.
    fn splash(
        &mut self,
        caster: PlayerId,
        effect: SpellEffect,
        at: Position,
        landed: &mut IncidentTarget,
    ) {
        let SpellEffect::Splash {
            step,
            drop,
            min,
            max,
        } = effect
        else {
            return;
        };
        let mut area = self.grid.line_of_sight(at, Direction::Any);
        let _ = area.remove(at);
        let splashed = self.grid.players_in(&area);

        for victim in splashed.iter() {
            let distance = isqrt(at.distance_squared(victim));
            let reduction = if step > 0 { distance / step * drop } else { 0 };
            self.damage_at(caster, victim, min - reduction, max - reduction, true, landed);
        }
    }

    /// Push or pull every player on `at` relative to the caster.
    fn shove(
        &mut self,
        caster: PlayerId,
        effect: SpellEffect,
        at: Position,
        min: i32,
        max: i32,
        landed: &mut IncidentTarget,
    ) {
        let origin = self.players[caster.index()].position();
        if origin == at {
            return;
        }

        for index in self.players_on(at) {
            let steps = self.rng.gen_range(min.min(max)..=max);
            let destination = match effect {
                SpellEffect::Pull { .. } => self.grid.pull(origin, at, steps),
                _ => self.grid.push(origin, at, steps),
            };
            self.displace(index, effect.kind(), at, destination, landed);
        }
    }

    /// Moves every player on `at` to a random cell between `min` and `max`
    /// movement steps away.
    fn random_push(&mut self, at: Position, min: i32, max: i32, landed: &mut IncidentTarget) {
        let mut ring = self.grid.valid_moves(at, step_budget(max + 1));
        ring.remove_all(&self.grid.valid_moves(at, step_budget(min)));
        if ring.is_empty() {
            return;
        }

        for index in self.players_on(at) {
            let Some(destination) = ring.choose(&mut self.rng) else {
                return;
            };
            self.displace(index, EffectKind::RandomPush, at, destination, landed);
        }
    }

    fn displace(
        &mut self,
        index: usize,
        kind: EffectKind,
        at: Position,
        destination: Position,
        landed: &mut IncidentTarget,
    ) {
        let victim = &mut self.players[index];
        landed.effects.push(AppliedEffect {
            kind,
            victim: victim.id(),
            at,
            payload: EffectPayload::NewPosition(destination),
        });
        let facing = victim.facing();
        let _ = victim.place(&self.grid, destination, facing);
        self.sync_player_flags();
    }

    fn heal_at(&mut self, at: Position, min: i32, max: i32, landed: &mut IncidentTarget) {
        for index in self.players_on(at) {
            let amount = self.rng.gen_range(min.min(max)..=max);
            let victim = &mut self.players[index];
            let _ = victim.heal(amount);
            landed.effects.push(AppliedEffect {
                kind: EffectKind::Heal,
                victim: victim.id(),
                at,
                payload: EffectPayload::Heal(amount),
            });
        }
    }

    /// Attaches a lingering effect to every player on `at`.
    fn linger(
        &mut self,
        caster: PlayerId,
        spell: SpellId,
        effect: SpellEffect,
        duration: i32,
        at: Position,
        landed: &mut IncidentTarget,
    ) {
        for index in self.players_on(at) {
            let victim = &mut self.players[index];
            victim.add_effect(StatusEffect::new(effect, spell, duration, caster));
            landed.effects.push(AppliedEffect {
                kind: effect.kind(),
                victim: victim.id(),
                at,
                payload: EffectPayload::Duration(duration),
            });
        }
    }

    fn players_on(&self, at: Position) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, player)| player.is_alive() && player.position() == at)
            .map(|(index, _)| index)
            .collect()
    }

    /// Deals one round of poison damage, one incident per active poison.
    pub(crate) fn apply_poison(&mut self) {
        for index in 0..self.players.len() {
            let doses: Vec<(i32, i32, PlayerId)> = self.players[index]
                .effects()
                .iter()
                .filter_map(|status| match status.effect() {
                    SpellEffect::Poison { min, max, .. } => Some((min, max, status.caster())),
                    _ => None,
                })
                .collect();

            for (min, max, caster) in doses {
                let victim = &self.players[index];
                if victim.health() <= 0 && victim.injured_by() == 0 {
                    continue;
                }
                let at = victim.position();
                let damage = self.rng.gen_range(min.min(max)..=max).max(0);

                let mut incident = Incident::new(IncidentKind::DelayedEffect, at);
                incident.add_target(at).effects.push(AppliedEffect {
                    kind: EffectKind::Damage,
                    victim: victim.id(),
                    at,
                    payload: EffectPayload::Damage(damage),
                });
                self.incidents.record(incident);

                if damage > 0 {
                    let _ = self.players[index].take_damage(damage, caster);
                }
            }
        }
    }

    /// Settles every player left without health.
    ///
    /// Each attacker recorded since the victim was last healthy is credited
    /// with a kill; a self-inflicted death costs the victim a kill instead.
    /// Survivors forget their attackers.
    pub(crate) fn resolve_deaths(&mut self) {
        let mut died = false;
        for index in 0..self.players.len() {
            let victim = &self.players[index];
            if victim.health() > 0 {
                self.players[index].clear_injuries();
                continue;
            }
            let attackers = victim.injured_by();
            if attackers == 0 {
                continue;
            }

            let id = victim.id();
            let at = victim.position();
            for other in 0..self.players.len() {
                if attackers & self.players[other].id().mask() == 0 {
                    continue;
                }
                if other == index {
                    self.players[other].forfeit_kill();
                } else {
                    self.players[other].credit_kill();
                }
            }

            self.incidents
                .record(Incident::new(IncidentKind::PlayerKilled, at).with_origin(id));
            self.players[index].kill();
            died = true;
            info!(seat = %id, position = %at, attackers, "player killed");
        }
        if died {
            self.sync_player_flags();
        }
    }
}

fn was_offered(request: &MessageBody, spell: SpellId, target: Position) -> bool {
    let MessageBody::AskFight { offers } = request else {
        return false;
    };
    offers
        .iter()
        .any(|offer| offer.spell == spell && offer.targets.contains(&target))
}

fn step_budget(steps: i32) -> u8 {
    u8::try_from(steps.max(0)).unwrap_or(u8::MAX)
}

fn isqrt(value: u32) -> i32 {
    let mut root = 0u32;
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    i32::try_from(root).unwrap_or(i32::MAX)
}
