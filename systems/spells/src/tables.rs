//! Shipped spell tables, one list per element in id order.

use spellgrid_core::ElementKind;

use crate::{MissPolicy, RangeBand, SpellEffect, SpellTemplate};

const fn band(range: i32, hit: i32, min: i32, max: i32) -> RangeBand {
    RangeBand::new(range, hit, min, max)
}

const WATER: &[SpellTemplate] = &[
    SpellTemplate::new(
        "Whip",
        75,
        5,
        1,
        &[band(10, 40, 30, 50), band(20, 30, 20, 50), band(30, 10, 10, 50)],
    )
    .with_effects(&[SpellEffect::Push { min: 0, max: 3 }]),
    SpellTemplate::new(
        "Ooze",
        60,
        5,
        2,
        &[band(20, 50, 10, 25), band(30, 30, 10, 25), band(40, 15, 10, 25)],
    )
    .with_effects(&[SpellEffect::Poison {
        min: 5,
        max: 20,
        duration: 3,
    }]),
    SpellTemplate::new("Hammer", 5, 2, 1, &[band(7, 80, 80, 100)]),
    SpellTemplate::new("Baptize", 5, 2, 1, &[band(10, 100, 0, 10)])
        .defensive()
        .with_effects(&[
            SpellEffect::Heal { min: 10, max: 30 },
            SpellEffect::DamageModifier {
                amount: -5,
                duration: 2,
            },
        ]),
];

const EARTH: &[SpellTemplate] = &[
    SpellTemplate::new(
        "Boulder",
        20,
        3,
        1,
        &[
            band(5, 80, 60, 70),
            band(10, 50, 60, 70),
            band(15, 30, 60, 80),
            band(20, 10, 60, 80),
        ],
    ),
    SpellTemplate::new(
        "Pebbles",
        95,
        15,
        5,
        &[
            band(10, 20, 15, 20),
            band(20, 15, 10, 15),
            band(30, 10, 5, 10),
            band(40, 5, 0, 10),
        ],
    ),
    SpellTemplate::new("Iron suit", 100, 3, 1, &[band(10, 100, 0, 0)])
        .defensive()
        .with_effects(&[
            SpellEffect::BeHitModifier {
                amount: 5,
                duration: 3,
            },
            SpellEffect::DamageModifier {
                amount: -15,
                duration: 3,
            },
        ]),
    SpellTemplate::new(
        "Grenade",
        20,
        3,
        1,
        &[band(10, 80, 30, 50), band(20, 40, 30, 50), band(30, 20, 30, 50)],
    )
    .with_miss(MissPolicy::Bounce, 15)
    .with_effects(&[
        SpellEffect::Splash {
            step: 1,
            drop: 5,
            min: 15,
            max: 25,
        },
        SpellEffect::Splash {
            step: 2,
            drop: 10,
            min: 15,
            max: 25,
        },
        SpellEffect::Splash {
            step: 1,
            drop: 20,
            min: 15,
            max: 45,
        },
        SpellEffect::RandomPush { min: 1, max: 3 },
    ]),
];

const AIR: &[SpellTemplate] = &[
    SpellTemplate::new("Swipe", 85, 4, 1, &[band(40, 80, 10, 60)])
        .with_effects(&[SpellEffect::RandomPush { min: 3, max: 6 }]),
    SpellTemplate::new(
        "Cannon",
        80,
        3,
        1,
        &[
            band(10, 80, 20, 50),
            band(30, 70, 10, 40),
            band(40, 60, 5, 35),
            band(50, 50, 5, 30),
        ],
    )
    .with_effects(&[SpellEffect::Push { min: 3, max: 3 }]),
    SpellTemplate::new("Choke", 30, 2, 1, &[band(5, 70, 5, 20), band(15, 60, 5, 20)])
        .with_effects(&[
            SpellEffect::BeHitModifier {
                amount: 10,
                duration: 4,
            },
            SpellEffect::Poison {
                min: 10,
                max: 25,
                duration: 4,
            },
        ]),
    SpellTemplate::new(
        "Buffet",
        55,
        5,
        3,
        &[
            band(10, 50, 5, 20),
            band(20, 35, 5, 15),
            band(30, 10, 5, 10),
            band(35, 5, 0, 10),
        ],
    )
    .with_effects(&[
        SpellEffect::HitModifier {
            amount: -10,
            duration: 2,
        },
        SpellEffect::Poison {
            min: 1,
            max: 10,
            duration: 2,
        },
        SpellEffect::RandomPush { min: 0, max: 3 },
    ]),
];

const FIRE: &[SpellTemplate] = &[
    SpellTemplate::new(
        "Lance",
        25,
        3,
        1,
        &[
            band(15, 20, 60, 100),
            band(25, 50, 50, 100),
            band(45, 60, 40, 100),
            band(60, 65, 30, 80),
        ],
    ),
    SpellTemplate::new(
        "Fireball",
        55,
        5,
        1,
        &[band(10, 80, 40, 60), band(30, 50, 40, 60), band(50, 30, 40, 60)],
    )
    .with_effects(&[SpellEffect::Splash {
        step: 2,
        drop: 3,
        min: 5,
        max: 20,
    }]),
    SpellTemplate::new("On Fire", 85, 1, 1, &[band(5, 100, 0, 20)])
        .defensive()
        .with_effects(&[
            SpellEffect::Splash {
                step: 1,
                drop: 4,
                min: 5,
                max: 30,
            },
            SpellEffect::HitModifier {
                amount: 10,
                duration: 5,
            },
            SpellEffect::BeHitModifier {
                amount: 5,
                duration: 5,
            },
            SpellEffect::DamageModifier {
                amount: -10,
                duration: 5,
            },
            SpellEffect::Poison {
                min: 5,
                max: 10,
                duration: 3,
            },
        ]),
    SpellTemplate::new(
        "Torch",
        25,
        3,
        1,
        &[band(10, 75, 0, 20), band(15, 60, 0, 20), band(20, 40, 0, 20)],
    )
    .with_effects(&[
        SpellEffect::Splash {
            step: 1,
            drop: 5,
            min: 10,
            max: 40,
        },
        SpellEffect::BeHitModifier {
            amount: 5,
            duration: 2,
        },
        SpellEffect::DamageModifier {
            amount: 5,
            duration: 2,
        },
        SpellEffect::Poison {
            min: 20,
            max: 40,
            duration: 2,
        },
    ]),
];

/// Element lists in the order their ids are assigned.
pub(crate) const STANDARD: [(ElementKind, &[SpellTemplate]); 4] = [
    (ElementKind::Water, WATER),
    (ElementKind::Earth, EARTH),
    (ElementKind::Air, AIR),
    (ElementKind::Fire, FIRE),
];
