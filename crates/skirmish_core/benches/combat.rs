//! Rules benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{fixed, infantry, lance, sword};

/// Rolling a mid-sized pool with rerolls.
pub fn roll_benchmark(c: &mut Criterion) {
    let mut pool = DicePool::new(8).with_target(4).with_criticals(true);
    pool.set_reroll_ones(true);
    let roller = DiceRoller::new();
    let mut dice = RngDice::seeded(1);

    c.bench_function("roll_8d6_reroll_ones", |b| {
        b.iter(|| black_box(roller.roll(black_box(&pool), &mut dice)))
    });
}

/// Exact odds for attack against defence.
pub fn odds_benchmark(c: &mut Criterion) {
    let attack = DicePool::new(10).with_target(3).with_criticals(true);
    let defense = DicePool::new(8).with_target(4);

    c.bench_function("hit_chance_10v8", |b| {
        b.iter(|| black_box(SuccessOdds::hit_chance(black_box(&attack), black_box(&defense))))
    });
}

/// Full attack resolution including the damage write and observers.
pub fn resolve_benchmark(c: &mut Criterion) {
    let field = OpenField::new();
    let attacker = infantry(1, Vec2Fixed::ZERO).facing_towards(Vec2Fixed::from_ints(1, 0));
    let template = infantry(2, Vec2Fixed::new(fixed(1), fixed(0)));
    let weapons = [sword(), lance()];
    let mut resolver = CombatResolver::new(&field, CombatConfig::default())
        .expect("default config is valid");
    let mut dice = RngDice::seeded(7);

    c.bench_function("resolve_melee", |b| {
        b.iter(|| {
            let mut defender = template.clone();
            for weapon in &weapons {
                if defender.is_alive() {
                    black_box(
                        resolver
                            .resolve(&attacker, &mut defender, weapon, &mut dice)
                            .expect("valid attack"),
                    );
                }
            }
        })
    });
}

criterion_group!(benches, roll_benchmark, odds_benchmark, resolve_benchmark);
criterion_main!(benches);
