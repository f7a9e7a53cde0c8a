//! Property tests for rolls, stacks, odds and replay.

use proptest::prelude::*;
use skirmish_core::prelude::*;
use skirmish_test_utils::determinism::strategies::{
    arb_contribution, arb_dice_pool, arb_faces, arb_seed,
};
use skirmish_test_utils::fixtures::Skirmish;

proptest! {
    #[test]
    fn prop_success_count_bounded(pool in arb_dice_pool(), faces in arb_faces()) {
        let outcome = DiceRoller::new().roll(&pool, &mut ScriptedDice::new(faces));
        let dice = pool.dice_count();
        prop_assert_eq!(outcome.dice_rolled(), dice as usize);
        if pool.allow_criticals() {
            prop_assert!(outcome.success_count() <= 2 * dice);
        } else {
            prop_assert!(outcome.success_count() <= dice);
            prop_assert_eq!(outcome.critical_count(), 0);
        }
        prop_assert!(outcome.critical_count() <= dice);
    }

    #[test]
    fn prop_rerolled_at_most_once(pool in arb_dice_pool(), faces in arb_faces()) {
        let mut dice = ScriptedDice::new(faces);
        let outcome = DiceRoller::new().roll(&pool, &mut dice);
        prop_assert_eq!(dice.drawn(), outcome.dice_rolled() + outcome.rerolled_indices().len());
        if !pool.reroll_ones() && !pool.reroll_failed() {
            prop_assert!(outcome.rerolled_indices().is_empty());
        }
    }

    #[test]
    fn prop_add_then_remove_is_noop(
        base in proptest::collection::vec(arb_contribution(), 0..6),
        extra in arb_contribution(),
    ) {
        let mut stack = ModifierStack::new();
        for (source, dice, value, result) in &base {
            stack.add_dice_count_modifier(source, *dice);
            stack.add_dice_value_modifier(source, *value);
            stack.add_result_modifier(source, *result);
        }
        prop_assume!(!stack.contains(&extra.0));
        let before = stack.clone();

        let (source, dice, value, result) = extra;
        stack.add_dice_count_modifier(&source, dice);
        stack.add_dice_value_modifier(&source, value);
        stack.add_result_modifier(&source, result);
        stack.remove_source(&source).unwrap();

        prop_assert_eq!(stack, before);
    }

    #[test]
    fn prop_totals_are_sums(entries in proptest::collection::vec(arb_contribution(), 0..8)) {
        let mut stack = ModifierStack::new();
        for (source, dice, value, result) in &entries {
            stack.add_dice_count_modifier(source, *dice);
            stack.add_dice_value_modifier(source, *value);
            stack.add_result_modifier(source, *result);
        }
        prop_assert_eq!(stack.dice_count_total(), entries.iter().map(|e| e.1).sum::<i32>());
        prop_assert_eq!(stack.dice_value_total(), entries.iter().map(|e| e.2).sum::<i32>());
        prop_assert_eq!(stack.result_modifier_total(), entries.iter().map(|e| e.3).sum::<i32>());
    }

    #[test]
    fn prop_odds_sum_to_one(pool in arb_dice_pool()) {
        let odds = SuccessOdds::for_pool(&pool);
        let total: f64 = odds.distribution().iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!((odds.at_least(0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_net_damage_never_negative(
        base in 0u32..10,
        attack in 0u32..12,
        defense in 0u32..12,
        armor in 0u32..6,
        penetration in 0u32..6,
        result_modifier in -10i32..10,
    ) {
        let breakdown = DamageCalculator::new(1).calculate(&DamageInput {
            base_damage: base,
            attack_successes: attack,
            defense_successes: defense,
            armor,
            armor_penetration: penetration,
            result_modifier,
            type_bonus: 0,
            affinity: DamageAffinity::Normal,
        });
        prop_assert_eq!(breakdown.net_successes, attack.saturating_sub(defense));
        if attack > defense {
            prop_assert!(breakdown.final_damage >= 1);
        }
    }

    #[test]
    fn prop_same_seed_same_log(seed in arb_seed()) {
        let mut first = Skirmish::infantry_vs_knight(seed);
        let mut second = Skirmish::infantry_vs_knight(seed);
        first.play(15).unwrap();
        second.play(15).unwrap();
        prop_assert_eq!(first.log().encode().unwrap(), second.log().encode().unwrap());
    }
}

#[test]
fn test_odds_match_empirical_mean() {
    let pool = DicePool::new(6).with_target(4).with_criticals(true);
    let expected = SuccessOdds::for_pool(&pool).expected();

    let roller = DiceRoller::new();
    let mut dice = RngDice::seeded(2024);
    let trials = 20_000;
    let total: u64 = (0..trials)
        .map(|_| u64::from(roller.roll(&pool, &mut dice).success_count()))
        .sum();
    let mean = total as f64 / f64::from(trials);

    // 6 dice at 4+ with sixes doubling: 6 * (3/6 + 1/6) = 4.0
    assert!((expected - 4.0).abs() < 1e-9);
    assert!((mean - expected).abs() < 0.05, "mean {mean} vs expected {expected}");
}

#[test]
fn test_log_survives_encoding() {
    let mut skirmish = Skirmish::infantry_vs_knight(77);
    skirmish.play(10).unwrap();
    let bytes = skirmish.log().encode().unwrap();
    let decoded = CombatLog::decode(&bytes).unwrap();
    assert_eq!(decoded, skirmish.log().results());
}
