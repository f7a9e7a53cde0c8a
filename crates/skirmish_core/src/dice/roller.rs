//! Rolling a pool against a random source.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::pool::DicePool;
use super::source::DiceSource;

/// The result of rolling one [`DicePool`].
///
/// `success_count` may exceed the number of dice: a natural maximum face
/// scores its normal success (when it clears the target) and a critical
/// bonus success on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollOutcome {
    raw_faces: Vec<u32>,
    modified_faces: Vec<i64>,
    success_count: u32,
    critical_count: u32,
    rerolled: BTreeSet<usize>,
}

impl RollOutcome {
    /// An outcome with no dice.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Final raw face of each die (after any reroll).
    #[must_use]
    pub fn raw_faces(&self) -> &[u32] {
        &self.raw_faces
    }

    /// Raw face plus the pool's value modifier, per die.
    #[must_use]
    pub fn modified_faces(&self) -> &[i64] {
        &self.modified_faces
    }

    /// Total successes, including critical bonus successes.
    #[must_use]
    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    /// Number of dice that landed on their natural maximum with criticals on.
    #[must_use]
    pub fn critical_count(&self) -> u32 {
        self.critical_count
    }

    /// Indices of dice that were rerolled.
    #[must_use]
    pub fn rerolled_indices(&self) -> &BTreeSet<usize> {
        &self.rerolled
    }

    /// Number of dice rolled.
    #[must_use]
    pub fn dice_rolled(&self) -> usize {
        self.raw_faces.len()
    }

    /// Whether no dice were rolled at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_faces.is_empty()
    }
}

/// Executes dice pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiceRoller;

impl DiceRoller {
    /// Create a roller.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Roll every die of `pool` against `source`.
    ///
    /// Each die is rerolled at most once: natural ones first (when
    /// `reroll_ones` is set), otherwise failures (when `reroll_failed` is set).
    pub fn roll(&self, pool: &DicePool, source: &mut dyn DiceSource) -> RollOutcome {
        let count = pool.dice_count() as usize;
        if count == 0 {
            return RollOutcome::empty();
        }

        let sides = pool.sides();
        let mut outcome = RollOutcome {
            raw_faces: Vec::with_capacity(count),
            modified_faces: Vec::with_capacity(count),
            ..RollOutcome::default()
        };

        for index in 0..count {
            let mut raw = source.roll(sides);

            if pool.reroll_ones() && raw == 1 {
                raw = source.roll(sides);
                outcome.rerolled.insert(index);
            } else if pool.reroll_failed() && !pool.is_success(raw) {
                raw = source.roll(sides);
                outcome.rerolled.insert(index);
            }

            if pool.is_success(raw) {
                outcome.success_count += 1;
            }
            if pool.allow_criticals() && raw == sides {
                outcome.success_count += 1;
                outcome.critical_count += 1;
            }

            outcome.raw_faces.push(raw);
            outcome.modified_faces.push(pool.modified_face(raw));
        }

        tracing::debug!(
            pool = %pool,
            faces = ?outcome.raw_faces,
            successes = outcome.success_count,
            criticals = outcome.critical_count,
            "Rolled dice pool"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{RngDice, ScriptedDice};

    #[test]
    fn test_forced_six_three_with_criticals() {
        let pool = DicePool::new(2).with_target(4).with_criticals(true);
        let mut dice = ScriptedDice::new(vec![6, 3]);

        let outcome = DiceRoller::new().roll(&pool, &mut dice);

        assert_eq!(outcome.modified_faces(), &[6, 3]);
        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.critical_count(), 1);
        assert!(outcome.rerolled_indices().is_empty());
    }

    #[test]
    fn test_critical_without_clearing_target() {
        // A natural 6 at -3 is a modified 3: no normal success, still a critical.
        let pool = DicePool::new(1)
            .with_target(4)
            .with_modifier(-3)
            .with_criticals(true);
        let mut dice = ScriptedDice::new(vec![6]);

        let outcome = DiceRoller::new().roll(&pool, &mut dice);

        assert_eq!(outcome.success_count(), 1);
        assert_eq!(outcome.critical_count(), 1);
    }

    #[test]
    fn test_criticals_disabled() {
        let pool = DicePool::new(2).with_target(4);
        let mut dice = ScriptedDice::new(vec![6, 6]);
        let outcome = DiceRoller::new().roll(&pool, &mut dice);
        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.critical_count(), 0);
    }

    #[test]
    fn test_empty_pool() {
        let pool = DicePool::new(0).with_criticals(true);
        let mut dice = ScriptedDice::new(vec![6]);
        let outcome = DiceRoller::new().roll(&pool, &mut dice);
        assert!(outcome.is_empty());
        assert_eq!(outcome.success_count(), 0);
        assert_eq!(outcome.critical_count(), 0);
        assert_eq!(dice.drawn(), 0);
    }

    #[test]
    fn test_reroll_ones_once() {
        let mut pool = DicePool::new(2).with_target(4);
        pool.set_reroll_ones(true);
        // First die: 1 -> 1 (no chained reroll). Second die: 5.
        let mut dice = ScriptedDice::new(vec![1, 1, 5]);

        let outcome = DiceRoller::new().roll(&pool, &mut dice);

        assert_eq!(outcome.raw_faces(), &[1, 5]);
        assert_eq!(outcome.success_count(), 1);
        assert_eq!(outcome.rerolled_indices().iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(dice.drawn(), 3);
    }

    #[test]
    fn test_reroll_failed_uses_modifier() {
        let mut pool = DicePool::new(3).with_target(4).with_modifier(1);
        pool.set_reroll_failed(true);
        // 3+1 = 4 passes; 2+1 fails -> reroll to 6; 4 passes.
        let mut dice = ScriptedDice::new(vec![3, 2, 6, 4]);

        let outcome = DiceRoller::new().roll(&pool, &mut dice);

        assert_eq!(outcome.raw_faces(), &[3, 6, 4]);
        assert_eq!(outcome.modified_faces(), &[4, 7, 5]);
        assert_eq!(outcome.success_count(), 3);
        assert!(outcome.rerolled_indices().contains(&1));
        assert_eq!(outcome.rerolled_indices().len(), 1);
    }

    #[test]
    fn test_reroll_ones_takes_priority_over_failed() {
        let mut pool = DicePool::new(1).with_target(4);
        pool.set_reroll_ones(true);
        pool.set_reroll_failed(true);
        // 1 is rerolled once by the ones rule; the resulting 2 is not rerolled again.
        let mut dice = ScriptedDice::new(vec![1, 2, 6]);

        let outcome = DiceRoller::new().roll(&pool, &mut dice);

        assert_eq!(outcome.raw_faces(), &[2]);
        assert_eq!(outcome.success_count(), 0);
        assert_eq!(dice.drawn(), 2);
    }

    #[test]
    fn test_critical_after_reroll() {
        let mut pool = DicePool::new(1).with_target(4).with_criticals(true);
        pool.set_reroll_failed(true);
        let mut dice = ScriptedDice::new(vec![2, 6]);

        let outcome = DiceRoller::new().roll(&pool, &mut dice);

        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.critical_count(), 1);
    }

    #[test]
    fn test_seeded_roll_is_deterministic() {
        let pool = DicePool::new(10).with_criticals(true);
        let roller = DiceRoller::new();
        let a = roller.roll(&pool, &mut RngDice::seeded(99));
        let b = roller.roll(&pool, &mut RngDice::seeded(99));
        assert_eq!(a, b);
    }
}
