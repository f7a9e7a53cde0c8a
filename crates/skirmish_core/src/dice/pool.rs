//! Dice pool definition.

use serde::{Deserialize, Serialize};

/// Canonical die size.
pub const DEFAULT_SIDES: u32 = 6;

/// Target number used when none is given.
pub const DEFAULT_TARGET: u32 = 4;

/// A pool of identical dice rolled against a target number.
///
/// The target number is always kept within `[1, sides]` and the dice count
/// never goes below zero. Deserialized pools are clamped the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StoredPool")]
pub struct DicePool {
    dice_count: u32,
    sides: u32,
    target_number: u32,
    value_modifier: i32,
    allow_criticals: bool,
    reroll_ones: bool,
    reroll_failed: bool,
}

/// Wire shape of a [`DicePool`] before its invariants are restored.
#[derive(Deserialize)]
struct StoredPool {
    dice_count: u32,
    sides: u32,
    target_number: u32,
    value_modifier: i32,
    allow_criticals: bool,
    reroll_ones: bool,
    reroll_failed: bool,
}

impl From<StoredPool> for DicePool {
    fn from(stored: StoredPool) -> Self {
        let mut pool = Self::new(stored.dice_count)
            .with_sides(stored.sides)
            .with_target(stored.target_number)
            .with_modifier(stored.value_modifier)
            .with_criticals(stored.allow_criticals);
        pool.set_reroll_ones(stored.reroll_ones);
        pool.set_reroll_failed(stored.reroll_failed);
        pool
    }
}

impl DicePool {
    /// Create a pool of `dice_count` six-sided dice needing 4+.
    #[must_use]
    pub const fn new(dice_count: u32) -> Self {
        Self {
            dice_count,
            sides: DEFAULT_SIDES,
            target_number: DEFAULT_TARGET,
            value_modifier: 0,
            allow_criticals: false,
            reroll_ones: false,
            reroll_failed: false,
        }
    }

    /// Builder method to set the target number (clamped to `[1, sides]`).
    #[must_use]
    pub fn with_target(mut self, target: u32) -> Self {
        self.set_target_number(target);
        self
    }

    /// Builder method to set the flat per-die value modifier.
    #[must_use]
    pub const fn with_modifier(mut self, modifier: i32) -> Self {
        self.value_modifier = modifier;
        self
    }

    /// Builder method to change the die size.
    ///
    /// Zero-sided dice are not allowed; `0` is treated as `1`.
    /// The target number is re-clamped to the new size.
    #[must_use]
    pub fn with_sides(mut self, sides: u32) -> Self {
        self.sides = sides.max(1);
        self.target_number = self.target_number.clamp(1, self.sides);
        self
    }

    /// Builder method to enable or disable criticals.
    #[must_use]
    pub const fn with_criticals(mut self, allow: bool) -> Self {
        self.allow_criticals = allow;
        self
    }

    /// Number of dice in the pool.
    #[must_use]
    pub const fn dice_count(&self) -> u32 {
        self.dice_count
    }

    /// Faces per die.
    #[must_use]
    pub const fn sides(&self) -> u32 {
        self.sides
    }

    /// Modified face value needed for a success.
    #[must_use]
    pub const fn target_number(&self) -> u32 {
        self.target_number
    }

    /// Flat modifier added to every raw face.
    #[must_use]
    pub const fn value_modifier(&self) -> i32 {
        self.value_modifier
    }

    /// Whether natural maximum faces score a bonus success.
    #[must_use]
    pub const fn allow_criticals(&self) -> bool {
        self.allow_criticals
    }

    /// Whether natural ones are rerolled.
    #[must_use]
    pub const fn reroll_ones(&self) -> bool {
        self.reroll_ones
    }

    /// Whether failed dice are rerolled.
    #[must_use]
    pub const fn reroll_failed(&self) -> bool {
        self.reroll_failed
    }

    /// Add (or with a negative delta, remove) dice. Clamps at zero.
    pub fn add_dice(&mut self, delta: i32) {
        let count = i64::from(self.dice_count) + i64::from(delta);
        self.dice_count = count.clamp(0, i64::from(u32::MAX)) as u32;
    }

    /// Adjust the per-die value modifier.
    pub fn add_modifier(&mut self, delta: i32) {
        self.value_modifier = self.value_modifier.saturating_add(delta);
    }

    /// Set the target number, clamped to `[1, sides]`.
    pub fn set_target_number(&mut self, target: u32) {
        self.target_number = target.clamp(1, self.sides);
    }

    /// Enable or disable rerolling natural ones.
    pub fn set_reroll_ones(&mut self, enabled: bool) {
        self.reroll_ones = enabled;
    }

    /// Enable or disable rerolling failed dice.
    pub fn set_reroll_failed(&mut self, enabled: bool) {
        self.reroll_failed = enabled;
    }

    /// Enable or disable critical successes.
    pub fn set_criticals(&mut self, enabled: bool) {
        self.allow_criticals = enabled;
    }

    /// Whether a modified face counts as a success.
    #[must_use]
    pub fn is_success(&self, raw_face: u32) -> bool {
        self.modified_face(raw_face) >= i64::from(self.target_number)
    }

    /// Raw face plus the value modifier.
    #[must_use]
    pub fn modified_face(&self, raw_face: u32) -> i64 {
        i64::from(raw_face) + i64::from(self.value_modifier)
    }
}

impl Default for DicePool {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Display for DicePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{} {}+", self.dice_count, self.sides, self.target_number)?;
        if self.value_modifier != 0 {
            write!(f, " ({:+})", self.value_modifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialized_pool_is_clamped() {
        let text = "(dice_count: 3, sides: 6, target_number: 9, value_modifier: 0, \
                    allow_criticals: false, reroll_ones: true, reroll_failed: false)";
        let pool: DicePool = ron::from_str(text).unwrap();
        assert_eq!(pool.target_number(), 6);
        assert!(pool.reroll_ones());

        let text = "(dice_count: 2, sides: 0, target_number: 0, value_modifier: -1, \
                    allow_criticals: true, reroll_ones: false, reroll_failed: true)";
        let pool: DicePool = ron::from_str(text).unwrap();
        assert_eq!(pool.sides(), 1);
        assert_eq!(pool.target_number(), 1);
        assert_eq!(pool.value_modifier(), -1);
        assert!(pool.allow_criticals() && pool.reroll_failed());

        let valid = DicePool::new(4).with_target(5).with_criticals(true);
        let round_trip: DicePool = ron::from_str(&ron::to_string(&valid).unwrap()).unwrap();
        assert_eq!(round_trip, valid);
    }

    #[test]
    fn test_defaults() {
        let pool = DicePool::new(3);
        assert_eq!(pool.dice_count(), 3);
        assert_eq!(pool.sides(), 6);
        assert_eq!(pool.target_number(), 4);
        assert_eq!(pool.value_modifier(), 0);
        assert!(!pool.allow_criticals());
        assert!(!pool.reroll_ones());
        assert!(!pool.reroll_failed());
    }

    #[test]
    fn test_add_dice_clamps_at_zero() {
        let mut pool = DicePool::new(2);
        pool.add_dice(-5);
        assert_eq!(pool.dice_count(), 0);
        pool.add_dice(3);
        assert_eq!(pool.dice_count(), 3);
    }

    #[test]
    fn test_target_clamped_to_sides() {
        let mut pool = DicePool::new(1);
        pool.set_target_number(9);
        assert_eq!(pool.target_number(), 6);
        pool.set_target_number(0);
        assert_eq!(pool.target_number(), 1);

        let d3 = DicePool::new(1).with_target(5).with_sides(3);
        assert_eq!(d3.target_number(), 3);
    }

    #[test]
    fn test_success_uses_modified_face() {
        let pool = DicePool::new(1).with_target(4).with_modifier(-1);
        assert!(!pool.is_success(4));
        assert!(pool.is_success(5));
        assert_eq!(pool.modified_face(1), 0);
    }

    #[test]
    fn test_display() {
        let pool = DicePool::new(4).with_target(3).with_modifier(1);
        assert_eq!(pool.to_string(), "4d6 3+ (+1)");
    }
}
