//! Additive modifier aggregation.
//!
//! A [`ModifierStack`] collects contributions keyed by [`ModifierSource`].
//! Terrain, abilities, played cards and built-in rules (flanking, cover,
//! status effects) all go through the same `add_*` / `remove_source` calls,
//! so an external contribution is indistinguishable from a built-in one.
//!
//! Stacking is purely additive: the aggregate never depends on the order
//! contributions were added, and removing a source retracts exactly what it
//! added.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::dice::DicePool;
use crate::error::{CombatError, Result};

/// Named origin of modifier contributions.
///
/// Deserialization goes through [`ModifierSource::new`], so stored keys obey
/// the same rules as keys built in code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModifierSource(Cow<'static, str>);

impl ModifierSource {
    /// Attacker is striking the defender from the flank.
    pub const FLANKING: Self = Self::builtin("flanking");
    /// Ranged attack beyond half the weapon's maximum range.
    pub const LONG_RANGE: Self = Self::builtin("long_range");
    /// Defender is in cover against a ranged attack.
    pub const COVER: Self = Self::builtin("cover");
    /// Defender holds a Guard status.
    pub const GUARD: Self = Self::builtin("status:guard");
    /// Unit is Shaken.
    pub const SHAKEN: Self = Self::builtin("status:shaken");

    const fn builtin(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    /// Create a source from an external key (card, ability, terrain id).
    ///
    /// Empty keys are rejected.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(CombatError::EmptyModifierSource);
        }
        Ok(Self(Cow::Owned(key)))
    }

    /// The source key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ModifierSource {
    type Error = CombatError;

    fn try_from(key: String) -> Result<Self> {
        Self::new(key)
    }
}

impl From<ModifierSource> for String {
    fn from(source: ModifierSource) -> Self {
        source.0.into_owned()
    }
}

impl std::fmt::Display for ModifierSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one source contributes to a stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierEntry {
    /// Dice added to (or removed from) the pool.
    pub dice_count_delta: i32,
    /// Added to every die's value.
    pub dice_value_delta: i32,
    /// Added to the damage result after rolling.
    pub result_delta: i32,
    /// Grants rerolling natural ones.
    pub allows_reroll_ones: bool,
    /// Grants rerolling failed dice.
    pub allows_reroll_failed: bool,
}

impl ModifierEntry {
    fn describe(&self, out: &mut String) {
        let mut parts = Vec::new();
        if self.dice_count_delta != 0 {
            parts.push(format!("{:+} dice", self.dice_count_delta));
        }
        if self.dice_value_delta != 0 {
            parts.push(format!("{:+} value", self.dice_value_delta));
        }
        if self.result_delta != 0 {
            parts.push(format!("{:+} damage", self.result_delta));
        }
        if self.allows_reroll_ones {
            parts.push("reroll 1s".to_string());
        }
        if self.allows_reroll_failed {
            parts.push("reroll fails".to_string());
        }
        if parts.is_empty() {
            out.push_str("no effect");
        } else {
            out.push_str(&parts.join(", "));
        }
    }
}

/// Additive modifier contributions keyed by source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierStack {
    entries: BTreeMap<ModifierSource, ModifierEntry>,
}

impl ModifierStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut(&mut self, source: &ModifierSource) -> &mut ModifierEntry {
        self.entries.entry(source.clone()).or_default()
    }

    /// Add dice to pools built with this stack.
    pub fn add_dice_count_modifier(&mut self, source: &ModifierSource, delta: i32) {
        let entry = self.entry_mut(source);
        entry.dice_count_delta = entry.dice_count_delta.saturating_add(delta);
    }

    /// Add to the value of every die.
    pub fn add_dice_value_modifier(&mut self, source: &ModifierSource, delta: i32) {
        let entry = self.entry_mut(source);
        entry.dice_value_delta = entry.dice_value_delta.saturating_add(delta);
    }

    /// Add to the post-roll damage result.
    pub fn add_result_modifier(&mut self, source: &ModifierSource, delta: i32) {
        let entry = self.entry_mut(source);
        entry.result_delta = entry.result_delta.saturating_add(delta);
    }

    /// Grant rerolling natural ones.
    pub fn add_reroll_ones(&mut self, source: &ModifierSource) {
        self.entry_mut(source).allows_reroll_ones = true;
    }

    /// Grant rerolling failed dice.
    pub fn add_reroll_failed(&mut self, source: &ModifierSource) {
        self.entry_mut(source).allows_reroll_failed = true;
    }

    /// Retract everything `source` contributed.
    ///
    /// Removing a source that was never added is a caller bug and is reported
    /// as [`CombatError::UnknownModifierSource`].
    pub fn remove_source(&mut self, source: &ModifierSource) -> Result<ModifierEntry> {
        self.entries
            .remove(source)
            .ok_or_else(|| CombatError::UnknownModifierSource(source.key().to_string()))
    }

    /// Whether `source` has contributed to this stack.
    #[must_use]
    pub fn contains(&self, source: &ModifierSource) -> bool {
        self.entries.contains_key(source)
    }

    /// The entry for `source`, if present.
    #[must_use]
    pub fn entry(&self, source: &ModifierSource) -> Option<&ModifierEntry> {
        self.entries.get(source)
    }

    /// Iterate entries in source-key order.
    pub fn entries(&self) -> impl Iterator<Item = (&ModifierSource, &ModifierEntry)> {
        self.entries.iter()
    }

    /// Number of distinct sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no source has contributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of dice count deltas.
    #[must_use]
    pub fn dice_count_total(&self) -> i32 {
        self.entries
            .values()
            .fold(0i32, |sum, e| sum.saturating_add(e.dice_count_delta))
    }

    /// Sum of dice value deltas.
    #[must_use]
    pub fn dice_value_total(&self) -> i32 {
        self.entries
            .values()
            .fold(0i32, |sum, e| sum.saturating_add(e.dice_value_delta))
    }

    /// Sum of post-roll result deltas.
    #[must_use]
    pub fn result_modifier_total(&self) -> i32 {
        self.entries
            .values()
            .fold(0i32, |sum, e| sum.saturating_add(e.result_delta))
    }

    /// Whether any source grants rerolling ones.
    #[must_use]
    pub fn rerolls_ones(&self) -> bool {
        self.entries.values().any(|e| e.allows_reroll_ones)
    }

    /// Whether any source grants rerolling failures.
    #[must_use]
    pub fn rerolls_failed(&self) -> bool {
        self.entries.values().any(|e| e.allows_reroll_failed)
    }

    /// Fold the dice-affecting totals into `pool`.
    ///
    /// Result modifiers are not part of the pool; read them with
    /// [`Self::result_modifier_total`] after rolling.
    pub fn apply_to_pool(&self, pool: &mut DicePool) {
        pool.add_dice(self.dice_count_total());
        pool.add_modifier(self.dice_value_total());
        if self.rerolls_ones() {
            pool.set_reroll_ones(true);
        }
        if self.rerolls_failed() {
            pool.set_reroll_failed(true);
        }
    }

    /// Add every contribution of `other` into this stack, source by source.
    pub fn merge(&mut self, other: &ModifierStack) {
        for (source, incoming) in &other.entries {
            let entry = self.entry_mut(source);
            entry.dice_count_delta = entry.dice_count_delta.saturating_add(incoming.dice_count_delta);
            entry.dice_value_delta = entry.dice_value_delta.saturating_add(incoming.dice_value_delta);
            entry.result_delta = entry.result_delta.saturating_add(incoming.result_delta);
            entry.allows_reroll_ones |= incoming.allows_reroll_ones;
            entry.allows_reroll_failed |= incoming.allows_reroll_failed;
        }
    }

    /// One-line description of every entry, in source-key order.
    ///
    /// Empty stacks produce an empty string.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (index, (source, entry)) in self.entries.iter().enumerate() {
            if index > 0 {
                out.push_str("; ");
            }
            let _ = write!(out, "{source}: ");
            entry.describe(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(key: &str) -> ModifierSource {
        ModifierSource::new(key).unwrap()
    }

    #[test]
    fn test_empty_source_rejected() {
        assert_eq!(
            ModifierSource::new("  "),
            Err(CombatError::EmptyModifierSource)
        );
    }

    #[test]
    fn test_deserialized_source_is_validated() {
        assert!(ron::from_str::<ModifierSource>("\"  \"").is_err());
        assert_eq!(
            ron::from_str::<ModifierSource>("\"status:guard\"").unwrap(),
            ModifierSource::GUARD
        );

        let mut stack = ModifierStack::new();
        stack.add_dice_count_modifier(&source("card:charge"), 1);
        let text = ron::to_string(&stack).unwrap();
        assert!(text.contains("\"card:charge\""));
        assert_eq!(ron::from_str::<ModifierStack>(&text).unwrap(), stack);

        let blanked = text.replace("\"card:charge\"", "\" \"");
        assert!(ron::from_str::<ModifierStack>(&blanked).is_err());
    }

    #[test]
    fn test_same_source_accumulates() {
        let mut stack = ModifierStack::new();
        let card = source("card:charge");
        stack.add_dice_count_modifier(&card, 1);
        stack.add_dice_count_modifier(&card, 2);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.dice_count_total(), 3);
    }

    #[test]
    fn test_aggregates_sum_and_or() {
        let mut stack = ModifierStack::new();
        let a = source("a");
        let b = source("b");
        stack.add_dice_count_modifier(&a, 2);
        stack.add_dice_count_modifier(&b, -1);
        stack.add_dice_value_modifier(&a, 1);
        stack.add_result_modifier(&b, 3);
        stack.add_reroll_ones(&b);

        assert_eq!(stack.dice_count_total(), 1);
        assert_eq!(stack.dice_value_total(), 1);
        assert_eq!(stack.result_modifier_total(), 3);
        assert!(stack.rerolls_ones());
        assert!(!stack.rerolls_failed());
    }

    #[test]
    fn test_remove_source_cancels_exactly() {
        let mut stack = ModifierStack::new();
        let terrain = source("terrain:forest");
        let card = source("card:volley");
        stack.add_dice_value_modifier(&terrain, -1);
        let before = (stack.dice_count_total(), stack.dice_value_total());

        stack.add_dice_count_modifier(&card, 2);
        stack.add_reroll_failed(&card);
        stack.add_dice_count_modifier(&card, 1);
        let removed = stack.remove_source(&card).unwrap();

        assert_eq!(removed.dice_count_delta, 3);
        assert!(removed.allows_reroll_failed);
        assert_eq!((stack.dice_count_total(), stack.dice_value_total()), before);
        assert!(!stack.rerolls_failed());
    }

    #[test]
    fn test_remove_unknown_source() {
        let mut stack = ModifierStack::new();
        assert_eq!(
            stack.remove_source(&source("ghost")),
            Err(CombatError::UnknownModifierSource("ghost".to_string()))
        );
    }

    #[test]
    fn test_apply_to_pool() {
        let mut stack = ModifierStack::new();
        stack.add_dice_count_modifier(&ModifierSource::FLANKING, 1);
        stack.add_dice_value_modifier(&ModifierSource::LONG_RANGE, -1);
        stack.add_reroll_ones(&source("ability:drilled"));
        stack.add_result_modifier(&source("card:brutal"), 2);

        let mut pool = DicePool::new(3);
        stack.apply_to_pool(&mut pool);

        assert_eq!(pool.dice_count(), 4);
        assert_eq!(pool.value_modifier(), -1);
        assert!(pool.reroll_ones());
        assert!(!pool.reroll_failed());
    }

    #[test]
    fn test_apply_to_pool_clamps_dice() {
        let mut stack = ModifierStack::new();
        stack.add_dice_count_modifier(&ModifierSource::SHAKEN, -5);
        let mut pool = DicePool::new(2);
        stack.apply_to_pool(&mut pool);
        assert_eq!(pool.dice_count(), 0);
    }

    #[test]
    fn test_merge_is_additive() {
        let mut base = ModifierStack::new();
        base.add_dice_count_modifier(&ModifierSource::FLANKING, 1);

        let mut injected = ModifierStack::new();
        injected.add_dice_count_modifier(&ModifierSource::FLANKING, 1);
        injected.add_reroll_failed(&source("card:aimed"));

        base.merge(&injected);
        assert_eq!(base.dice_count_total(), 2);
        assert!(base.rerolls_failed());
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_summary_sorted_by_key() {
        let mut stack = ModifierStack::new();
        stack.add_dice_value_modifier(&ModifierSource::LONG_RANGE, -1);
        stack.add_dice_count_modifier(&ModifierSource::FLANKING, 1);
        assert_eq!(stack.summary(), "flanking: +1 dice; long_range: -1 value");
        assert_eq!(ModifierStack::new().summary(), "");
    }
}
