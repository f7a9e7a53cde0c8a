//! Dice odds tables.
//!
//! Builds exact success distributions for a pool and, optionally, the chance
//! of beating a defence pool. Output is a plain text table or JSON.

use std::fmt::Write;

use serde::Serialize;
use skirmish_core::dice::{DicePool, SuccessOdds, DEFAULT_SIDES};

/// Pool described on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolShape {
    /// Dice rolled.
    pub dice: u32,
    /// Target number.
    pub target: u32,
    /// Added to every die.
    pub modifier: i32,
    /// Natural maximum scores a bonus success.
    pub criticals: bool,
    /// Reroll natural ones once.
    pub reroll_ones: bool,
    /// Reroll failures once.
    pub reroll_failed: bool,
}

impl PoolShape {
    /// A plain pool with no modifier, criticals or rerolls.
    #[must_use]
    pub const fn new(dice: u32, target: u32) -> Self {
        Self {
            dice,
            target,
            modifier: 0,
            criticals: false,
            reroll_ones: false,
            reroll_failed: false,
        }
    }

    /// The d6 pool this describes.
    #[must_use]
    pub fn to_pool(&self) -> DicePool {
        let mut pool = DicePool::new(self.dice)
            .with_sides(DEFAULT_SIDES)
            .with_target(self.target)
            .with_modifier(self.modifier)
            .with_criticals(self.criticals);
        pool.set_reroll_ones(self.reroll_ones);
        pool.set_reroll_failed(self.reroll_failed);
        pool
    }
}

/// One line of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsRow {
    /// Success count.
    pub successes: u32,
    /// Probability of exactly this many.
    pub exactly: f64,
    /// Probability of at least this many.
    pub at_least: f64,
}

/// Odds for one pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsReport {
    /// Pool shorthand, e.g. `3d6 4+`.
    pub pool: String,
    /// Mean success count.
    pub expected: f64,
    /// Distribution, one row per reachable success count.
    pub rows: Vec<OddsRow>,
    /// Defence pool shorthand when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defense: Option<String>,
    /// Chance of strictly more successes than the defence pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_chance: Option<f64>,
}

impl OddsReport {
    /// Compute odds for `attack`, and against `defense` if given.
    #[must_use]
    pub fn build(attack: &DicePool, defense: Option<&DicePool>) -> Self {
        let odds = SuccessOdds::for_pool(attack);
        let rows = (0..=odds.max_successes())
            .map(|successes| OddsRow {
                successes,
                exactly: odds.probability(successes),
                at_least: odds.at_least(successes),
            })
            .collect();

        Self {
            pool: attack.to_string(),
            expected: odds.expected(),
            rows,
            defense: defense.map(ToString::to_string),
            hit_chance: defense.map(|d| SuccessOdds::hit_chance(attack, d)),
        }
    }

    /// Plain text table.
    #[must_use]
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Pool: {}  (expected {:.2} successes)", self.pool, self.expected);
        let _ = writeln!(out, "{:>9}  {:>8}  {:>8}", "successes", "exactly", "at least");
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:>9}  {:>7.2}%  {:>7.2}%",
                row.successes,
                row.exactly * 100.0,
                row.at_least * 100.0
            );
        }
        if let (Some(defense), Some(chance)) = (&self.defense, self.hit_chance) {
            let _ = writeln!(out, "Hit chance vs {defense}: {:.2}%", chance * 100.0);
        }
        out
    }

    /// Pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::config::CombatConfig;
    use skirmish_test_utils::fixtures::sword;

    #[test]
    fn test_single_die_table() {
        let report = OddsReport::build(&PoolShape::new(1, 4).to_pool(), None);
        assert_eq!(report.rows.len(), 2);
        assert!((report.rows[1].exactly - 0.5).abs() < 1e-9);
        assert!((report.rows[0].at_least - 1.0).abs() < 1e-9);
        assert!(report.hit_chance.is_none());
        assert!(report.to_table().contains("50.00%"));
    }

    #[test]
    fn test_criticals_extend_table() {
        let mut shape = PoolShape::new(2, 4);
        shape.criticals = true;
        let report = OddsReport::build(&shape.to_pool(), None);
        assert_eq!(report.rows.last().map(|r| r.successes), Some(4));
    }

    #[test]
    fn test_weapon_against_default_defence() {
        let config = CombatConfig::default();
        let weapon = sword();
        let attack = weapon.attack.pool(config.dice_sides, weapon.allow_criticals);
        let defense = config.default_defense.pool(config.dice_sides);

        let report = OddsReport::build(&attack, Some(&defense));
        let chance = report.hit_chance.unwrap();
        assert!(chance > 0.0 && chance < 1.0);
        assert!(report.to_table().contains("Hit chance vs"));
    }

    #[test]
    fn test_json_output() {
        let report = OddsReport::build(&PoolShape::new(3, 4).to_pool(), None);
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rows"].as_array().map(Vec::len), Some(4));
        assert!(value.get("hit_chance").is_none());
    }
}
