//! Morale checks and rallying.
//!
//! A unit that loses a large share of its maximum health in one blow tests
//! morale: roll the scheme (2d6 by default), summed, against leadership.
//! Low rolls are good: the check passes when `roll <= leadership`. A failed
//! check leaves the unit Shaken until a later rally passes the same test.
//!
//! Calling these after damage is the caller's job; the resolver never does.

use serde::{Deserialize, Serialize};

use crate::dice::DiceSource;
use crate::math::{fixed_serde, ratio, Fixed};
use crate::status::{StatusKind, StatusTuning};
use crate::unit::Combatant;

/// Source label carried by Shaken effects applied here.
pub const MORALE_SOURCE: &str = "morale";

/// Dice rolled for a morale test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoraleScheme {
    /// Dice summed.
    pub dice: u32,
    /// Faces per die.
    pub sides: u32,
}

impl Default for MoraleScheme {
    fn default() -> Self {
        Self { dice: 2, sides: 6 }
    }
}

/// Morale rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoraleConfig {
    /// Fraction of max health lost in one event that forces a test.
    #[serde(with = "fixed_serde")]
    pub threshold: Fixed,
    /// Dice rolled.
    pub scheme: MoraleScheme,
    /// Leadership for units that carry none of their own.
    pub base_leadership: u32,
    /// Leadership lost while Shaken.
    pub shaken_penalty: u32,
}

impl Default for MoraleConfig {
    fn default() -> Self {
        Self {
            threshold: ratio(1, 4),
            scheme: MoraleScheme::default(),
            base_leadership: 7,
            shaken_penalty: 2,
        }
    }
}

impl MoraleConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.threshold <= Fixed::ZERO || self.threshold > Fixed::ONE {
            return Err("morale threshold must lie in (0, 1]".to_string());
        }
        if self.scheme.dice == 0 || self.scheme.sides == 0 {
            return Err("morale scheme needs at least one die with one face".to_string());
        }
        Ok(())
    }
}

/// Whether losing `damage_taken` out of `max_health` forces a test.
#[must_use]
pub fn check_required(damage_taken: u32, max_health: u32, threshold: Fixed) -> bool {
    if max_health == 0 || damage_taken == 0 {
        return false;
    }
    ratio(i64::from(damage_taken), i64::from(max_health)) >= threshold
}

/// One rolled morale test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoraleCheck {
    /// Individual faces.
    pub faces: Vec<u32>,
    /// Sum of the faces.
    pub roll: u32,
    /// Leadership tested against.
    pub leadership: u32,
    /// `roll <= leadership`.
    pub passed: bool,
}

/// Result of [`MoraleSystem::after_damage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoraleOutcome {
    /// Damage too light, or the unit is dead.
    NotRequired,
    /// Test passed.
    Passed(MoraleCheck),
    /// Test failed; the unit is now Shaken.
    Failed(MoraleCheck),
}

/// Result of [`MoraleSystem::rally`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyOutcome {
    /// Nothing to rally from.
    NotShaken,
    /// Dead units do not rally.
    Ineligible,
    /// Test passed; Shaken removed.
    Rallied(MoraleCheck),
    /// Test failed; still Shaken.
    Failed(MoraleCheck),
}

/// Morale tests against a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoraleSystem {
    config: MoraleConfig,
    tuning: StatusTuning,
}

impl MoraleSystem {
    /// Create a morale system. `tuning` shapes the Shaken effect applied.
    #[must_use]
    pub const fn new(config: MoraleConfig, tuning: StatusTuning) -> Self {
        Self { config, tuning }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MoraleConfig {
        &self.config
    }

    /// Leadership the unit tests against right now.
    #[must_use]
    pub fn leadership_for(&self, unit: &dyn Combatant) -> u32 {
        let base = unit.leadership().unwrap_or(self.config.base_leadership);
        if unit.status().has(StatusKind::Shaken) {
            base.saturating_sub(self.config.shaken_penalty)
        } else {
            base
        }
    }

    /// Roll one test for `unit` without applying anything.
    pub fn roll_check(&self, unit: &dyn Combatant, dice: &mut dyn DiceSource) -> MoraleCheck {
        let faces: Vec<u32> = (0..self.config.scheme.dice)
            .map(|_| dice.roll(self.config.scheme.sides))
            .collect();
        let roll = faces.iter().sum();
        let leadership = self.leadership_for(unit);
        MoraleCheck {
            faces,
            roll,
            leadership,
            passed: roll <= leadership,
        }
    }

    /// Test morale after one damage event. A failure applies Shaken.
    pub fn after_damage(
        &self,
        unit: &mut dyn Combatant,
        damage_taken: u32,
        dice: &mut dyn DiceSource,
    ) -> MoraleOutcome {
        if !unit.is_alive() || !check_required(damage_taken, unit.max_health(), self.config.threshold) {
            return MoraleOutcome::NotRequired;
        }

        let check = self.roll_check(unit, dice);
        tracing::debug!(
            unit = unit.name(),
            roll = check.roll,
            leadership = check.leadership,
            passed = check.passed,
            "Morale check"
        );

        if check.passed {
            MoraleOutcome::Passed(check)
        } else {
            unit.apply_status(self.tuning.effect(StatusKind::Shaken, MORALE_SOURCE));
            MoraleOutcome::Failed(check)
        }
    }

    /// Try to recover from Shaken. A pass removes it.
    pub fn rally(&self, unit: &mut dyn Combatant, dice: &mut dyn DiceSource) -> RallyOutcome {
        if !unit.is_alive() {
            return RallyOutcome::Ineligible;
        }
        if !unit.status().has(StatusKind::Shaken) {
            return RallyOutcome::NotShaken;
        }

        let check = self.roll_check(unit, dice);
        tracing::debug!(
            unit = unit.name(),
            roll = check.roll,
            leadership = check.leadership,
            passed = check.passed,
            "Rally check"
        );

        if check.passed {
            unit.remove_status(StatusKind::Shaken);
            RallyOutcome::Rallied(check)
        } else {
            RallyOutcome::Failed(check)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::DamageType;
    use crate::dice::ScriptedDice;
    use crate::status::EffectHost;
    use crate::unit::{Unit, UnitId};

    fn system() -> MoraleSystem {
        MoraleSystem::default()
    }

    fn unit(leadership: u32) -> Unit {
        Unit::new(UnitId::new(1), "Spearmen", 8).with_leadership(leadership)
    }

    #[test]
    fn test_threshold() {
        let quarter = ratio(1, 4);
        assert!(check_required(2, 8, quarter));
        assert!(!check_required(1, 8, quarter));
        assert!(check_required(5, 8, quarter));
        assert!(!check_required(3, 0, quarter));
        assert!(!check_required(0, 8, quarter));
    }

    #[test]
    fn test_threshold_with_huge_health_pool() {
        let quarter = ratio(1, 4);
        assert!(!check_required(1, u32::MAX, quarter));
        assert!(check_required(u32::MAX, u32::MAX, quarter));
        assert!(check_required(u32::MAX / 2, u32::MAX, quarter));
    }

    #[test]
    fn test_roll_equal_to_leadership_passes() {
        let mut target = unit(7);
        let mut dice = ScriptedDice::new(vec![3, 4]);
        let outcome = system().after_damage(&mut target, 2, &mut dice);
        assert!(matches!(outcome, MoraleOutcome::Passed(ref c) if c.roll == 7 && c.leadership == 7));
        assert!(!target.status().has(StatusKind::Shaken));
    }

    #[test]
    fn test_roll_above_leadership_fails() {
        let mut target = unit(7);
        let mut dice = ScriptedDice::new(vec![4, 4]);
        let outcome = system().after_damage(&mut target, 2, &mut dice);
        assert!(matches!(outcome, MoraleOutcome::Failed(ref c) if c.roll == 8));
        assert!(target.status().has(StatusKind::Shaken));
        assert_eq!(target.status().dice_penalty(), 1);
    }

    #[test]
    fn test_light_damage_skips_check() {
        let mut target = unit(7);
        let mut dice = ScriptedDice::new(vec![6, 6]);
        assert_eq!(system().after_damage(&mut target, 1, &mut dice), MoraleOutcome::NotRequired);
        assert_eq!(dice.drawn(), 0);
    }

    #[test]
    fn test_dead_units_do_not_test() {
        let mut target = unit(7);
        target.apply_damage(8, DamageType::Physical);
        let mut dice = ScriptedDice::new(vec![6, 6]);
        assert_eq!(system().after_damage(&mut target, 8, &mut dice), MoraleOutcome::NotRequired);
        assert_eq!(system().rally(&mut target, &mut dice), RallyOutcome::Ineligible);
    }

    #[test]
    fn test_shaken_lowers_leadership_and_rally() {
        let morale = system();
        let mut target = unit(7);
        let mut dice = ScriptedDice::new(vec![6, 6]);
        morale.after_damage(&mut target, 4, &mut dice);
        assert_eq!(morale.leadership_for(&target), 5);

        // 3 + 3 = 6 > 5: still shaken
        let mut dice = ScriptedDice::new(vec![3, 3]);
        assert!(matches!(morale.rally(&mut target, &mut dice), RallyOutcome::Failed(_)));
        assert!(target.status().has(StatusKind::Shaken));

        let mut dice = ScriptedDice::new(vec![2, 3]);
        assert!(matches!(morale.rally(&mut target, &mut dice), RallyOutcome::Rallied(_)));
        assert!(!target.status().has(StatusKind::Shaken));
        assert_eq!(morale.leadership_for(&target), 7);

        assert_eq!(morale.rally(&mut target, &mut dice), RallyOutcome::NotShaken);
    }

    #[test]
    fn test_base_leadership_used_when_unit_has_none() {
        let plain = Unit::new(UnitId::new(2), "Levy", 4);
        assert_eq!(system().leadership_for(&plain), 7);
    }
}
