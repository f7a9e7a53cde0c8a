//! Combat configuration.
//!
//! All tunable numbers of the rules live here and are loaded from RON.
//! Missing fields fall back to the defaults below.
//!
//! # Example RON
//!
//! ```ron
//! CombatConfig(
//!     minimum_damage: 1,
//!     default_defense: DefenseProfile(dice: 4, target: 4),
//!     flanking_threshold: -2147483648,  // Fixed-point for -0.5
//!     morale: MoraleConfig(base_leadership: 8),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::battlefield::Cover;
use crate::damage::DEFAULT_MIN_DAMAGE;
use crate::dice::DEFAULT_SIDES;
use crate::error::{CombatError, Result};
use crate::math::{fixed_serde, ratio, Fixed};
use crate::morale::MoraleConfig;
use crate::status::StatusTuning;
use crate::unit::DefenseProfile;

/// Rules configuration handed to the resolver at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Faces on combat dice.
    pub dice_sides: u32,

    /// Damage a hit always deals at least.
    pub minimum_damage: u32,

    /// Defence dice for units without their own profile.
    pub default_defense: DefenseProfile,

    /// Flanking applies when the dot product of the defender's facing and
    /// the normalized defender-minus-attacker direction is below this.
    #[serde(with = "fixed_serde")]
    pub flanking_threshold: Fixed,

    /// Attack dice gained by flanking.
    pub flank_bonus_dice: i32,

    /// Die value change for ranged attacks beyond half range.
    pub long_range_value_penalty: i32,

    /// Defence dice granted by light cover.
    pub light_cover_dice: i32,

    /// Defence dice granted by heavy cover.
    pub heavy_cover_dice: i32,

    /// Morale rules.
    pub morale: MoraleConfig,

    /// Defaults for effects created by kind.
    pub status: StatusTuning,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            dice_sides: DEFAULT_SIDES,
            minimum_damage: DEFAULT_MIN_DAMAGE,
            default_defense: DefenseProfile::default(),
            flanking_threshold: ratio(-1, 2),
            flank_bonus_dice: 1,
            long_range_value_penalty: -1,
            light_cover_dice: 1,
            heavy_cover_dice: 2,
            morale: MoraleConfig::default(),
            status: StatusTuning::default(),
        }
    }
}

impl CombatConfig {
    /// Parse and validate a configuration from RON text.
    pub fn from_ron(text: &str, origin: &str) -> Result<Self> {
        let config: CombatConfig = ron::from_str(text).map_err(|e| CombatError::DataParse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the rules cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.dice_sides < 2 {
            return Err(CombatError::InvalidConfig(format!(
                "dice_sides must be at least 2, got {}",
                self.dice_sides
            )));
        }
        if self.default_defense.target == 0 || self.default_defense.target > self.dice_sides {
            return Err(CombatError::InvalidConfig(format!(
                "default_defense target {} outside 1..={}",
                self.default_defense.target, self.dice_sides
            )));
        }
        if self.flanking_threshold < -Fixed::ONE || self.flanking_threshold > Fixed::ONE {
            return Err(CombatError::InvalidConfig(
                "flanking_threshold must lie in [-1, 1]".to_string(),
            ));
        }
        self.morale.validate().map_err(CombatError::InvalidConfig)?;
        self.status.validate().map_err(CombatError::InvalidConfig)?;
        Ok(())
    }

    /// Defence dice granted by a cover level.
    #[must_use]
    pub const fn cover_dice(&self, cover: Cover) -> i32 {
        match cover {
            Cover::None => 0,
            Cover::Light => self.light_cover_dice,
            Cover::Heavy => self.heavy_cover_dice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CombatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dice_sides, 6);
        assert_eq!(config.default_defense, DefenseProfile::new(4, 4));
        assert_eq!(config.flanking_threshold, Fixed::from_num(-0.5));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = CombatConfig::from_ron("CombatConfig(minimum_damage: 2)", "inline").unwrap();
        assert_eq!(config.minimum_damage, 2);
        assert_eq!(config.heavy_cover_dice, 2);
        assert_eq!(config.morale, MoraleConfig::default());
    }

    #[test]
    fn test_fixed_fields_are_raw_bits() {
        let text = "CombatConfig(flanking_threshold: -2147483648)";
        let config = CombatConfig::from_ron(text, "inline").unwrap();
        assert_eq!(config.flanking_threshold, Fixed::from_num(-0.5));
    }

    #[test]
    fn test_validation_failures() {
        let bad_sides = CombatConfig {
            dice_sides: 1,
            ..CombatConfig::default()
        };
        assert!(matches!(bad_sides.validate(), Err(CombatError::InvalidConfig(_))));

        let bad_defense = CombatConfig {
            default_defense: DefenseProfile::new(4, 7),
            ..CombatConfig::default()
        };
        assert!(bad_defense.validate().is_err());

        let parse = CombatConfig::from_ron("CombatConfig(", "combat.ron");
        assert!(matches!(parse, Err(CombatError::DataParse { .. })));
    }

    #[test]
    fn test_cover_dice() {
        let config = CombatConfig::default();
        assert_eq!(config.cover_dice(Cover::None), 0);
        assert_eq!(config.cover_dice(Cover::Light), 1);
        assert_eq!(config.cover_dice(Cover::Heavy), 2);
    }
}
