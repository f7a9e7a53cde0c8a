//! Weapon definitions.
//!
//! Weapons are plain data, normally authored in RON and checked once with
//! [`Weapon::validate`] (or built through [`WeaponBuilder`], which validates
//! on `build`). The resolver only reads them.

use serde::{Deserialize, Serialize};

use crate::damage::DamageType;
use crate::dice::{DicePool, DEFAULT_TARGET};
use crate::error::{CombatError, Result};
use crate::math::{fixed_serde, Fixed};
use crate::status::StatusKind;
use crate::unit::UnitClass;

/// Melee or ranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WeaponKind {
    /// Close combat. Never needs line of sight.
    #[default]
    Melee,
    /// Shooting and throwing. Needs line of sight, suffers long range.
    Ranged,
}

/// Dice an attack rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Number of attack dice.
    pub dice: u32,
    /// Target number.
    #[serde(default = "default_target")]
    pub target: u32,
    /// Added to every die.
    #[serde(default)]
    pub modifier: i32,
}

const fn default_target() -> u32 {
    DEFAULT_TARGET
}

impl AttackProfile {
    /// Create a profile with no value modifier.
    #[must_use]
    pub const fn new(dice: u32, target: u32) -> Self {
        Self {
            dice,
            target,
            modifier: 0,
        }
    }

    /// The pool this profile describes.
    #[must_use]
    pub fn pool(&self, sides: u32, allow_criticals: bool) -> DicePool {
        DicePool::new(self.dice)
            .with_sides(sides)
            .with_target(self.target)
            .with_modifier(self.modifier)
            .with_criticals(allow_criticals)
    }
}

/// Extra damage against one unit class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassBonus {
    /// Class the bonus applies to.
    pub class: UnitClass,
    /// Bonus damage (may be negative).
    pub damage: i32,
}

/// A status effect a hit may inflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecondaryEffect {
    /// Effect to apply.
    pub kind: StatusKind,
    /// Percent chance, 0..=100.
    pub chance: u32,
}

/// Weapon definition.
///
/// # Example RON
///
/// ```ron
/// Weapon(
///     name: "Longbow",
///     kind: Ranged,
///     min_range: 0,
///     max_range: 103079215104,  // Fixed-point for 24.0
///     attack: AttackProfile(dice: 3, target: 4),
///     base_damage: 2,
///     armor_penetration: 1,
///     secondary_effects: [SecondaryEffect(kind: Bleed, chance: 25)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    /// Display name.
    pub name: String,

    /// Melee or ranged.
    #[serde(default)]
    pub kind: WeaponKind,

    /// Minimum range in inches.
    #[serde(with = "fixed_serde", default)]
    pub min_range: Fixed,

    /// Maximum range in inches.
    #[serde(with = "fixed_serde")]
    pub max_range: Fixed,

    /// Attack dice.
    pub attack: AttackProfile,

    /// Damage before successes and armor.
    pub base_damage: u32,

    /// Armor ignored.
    #[serde(default)]
    pub armor_penetration: u32,

    /// Damage type, matched against defender affinities.
    #[serde(default)]
    pub damage_type: DamageType,

    /// Natural maximum faces score a bonus success.
    #[serde(default = "default_true")]
    pub allow_criticals: bool,

    /// The defender never rolls defence dice against this weapon.
    #[serde(default)]
    pub unblockable: bool,

    /// Bonus damage against unit classes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bonus_vs: Vec<ClassBonus>,

    /// Status effects a successful attack may inflict, sampled in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_effects: Vec<SecondaryEffect>,
}

const fn default_true() -> bool {
    true
}

impl Weapon {
    /// Start building a weapon.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> WeaponBuilder {
        WeaponBuilder::new(name)
    }

    /// Parse and validate a weapon from RON text. `origin` labels errors.
    pub fn from_ron(text: &str, origin: &str) -> Result<Self> {
        let weapon: Weapon = ron::from_str(text).map_err(|e| CombatError::DataParse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        weapon.validate()?;
        Ok(weapon)
    }

    /// Parse and validate a list of weapons from RON text.
    pub fn list_from_ron(text: &str, origin: &str) -> Result<Vec<Self>> {
        let weapons: Vec<Weapon> = ron::from_str(text).map_err(|e| CombatError::DataParse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        for weapon in &weapons {
            weapon.validate()?;
        }
        Ok(weapons)
    }

    /// Check the definition is usable.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(CombatError::InvalidWeapon {
                weapon: self.name.clone(),
                reason: reason.to_string(),
            })
        };

        if self.name.trim().is_empty() {
            return fail("name must not be empty");
        }
        if self.min_range < Fixed::ZERO {
            return fail("min_range must not be negative");
        }
        if self.max_range <= Fixed::ZERO {
            return fail("max_range must be positive");
        }
        if self.min_range > self.max_range {
            return fail("min_range exceeds max_range");
        }
        if self.attack.target == 0 {
            return fail("attack target must be at least 1");
        }
        if let Some(effect) = self.secondary_effects.iter().find(|e| e.chance > 100) {
            return Err(CombatError::InvalidWeapon {
                weapon: self.name.clone(),
                reason: format!("{} chance {} exceeds 100", effect.kind, effect.chance),
            });
        }
        Ok(())
    }

    /// Whether this is a melee weapon.
    #[must_use]
    pub fn is_melee(&self) -> bool {
        self.kind == WeaponKind::Melee
    }

    /// Whether `distance` lies within `[min_range, max_range]`.
    #[must_use]
    pub fn in_range(&self, distance: Fixed) -> bool {
        distance >= self.min_range && distance <= self.max_range
    }

    /// Whether a ranged attack at `distance` is beyond half maximum range.
    #[must_use]
    pub fn is_long_range(&self, distance: Fixed) -> bool {
        self.kind == WeaponKind::Ranged && distance > self.max_range / Fixed::from_num(2)
    }

    /// Summed bonus damage against `class`.
    #[must_use]
    pub fn bonus_against(&self, class: UnitClass) -> i32 {
        self.bonus_vs
            .iter()
            .filter(|bonus| bonus.class == class)
            .map(|bonus| bonus.damage)
            .sum()
    }
}

/// Builder for [`Weapon`].
#[derive(Debug, Clone)]
pub struct WeaponBuilder {
    weapon: Weapon,
}

impl WeaponBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            weapon: Weapon {
                name: name.into(),
                kind: WeaponKind::Melee,
                min_range: Fixed::ZERO,
                max_range: Fixed::ONE,
                attack: AttackProfile::new(1, DEFAULT_TARGET),
                base_damage: 1,
                armor_penetration: 0,
                damage_type: DamageType::Physical,
                allow_criticals: true,
                unblockable: false,
                bonus_vs: Vec::new(),
                secondary_effects: Vec::new(),
            },
        }
    }

    /// Melee weapon reaching `max_range` inches.
    #[must_use]
    pub fn melee(mut self, max_range: Fixed) -> Self {
        self.weapon.kind = WeaponKind::Melee;
        self.weapon.max_range = max_range;
        self
    }

    /// Ranged weapon between `min_range` and `max_range` inches.
    #[must_use]
    pub fn ranged(mut self, min_range: Fixed, max_range: Fixed) -> Self {
        self.weapon.kind = WeaponKind::Ranged;
        self.weapon.min_range = min_range;
        self.weapon.max_range = max_range;
        self
    }

    /// Attack dice and target.
    #[must_use]
    pub fn attack(mut self, dice: u32, target: u32) -> Self {
        self.weapon.attack.dice = dice;
        self.weapon.attack.target = target;
        self
    }

    /// Value added to every attack die.
    #[must_use]
    pub fn attack_modifier(mut self, modifier: i32) -> Self {
        self.weapon.attack.modifier = modifier;
        self
    }

    /// Base damage.
    #[must_use]
    pub fn damage(mut self, base_damage: u32) -> Self {
        self.weapon.base_damage = base_damage;
        self
    }

    /// Armor penetration.
    #[must_use]
    pub fn penetration(mut self, armor_penetration: u32) -> Self {
        self.weapon.armor_penetration = armor_penetration;
        self
    }

    /// Damage type.
    #[must_use]
    pub fn damage_type(mut self, damage_type: DamageType) -> Self {
        self.weapon.damage_type = damage_type;
        self
    }

    /// Whether natural maximum faces score criticals.
    #[must_use]
    pub fn criticals(mut self, allow: bool) -> Self {
        self.weapon.allow_criticals = allow;
        self
    }

    /// Defender rolls no defence dice.
    #[must_use]
    pub fn unblockable(mut self) -> Self {
        self.weapon.unblockable = true;
        self
    }

    /// Bonus damage against a unit class.
    #[must_use]
    pub fn bonus_vs(mut self, class: UnitClass, damage: i32) -> Self {
        self.weapon.bonus_vs.push(ClassBonus { class, damage });
        self
    }

    /// Status effect inflicted with `chance` percent on a successful attack.
    #[must_use]
    pub fn secondary(mut self, kind: StatusKind, chance: u32) -> Self {
        self.weapon.secondary_effects.push(SecondaryEffect { kind, chance });
        self
    }

    /// Validate and return the weapon.
    pub fn build(self) -> Result<Weapon> {
        self.weapon.validate()?;
        Ok(self.weapon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bow() -> Weapon {
        Weapon::builder("Bow")
            .ranged(Fixed::ZERO, Fixed::from_num(24))
            .attack(3, 4)
            .damage(2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let sword = Weapon::builder("Sword").build().unwrap();
        assert!(sword.is_melee());
        assert_eq!(sword.max_range, Fixed::ONE);
        assert!(sword.allow_criticals);
        assert!(sword.in_range(Fixed::ONE));
        assert!(!sword.in_range(Fixed::from_num(2)));
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        let err = Weapon::builder("Sling")
            .ranged(Fixed::from_num(10), Fixed::from_num(5))
            .build()
            .unwrap_err();
        assert!(matches!(err, CombatError::InvalidWeapon { .. }));

        assert!(Weapon::builder(" ").build().is_err());
        assert!(Weapon::builder("Stick").melee(Fixed::ZERO).build().is_err());
        assert!(Weapon::builder("Dart")
            .secondary(StatusKind::Poisoned, 101)
            .build()
            .is_err());
    }

    #[test]
    fn test_long_range() {
        let bow = bow();
        assert!(!bow.is_long_range(Fixed::from_num(12)));
        assert!(bow.is_long_range(Fixed::from_num(13)));

        let spear = Weapon::builder("Spear").melee(Fixed::from_num(2)).build().unwrap();
        assert!(!spear.is_long_range(Fixed::from_num(2)));
    }

    #[test]
    fn test_bonus_against() {
        let lance = Weapon::builder("Lance")
            .bonus_vs(UnitClass::Cavalry, 2)
            .bonus_vs(UnitClass::Cavalry, 1)
            .bonus_vs(UnitClass::Monster, -1)
            .build()
            .unwrap();
        assert_eq!(lance.bonus_against(UnitClass::Cavalry), 3);
        assert_eq!(lance.bonus_against(UnitClass::Monster), -1);
        assert_eq!(lance.bonus_against(UnitClass::Infantry), 0);
    }

    #[test]
    fn test_from_ron() {
        let text = r#"Weapon(
            name: "Longbow",
            kind: Ranged,
            max_range: 103079215104,
            attack: AttackProfile(dice: 3),
            base_damage: 2,
            secondary_effects: [SecondaryEffect(kind: Bleed, chance: 25)],
        )"#;
        let weapon = Weapon::from_ron(text, "inline").unwrap();
        assert_eq!(weapon.max_range, Fixed::from_num(24));
        assert_eq!(weapon.attack.target, DEFAULT_TARGET);
        assert!(weapon.allow_criticals);
        assert_eq!(weapon.secondary_effects.len(), 1);
    }

    #[test]
    fn test_from_ron_errors() {
        let err = Weapon::from_ron("Weapon(", "broken.ron").unwrap_err();
        assert!(matches!(err, CombatError::DataParse { ref path, .. } if path == "broken.ron"));

        let invalid = r#"Weapon(name: "Nothing", max_range: 0, attack: AttackProfile(dice: 1), base_damage: 1)"#;
        assert!(matches!(
            Weapon::from_ron(invalid, "inline"),
            Err(CombatError::InvalidWeapon { .. })
        ));
    }

    #[test]
    fn test_attack_pool() {
        let pool = bow().attack.pool(6, true);
        assert_eq!(pool.dice_count(), 3);
        assert_eq!(pool.target_number(), 4);
        assert!(pool.allow_criticals());
    }
}
