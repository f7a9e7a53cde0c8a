//! Damage calculation from roll outcomes.
//!
//! Formula:
//! ```text
//! Base Damage       = weapon damage after the defender's affinity
//!                     (immune 0, resistant ×0.5, vulnerable ×1.5, rounded)
//! Net Successes     = max(0, attack successes - defence successes)
//! Raw Damage        = Base + Net Successes + Result Modifiers + Type Bonus
//! Effective Armor   = max(0, Armor - Armor Penetration)
//! Final Damage      = max(0, Raw Damage - Effective Armor)
//! Minimum Damage    = configured floor, only when the attack hit
//! ```
//!
//! Everything here is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::math::{ratio, scale_rounded};

/// Minimum damage a successful hit deals unless configured otherwise.
pub const DEFAULT_MIN_DAMAGE: u32 = 1;

/// Damage type carried by a weapon or a periodic effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum DamageType {
    /// Blades, arrows, blunt force.
    #[default]
    Physical,
    /// Flame and burning.
    Fire,
    /// Cold and ice.
    Frost,
    /// Venom and toxins.
    Poison,
    /// Magical energy.
    Arcane,
}

impl DamageType {
    /// All damage types.
    pub const ALL: [Self; 5] = [
        Self::Physical,
        Self::Fire,
        Self::Frost,
        Self::Poison,
        Self::Arcane,
    ];
}

/// How a defender reacts to a damage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DamageAffinity {
    /// Full damage.
    #[default]
    Normal,
    /// Half base damage, rounded half away from zero.
    Resistant,
    /// One and a half times base damage, rounded half away from zero.
    Vulnerable,
    /// No damage at all.
    Immune,
}

impl DamageAffinity {
    /// Apply this affinity to a base damage value.
    #[must_use]
    pub fn apply(self, base_damage: u32) -> u32 {
        match self {
            DamageAffinity::Normal => base_damage,
            DamageAffinity::Resistant => scale_rounded(base_damage, ratio(1, 2)),
            DamageAffinity::Vulnerable => scale_rounded(base_damage, ratio(3, 2)),
            DamageAffinity::Immune => 0,
        }
    }
}

/// Everything the calculator needs for one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageInput {
    /// Weapon base damage, before affinity.
    pub base_damage: u32,
    /// Attacker successes.
    pub attack_successes: u32,
    /// Defender successes.
    pub defense_successes: u32,
    /// Defender armor.
    pub armor: u32,
    /// Weapon armor penetration.
    pub armor_penetration: u32,
    /// Summed post-roll result modifiers.
    pub result_modifier: i32,
    /// Bonus damage against the defender's unit class.
    pub type_bonus: i32,
    /// Defender affinity for the damage type.
    pub affinity: DamageAffinity,
}

/// Step-by-step record of a damage calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DamageBreakdown {
    /// Base damage after affinity.
    pub base_damage: u32,
    /// Attack successes minus defence successes, floored at zero.
    pub net_successes: u32,
    /// Damage before armor.
    pub raw_damage: i64,
    /// Armor left after penetration.
    pub effective_armor: u32,
    /// Damage to apply.
    pub final_damage: u32,
    /// The minimum-damage floor raised the result.
    pub minimum_applied: bool,
    /// The defender is immune to the damage type.
    pub immune: bool,
}

/// Pure damage calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageCalculator {
    minimum_damage: u32,
}

impl Default for DamageCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DAMAGE)
    }
}

impl DamageCalculator {
    /// Create a calculator with the given minimum damage for hits.
    #[must_use]
    pub const fn new(minimum_damage: u32) -> Self {
        Self { minimum_damage }
    }

    /// Minimum damage dealt by a hit.
    #[must_use]
    pub const fn minimum_damage(&self) -> u32 {
        self.minimum_damage
    }

    /// Calculate final damage.
    #[must_use]
    pub fn calculate(&self, input: &DamageInput) -> DamageBreakdown {
        let net_successes = net_successes(input.attack_successes, input.defense_successes);

        if input.affinity == DamageAffinity::Immune {
            return DamageBreakdown {
                net_successes,
                immune: true,
                ..DamageBreakdown::default()
            };
        }

        let base_damage = input.affinity.apply(input.base_damage);
        let raw_damage = i64::from(base_damage)
            + i64::from(net_successes)
            + i64::from(input.result_modifier)
            + i64::from(input.type_bonus);
        let effective_armor = effective_armor(input.armor, input.armor_penetration);
        let unclamped = (raw_damage - i64::from(effective_armor)).clamp(0, i64::from(u32::MAX)) as u32;

        let hit = input.attack_successes > input.defense_successes;
        let (final_damage, minimum_applied) = if hit && unclamped < self.minimum_damage {
            (self.minimum_damage, true)
        } else {
            (unclamped, false)
        };

        DamageBreakdown {
            base_damage,
            net_successes,
            raw_damage,
            effective_armor,
            final_damage,
            minimum_applied,
            immune: false,
        }
    }
}

/// Attack successes minus defence successes, floored at zero.
#[must_use]
pub const fn net_successes(attack_successes: u32, defense_successes: u32) -> u32 {
    attack_successes.saturating_sub(defense_successes)
}

/// Armor left after penetration, floored at zero.
#[must_use]
pub const fn effective_armor(armor: u32, armor_penetration: u32) -> u32 {
    armor.saturating_sub(armor_penetration)
}

/// Shorthand for the common case: no penetration, no type bonus, normal
/// affinity, default minimum damage.
#[must_use]
pub fn calculate_damage(
    base_damage: u32,
    attack_successes: u32,
    defense_successes: u32,
    armor: u32,
    result_modifier: i32,
) -> u32 {
    DamageCalculator::default()
        .calculate(&DamageInput {
            base_damage,
            attack_successes,
            defense_successes,
            armor,
            result_modifier,
            ..DamageInput::default()
        })
        .final_damage
}
