//! Status effects: timed, stacking conditions owned by a unit.
//!
//! Each instance moves Active → Expired → removed. Turn-start and turn-end
//! hooks run while the remaining duration is non-zero; an effect whose
//! duration reaches zero during turn end is removed right after.
//! Indefinite effects (Shaken) only leave through explicit removal.

mod effect;
mod manager;

pub use effect::{EffectHost, EffectVariant, StatusEffect, StatusEvent, StatusKind, INDEFINITE};
pub use manager::{ApplyOutcome, StatusEffects};

use serde::{Deserialize, Serialize};

/// Default numbers used when the rules create an effect by kind
/// (weapon secondary effects, morale failures).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTuning {
    /// Bleed damage per stack.
    pub bleed_damage_per_stack: u32,
    /// Bleed duration in turns.
    pub bleed_duration: i32,
    /// Bleed stack cap.
    pub bleed_max_stacks: u32,
    /// Poison damage per stack.
    pub poison_damage_per_stack: u32,
    /// Poison duration in turns.
    pub poison_duration: i32,
    /// Poison stack cap.
    pub poison_max_stacks: u32,
    /// Rooted duration in turns.
    pub rooted_duration: i32,
    /// Dice removed by Shaken.
    pub shaken_dice_penalty: u32,
    /// Defence dice granted by Guard.
    pub guard_defense_dice: u32,
    /// Guard duration in turns.
    pub guard_duration: i32,
    /// Stunned duration in turns.
    pub stunned_duration: i32,
}

impl Default for StatusTuning {
    fn default() -> Self {
        Self {
            bleed_damage_per_stack: 1,
            bleed_duration: 3,
            bleed_max_stacks: 5,
            poison_damage_per_stack: 1,
            poison_duration: 3,
            poison_max_stacks: 3,
            rooted_duration: 1,
            shaken_dice_penalty: 1,
            guard_defense_dice: 1,
            guard_duration: 1,
            stunned_duration: 1,
        }
    }
}

impl StatusTuning {
    /// Build an effect of `kind` with these defaults.
    #[must_use]
    pub fn effect(&self, kind: StatusKind, source: impl Into<String>) -> StatusEffect {
        match kind {
            StatusKind::Bleed => StatusEffect::bleed(
                self.bleed_damage_per_stack,
                self.bleed_duration,
                self.bleed_max_stacks,
                source,
            ),
            StatusKind::Poisoned => StatusEffect::poisoned(
                self.poison_damage_per_stack,
                self.poison_duration,
                self.poison_max_stacks,
                source,
            ),
            StatusKind::Rooted => StatusEffect::rooted(self.rooted_duration, source),
            StatusKind::Shaken => StatusEffect::shaken(self.shaken_dice_penalty, source),
            StatusKind::Guard => {
                StatusEffect::guard(self.guard_defense_dice, self.guard_duration, source)
            }
            StatusKind::Stunned => StatusEffect::stunned(self.stunned_duration, source),
        }
    }

    /// Check for values that would make effects meaningless.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let timed = [
            ("bleed_duration", self.bleed_duration),
            ("poison_duration", self.poison_duration),
            ("rooted_duration", self.rooted_duration),
            ("guard_duration", self.guard_duration),
            ("stunned_duration", self.stunned_duration),
        ];
        for (name, duration) in timed {
            if duration == 0 {
                return Err(format!("{name} must be positive or -1 (indefinite)"));
            }
        }
        if self.bleed_max_stacks == 0 || self.poison_max_stacks == 0 {
            return Err("stack caps must be at least 1".to_string());
        }
        Ok(())
    }
}
