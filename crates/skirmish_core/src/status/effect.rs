//! Status effect instances and their lifecycle hooks.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::damage::DamageType;
use crate::error::CombatError;

/// Sentinel duration for effects that never expire on their own.
pub const INDEFINITE: i32 = -1;

/// The fixed set of status effect types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Periodic damage at turn end, per stack.
    Bleed,
    /// Movement zeroed when applied.
    Rooted,
    /// Morale failure: dice penalty until rallied.
    Shaken,
    /// Temporary defence dice.
    Guard,
    /// Cannot act.
    Stunned,
    /// Periodic damage at turn start, per stack.
    Poisoned,
}

impl StatusKind {
    /// All status kinds.
    pub const ALL: [Self; 6] = [
        Self::Bleed,
        Self::Rooted,
        Self::Shaken,
        Self::Guard,
        Self::Stunned,
        Self::Poisoned,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bleed => "Bleed",
            Self::Rooted => "Rooted",
            Self::Shaken => "Shaken",
            Self::Guard => "Guard",
            Self::Stunned => "Stunned",
            Self::Poisoned => "Poisoned",
        }
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatusKind {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CombatError::UnknownStatusEffect(s.to_string()))
    }
}

/// Variant-specific parameters of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectVariant {
    /// Damage per stack at turn end.
    Bleed {
        /// Damage dealt by each stack.
        per_stack_damage: u32,
    },
    /// Movement zeroed on application.
    Rooted,
    /// Dice removed from every pool the unit builds.
    Shaken {
        /// Dice removed (stored as a positive count).
        dice_penalty: u32,
    },
    /// Extra defence dice.
    Guard {
        /// Dice added to defence pools.
        defense_dice: u32,
    },
    /// Unit cannot act.
    Stunned,
    /// Damage per stack at turn start.
    Poisoned {
        /// Damage dealt by each stack.
        per_stack_damage: u32,
    },
}

impl EffectVariant {
    /// The kind tag of this variant.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::Bleed { .. } => StatusKind::Bleed,
            Self::Rooted => StatusKind::Rooted,
            Self::Shaken { .. } => StatusKind::Shaken,
            Self::Guard { .. } => StatusKind::Guard,
            Self::Stunned => StatusKind::Stunned,
            Self::Poisoned { .. } => StatusKind::Poisoned,
        }
    }
}

/// Operations a status effect may perform on the unit that carries it.
///
/// Effects never write unit fields directly; they go through these calls.
pub trait EffectHost {
    /// Display name, for logs.
    fn label(&self) -> &str;

    /// Deal damage through the unit's own damage path. Returns the amount
    /// actually taken.
    fn apply_damage(&mut self, amount: u32, damage_type: DamageType) -> u32;

    /// Set remaining movement for this turn to zero.
    fn clear_movement(&mut self);

    /// Block or restore the unit's ability to act.
    fn set_action_blocked(&mut self, blocked: bool);
}

/// Something that happened to a unit's status effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEvent {
    /// A new effect instance was added.
    Applied(StatusKind),
    /// An existing effect gained a stack.
    Stacked {
        /// Effect type.
        kind: StatusKind,
        /// Stacks after the increment.
        stacks: u32,
    },
    /// An existing effect's duration was reset.
    Refreshed(StatusKind),
    /// A periodic effect dealt damage.
    Ticked {
        /// Effect type.
        kind: StatusKind,
        /// Damage the unit actually took.
        damage: u32,
    },
    /// Duration ran out; the effect was removed.
    Expired(StatusKind),
    /// The effect was removed explicitly.
    Removed(StatusKind),
}

/// One active status effect on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEffect {
    variant: EffectVariant,
    remaining_duration: i32,
    max_duration: i32,
    stackable: bool,
    current_stacks: u32,
    max_stacks: u32,
    source_label: String,
}

impl StatusEffect {
    fn new(
        variant: EffectVariant,
        duration: i32,
        max_stacks: u32,
        source_label: impl Into<String>,
    ) -> Self {
        let duration = if duration < 0 { INDEFINITE } else { duration.max(1) };
        let max_stacks = max_stacks.max(1);
        Self {
            variant,
            remaining_duration: duration,
            max_duration: duration,
            stackable: max_stacks > 1,
            current_stacks: 1,
            max_stacks,
            source_label: source_label.into(),
        }
    }

    /// Bleeding: `per_stack_damage × stacks` at every turn end.
    #[must_use]
    pub fn bleed(per_stack_damage: u32, duration: i32, max_stacks: u32, source: impl Into<String>) -> Self {
        Self::new(EffectVariant::Bleed { per_stack_damage }, duration, max_stacks, source)
    }

    /// Poison: `per_stack_damage × stacks` at every turn start.
    #[must_use]
    pub fn poisoned(per_stack_damage: u32, duration: i32, max_stacks: u32, source: impl Into<String>) -> Self {
        Self::new(EffectVariant::Poisoned { per_stack_damage }, duration, max_stacks, source)
    }

    /// Rooted for `duration` turns.
    #[must_use]
    pub fn rooted(duration: i32, source: impl Into<String>) -> Self {
        Self::new(EffectVariant::Rooted, duration, 1, source)
    }

    /// Shaken until rallied.
    #[must_use]
    pub fn shaken(dice_penalty: u32, source: impl Into<String>) -> Self {
        Self::new(EffectVariant::Shaken { dice_penalty }, INDEFINITE, 1, source)
    }

    /// Guard granting `defense_dice` for `duration` turns.
    #[must_use]
    pub fn guard(defense_dice: u32, duration: i32, source: impl Into<String>) -> Self {
        Self::new(EffectVariant::Guard { defense_dice }, duration, 1, source)
    }

    /// Stunned for `duration` turns.
    #[must_use]
    pub fn stunned(duration: i32, source: impl Into<String>) -> Self {
        Self::new(EffectVariant::Stunned, duration, 1, source)
    }

    /// Effect type.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        self.variant.kind()
    }

    /// Variant parameters.
    #[must_use]
    pub const fn variant(&self) -> &EffectVariant {
        &self.variant
    }

    /// Turns left, or [`INDEFINITE`].
    #[must_use]
    pub const fn remaining_duration(&self) -> i32 {
        self.remaining_duration
    }

    /// Duration restored by a refresh.
    #[must_use]
    pub const fn max_duration(&self) -> i32 {
        self.max_duration
    }

    /// Whether reapplication adds stacks.
    #[must_use]
    pub const fn is_stackable(&self) -> bool {
        self.stackable
    }

    /// Current stack count.
    #[must_use]
    pub const fn current_stacks(&self) -> u32 {
        self.current_stacks
    }

    /// Stack cap.
    #[must_use]
    pub const fn max_stacks(&self) -> u32 {
        self.max_stacks
    }

    /// What applied this effect.
    #[must_use]
    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// Whether the effect never expires on its own.
    #[must_use]
    pub const fn is_indefinite(&self) -> bool {
        self.remaining_duration == INDEFINITE
    }

    /// Whether the turn hooks still run for this effect.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.remaining_duration != 0
    }

    /// Dice this effect removes from the owner's pools.
    #[must_use]
    pub const fn dice_penalty(&self) -> u32 {
        match self.variant {
            EffectVariant::Shaken { dice_penalty } => dice_penalty,
            _ => 0,
        }
    }

    /// Dice this effect adds to the owner's defence pools.
    #[must_use]
    pub const fn defense_dice(&self) -> u32 {
        match self.variant {
            EffectVariant::Guard { defense_dice } => defense_dice,
            _ => 0,
        }
    }

    pub(crate) fn add_stack(&mut self) -> bool {
        if self.stackable && self.current_stacks < self.max_stacks {
            self.current_stacks += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn refresh(&mut self) {
        self.remaining_duration = self.max_duration;
    }

    /// Hook: the effect was just added to `host`.
    pub fn on_applied(&self, host: &mut dyn EffectHost) {
        match self.variant {
            EffectVariant::Rooted => host.clear_movement(),
            EffectVariant::Stunned => host.set_action_blocked(true),
            _ => {}
        }
    }

    /// Hook: the owner's turn begins.
    pub fn on_turn_start(&self, host: &mut dyn EffectHost) -> Option<StatusEvent> {
        if !self.is_active() {
            return None;
        }
        match self.variant {
            EffectVariant::Poisoned { per_stack_damage } => {
                let damage = host.apply_damage(per_stack_damage.saturating_mul(self.current_stacks), DamageType::Poison);
                Some(StatusEvent::Ticked {
                    kind: StatusKind::Poisoned,
                    damage,
                })
            }
            // Movement is restored before hooks run, so a rooted unit stays put.
            EffectVariant::Rooted => {
                host.clear_movement();
                None
            }
            _ => None,
        }
    }

    /// Hook: the owner's turn ends. Ticks end-of-turn damage, then counts the
    /// duration down (indefinite effects never count down).
    pub fn on_turn_end(&mut self, host: &mut dyn EffectHost) -> Option<StatusEvent> {
        if !self.is_active() {
            return None;
        }
        let event = match self.variant {
            EffectVariant::Bleed { per_stack_damage } => {
                let damage = host.apply_damage(per_stack_damage.saturating_mul(self.current_stacks), DamageType::Physical);
                Some(StatusEvent::Ticked {
                    kind: StatusKind::Bleed,
                    damage,
                })
            }
            _ => None,
        };
        if !self.is_indefinite() {
            self.remaining_duration -= 1;
        }
        event
    }

    /// Hook: the effect is leaving `host`.
    pub fn on_removed(&self, host: &mut dyn EffectHost) {
        if self.variant == EffectVariant::Stunned {
            host.set_action_blocked(false);
        }
    }
}
