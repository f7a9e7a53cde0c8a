//! # Skirmish Core
//!
//! Deterministic rules core for turn-based tactical skirmishes.
//!
//! This crate turns unit stats, weapons and situational modifiers into dice
//! rolls and damage, and runs the two state machines those rolls feed:
//! per-unit status effects and morale.
//!
//! It contains **only** rules logic:
//! - No rendering, input or turn sequencing
//! - No IO (RON text is parsed, never read from disk here)
//! - No system randomness (every draw goes through an injected [`dice::DiceSource`])
//! - No floating-point simulation state (fixed-point geometry and ratios)
//!
//! ## Crate Structure
//!
//! - [`dice`] - Dice pools, the roller, random sources and exact odds
//! - [`modifiers`] - Additive modifier stacks keyed by source
//! - [`damage`] - Damage calculation
//! - [`status`] - Status effects and their per-unit manager
//! - [`morale`] - Morale checks and rallying
//! - [`resolver`] - Attack resolution
//! - [`result`] - Combat results and observers
//! - [`unit`], [`weapon`], [`battlefield`] - Collaborator contracts
//! - [`config`] - Tunable rules numbers
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod battlefield;
pub mod config;
pub mod damage;
pub mod dice;
pub mod error;
pub mod math;
pub mod modifiers;
pub mod morale;
pub mod resolver;
pub mod result;
pub mod status;
pub mod unit;
pub mod weapon;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battlefield::{Battlefield, Cover, OpenField};
    pub use crate::config::CombatConfig;
    pub use crate::damage::{
        calculate_damage, DamageAffinity, DamageBreakdown, DamageCalculator, DamageInput,
        DamageType,
    };
    pub use crate::dice::{
        DicePool, DiceRoller, DiceSource, RngDice, RollOutcome, ScriptedDice, SuccessOdds,
    };
    pub use crate::error::{CombatError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::modifiers::{ModifierEntry, ModifierSource, ModifierStack};
    pub use crate::morale::{MoraleConfig, MoraleOutcome, MoraleSystem, RallyOutcome};
    pub use crate::resolver::{CombatResolver, InjectedModifiers};
    pub use crate::result::{
        CombatLog, CombatObserver, CombatResult, NoEffectReason, TracingObserver,
    };
    pub use crate::status::{
        ApplyOutcome, EffectHost, StatusEffect, StatusEffects, StatusEvent, StatusKind,
        StatusTuning,
    };
    pub use crate::unit::{Combatant, DefenseProfile, Unit, UnitClass, UnitId};
    pub use crate::weapon::{Weapon, WeaponKind};
}
