//! Error types for the combat rules core.

use thiserror::Error;

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for rules resolution.
///
/// Only invalid invocations and missing configuration are errors.
/// Out-of-range or blocked attacks are valid [`crate::result::CombatResult`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// A unit taking part in an attack is not in a valid state for it.
    #[error("Invalid unit '{name}': {reason}")]
    InvalidUnit {
        /// Display name of the offending unit.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The attacker tried to target itself.
    #[error("Unit '{0}' cannot attack itself")]
    SelfTarget(String),

    /// The attacker is prevented from acting (e.g. stunned).
    #[error("Unit '{attacker}' cannot act and may not attack with '{weapon}'")]
    AttackerCannotAct {
        /// Attacker name.
        attacker: String,
        /// Weapon the attack was attempted with.
        weapon: String,
    },

    /// Weapon definition failed validation.
    #[error("Invalid weapon '{weapon}': {reason}")]
    InvalidWeapon {
        /// Weapon name.
        weapon: String,
        /// Validation failure.
        reason: String,
    },

    /// Combat configuration failed validation.
    #[error("Invalid combat configuration: {0}")]
    InvalidConfig(String),

    /// A modifier source key was empty.
    #[error("Modifier source key must not be empty")]
    EmptyModifierSource,

    /// Tried to remove a modifier source that was never added.
    #[error("Unknown modifier source: {0}")]
    UnknownModifierSource(String),

    /// A status effect name did not match any known effect.
    #[error("Unknown status effect: {0}")]
    UnknownStatusEffect(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParse {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Binary encoding of combat records failed.
    #[error("Failed to encode combat log: {0}")]
    Encoding(String),
}
