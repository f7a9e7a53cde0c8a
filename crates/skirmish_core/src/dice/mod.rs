//! Dice pools, random sources and the roller.
//!
//! A [`DicePool`] describes what to roll, a [`DiceSource`] supplies faces,
//! and the [`DiceRoller`] turns the two into a [`RollOutcome`].
//! [`odds`] computes the exact success distribution of a pool without
//! rolling it.

pub mod odds;
mod pool;
mod roller;
mod source;

pub use odds::SuccessOdds;
pub use pool::{DicePool, DEFAULT_SIDES, DEFAULT_TARGET};
pub use roller::{DiceRoller, RollOutcome};
pub use source::{DiceSource, RngDice, ScriptedDice, PERCENTILE};
