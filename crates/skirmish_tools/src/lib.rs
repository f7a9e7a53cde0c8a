//! # Skirmish Development Tools
//!
//! Command-line helpers for rules authors:
//! - Data validators for combat tuning and weapon rosters
//! - Exact dice odds tables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod odds;
pub mod validate;
