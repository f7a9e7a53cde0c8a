//! Battlefield geometry contract.
//!
//! Range, line of sight and cover are answered by the host game. The
//! resolver asks; it never computes terrain itself.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::math::Fixed;
use crate::unit::{Combatant, UnitId};

/// Cover a defender has against a ranged attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Cover {
    /// In the open.
    #[default]
    None,
    /// Partial cover (hedges, fences).
    Light,
    /// Solid cover (walls, ruins).
    Heavy,
}

/// Geometry queries the resolver needs.
pub trait Battlefield {
    /// Distance between two units, in inches.
    fn distance_between(&self, from: &dyn Combatant, to: &dyn Combatant) -> Fixed;

    /// Whether `from` can see `to`.
    fn has_line_of_sight(&self, from: &dyn Combatant, to: &dyn Combatant) -> bool;

    /// Cover `target` has against attacks from `from`.
    fn cover(&self, _from: &dyn Combatant, _target: &dyn Combatant) -> Cover {
        Cover::None
    }
}

/// Flat field with Euclidean distances.
///
/// Line of sight is clear unless a pair was blocked explicitly; cover is
/// looked up per (attacker, target) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenField {
    blocked: BTreeSet<(UnitId, UnitId)>,
    cover: BTreeMap<(UnitId, UnitId), Cover>,
}

impl OpenField {
    /// Create an empty field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block sight between two units, in both directions.
    pub fn block_sight(&mut self, a: UnitId, b: UnitId) {
        self.blocked.insert((a, b));
        self.blocked.insert((b, a));
    }

    /// Restore sight between two units.
    pub fn clear_sight(&mut self, a: UnitId, b: UnitId) {
        self.blocked.remove(&(a, b));
        self.blocked.remove(&(b, a));
    }

    /// Give `target` cover against attacks from `from`.
    pub fn set_cover(&mut self, from: UnitId, target: UnitId, cover: Cover) {
        if cover == Cover::None {
            self.cover.remove(&(from, target));
        } else {
            self.cover.insert((from, target), cover);
        }
    }

    /// Builder form of [`Self::block_sight`].
    #[must_use]
    pub fn with_blocked_sight(mut self, a: UnitId, b: UnitId) -> Self {
        self.block_sight(a, b);
        self
    }

    /// Builder form of [`Self::set_cover`].
    #[must_use]
    pub fn with_cover(mut self, from: UnitId, target: UnitId, cover: Cover) -> Self {
        self.set_cover(from, target, cover);
        self
    }
}

impl Battlefield for OpenField {
    fn distance_between(&self, from: &dyn Combatant, to: &dyn Combatant) -> Fixed {
        from.position().distance(to.position())
    }

    fn has_line_of_sight(&self, from: &dyn Combatant, to: &dyn Combatant) -> bool {
        !self.blocked.contains(&(from.id(), to.id()))
    }

    fn cover(&self, from: &dyn Combatant, target: &dyn Combatant) -> Cover {
        self.cover
            .get(&(from.id(), target.id()))
            .copied()
            .unwrap_or_default()
    }
}
