//! The unit contract the rules core works against, and a reference unit.
//!
//! Unit data authoring and storage live outside this crate. The resolver,
//! morale checks and status effects only see [`Combatant`]: they read unit
//! state and call its mutating operations (`apply_damage`, `apply_status`,
//! `remove_status`), never its fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::damage::{DamageAffinity, DamageType};
use crate::dice::{DicePool, DEFAULT_TARGET};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::status::{ApplyOutcome, EffectHost, StatusEffect, StatusEffects, StatusEvent, StatusKind};

/// Unique identifier for units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Create a new unit ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad classification of units, used for weapon bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum UnitClass {
    /// Foot soldiers.
    #[default]
    Infantry,
    /// Mounted troops.
    Cavalry,
    /// Large creatures.
    Monster,
    /// War machines and constructs.
    Construct,
    /// Named characters.
    Hero,
}

/// Defence dice a unit rolls when attacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefenseProfile {
    /// Number of dice.
    pub dice: u32,
    /// Target number.
    pub target: u32,
}

impl DefenseProfile {
    /// Create a defence profile.
    #[must_use]
    pub const fn new(dice: u32, target: u32) -> Self {
        Self { dice, target }
    }

    /// The pool this profile describes, on dice with `sides` faces.
    #[must_use]
    pub fn pool(&self, sides: u32) -> DicePool {
        DicePool::new(self.dice).with_sides(sides).with_target(self.target)
    }
}

impl Default for DefenseProfile {
    fn default() -> Self {
        Self::new(4, DEFAULT_TARGET)
    }
}

/// Health pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if the unit is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Heal, returning the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let headroom = self.max.saturating_sub(self.current);
        let actual = amount.min(headroom);
        self.current = self.current.saturating_add(actual);
        actual
    }
}

/// What the rules core needs from a unit.
pub trait Combatant: EffectHost {
    /// Stable identifier.
    fn id(&self) -> UnitId;

    /// Display name.
    fn name(&self) -> &str;

    /// Unit classification.
    fn class(&self) -> UnitClass;

    /// Battlefield position.
    fn position(&self) -> Vec2Fixed;

    /// Unit-length facing vector.
    fn facing(&self) -> Vec2Fixed;

    /// Current health.
    fn current_health(&self) -> u32;

    /// Maximum health.
    fn max_health(&self) -> u32;

    /// Flat armor.
    fn armor(&self) -> u32;

    /// Whether the unit is still in the fight.
    fn is_alive(&self) -> bool {
        self.current_health() > 0
    }

    /// Own leadership value; `None` uses the configured default.
    fn leadership(&self) -> Option<u32> {
        None
    }

    /// Reaction to a damage type.
    fn damage_affinity(&self, _damage_type: DamageType) -> DamageAffinity {
        DamageAffinity::Normal
    }

    /// Own defence dice; `None` uses the configured default.
    fn defense_profile(&self) -> Option<DefenseProfile> {
        None
    }

    /// Active status effects.
    fn status(&self) -> &StatusEffects;

    /// Whether the unit may act this turn.
    fn can_act(&self) -> bool {
        self.is_alive() && self.status().can_act()
    }

    /// Apply a status effect through the unit's effect collection.
    fn apply_status(&mut self, effect: StatusEffect) -> ApplyOutcome;

    /// Remove a status effect regardless of its duration.
    fn remove_status(&mut self, kind: StatusKind) -> Option<StatusEffect>;
}

/// Reference [`Combatant`] used by tests, tools and simple front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    name: String,
    class: UnitClass,
    position: Vec2Fixed,
    facing: Vec2Fixed,
    health: Health,
    armor: u32,
    leadership: Option<u32>,
    #[serde(with = "fixed_serde")]
    movement: Fixed,
    #[serde(with = "fixed_serde")]
    movement_remaining: Fixed,
    action_blocked: bool,
    affinities: BTreeMap<DamageType, DamageAffinity>,
    defense: Option<DefenseProfile>,
    status: StatusEffects,
}

impl Unit {
    /// Create a unit at the origin facing +Y with full health.
    #[must_use]
    pub fn new(id: UnitId, name: impl Into<String>, max_health: u32) -> Self {
        let movement = Fixed::from_num(6);
        Self {
            id,
            name: name.into(),
            class: UnitClass::Infantry,
            position: Vec2Fixed::ZERO,
            facing: Vec2Fixed::new(Fixed::ZERO, Fixed::ONE),
            health: Health::new(max_health),
            armor: 0,
            leadership: None,
            movement,
            movement_remaining: movement,
            action_blocked: false,
            affinities: BTreeMap::new(),
            defense: None,
            status: StatusEffects::new(),
        }
    }

    /// Builder method to set the class.
    #[must_use]
    pub fn with_class(mut self, class: UnitClass) -> Self {
        self.class = class;
        self
    }

    /// Builder method to set position.
    #[must_use]
    pub fn at(mut self, position: Vec2Fixed) -> Self {
        self.position = position;
        self
    }

    /// Builder method to set facing (normalized).
    #[must_use]
    pub fn facing_towards(mut self, facing: Vec2Fixed) -> Self {
        self.facing = facing.normalize();
        self
    }

    /// Builder method to set armor.
    #[must_use]
    pub fn with_armor(mut self, armor: u32) -> Self {
        self.armor = armor;
        self
    }

    /// Builder method to set leadership.
    #[must_use]
    pub fn with_leadership(mut self, leadership: u32) -> Self {
        self.leadership = Some(leadership);
        self
    }

    /// Builder method to set movement per turn.
    #[must_use]
    pub fn with_movement(mut self, movement: Fixed) -> Self {
        self.movement = movement;
        self.movement_remaining = movement;
        self
    }

    /// Builder method to set an affinity for a damage type.
    #[must_use]
    pub fn with_affinity(mut self, damage_type: DamageType, affinity: DamageAffinity) -> Self {
        self.affinities.insert(damage_type, affinity);
        self
    }

    /// Builder method to set own defence dice.
    #[must_use]
    pub fn with_defense(mut self, defense: DefenseProfile) -> Self {
        self.defense = Some(defense);
        self
    }

    /// Move the unit.
    pub fn set_position(&mut self, position: Vec2Fixed) {
        self.position = position;
    }

    /// Turn the unit (facing is normalized).
    pub fn set_facing(&mut self, facing: Vec2Fixed) {
        self.facing = facing.normalize();
    }

    /// Movement left this turn.
    #[must_use]
    pub const fn movement_remaining(&self) -> Fixed {
        self.movement_remaining
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> &Health {
        &self.health
    }

    /// Restore health, returning the amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        self.health.heal(amount)
    }

    /// Begin the unit's turn: restore movement, then run turn-start hooks.
    pub fn start_turn(&mut self) -> Vec<StatusEvent> {
        if !self.action_blocked {
            self.movement_remaining = self.movement;
        }
        let mut status = std::mem::take(&mut self.status);
        let events = status.on_turn_start(self);
        self.status = status;
        events
    }

    /// End the unit's turn: run turn-end hooks and drop expired effects.
    pub fn end_turn(&mut self) -> Vec<StatusEvent> {
        let mut status = std::mem::take(&mut self.status);
        let events = status.on_turn_end(self);
        self.status = status;
        events
    }
}

impl EffectHost for Unit {
    fn label(&self) -> &str {
        &self.name
    }

    fn apply_damage(&mut self, amount: u32, damage_type: DamageType) -> u32 {
        let actual = self.health.apply_damage(amount);
        tracing::debug!(
            unit = %self.name,
            amount,
            actual,
            ?damage_type,
            remaining = self.health.current,
            "Damage applied"
        );
        actual
    }

    fn clear_movement(&mut self) {
        self.movement_remaining = Fixed::ZERO;
    }

    fn set_action_blocked(&mut self, blocked: bool) {
        self.action_blocked = blocked;
    }
}

impl Combatant for Unit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> UnitClass {
        self.class
    }

    fn position(&self) -> Vec2Fixed {
        self.position
    }

    fn facing(&self) -> Vec2Fixed {
        self.facing
    }

    fn current_health(&self) -> u32 {
        self.health.current
    }

    fn max_health(&self) -> u32 {
        self.health.max
    }

    fn armor(&self) -> u32 {
        self.armor
    }

    fn leadership(&self) -> Option<u32> {
        self.leadership
    }

    fn damage_affinity(&self, damage_type: DamageType) -> DamageAffinity {
        self.affinities.get(&damage_type).copied().unwrap_or_default()
    }

    fn defense_profile(&self) -> Option<DefenseProfile> {
        self.defense
    }

    fn status(&self) -> &StatusEffects {
        &self.status
    }

    fn can_act(&self) -> bool {
        self.is_alive() && !self.action_blocked && self.status.can_act()
    }

    fn apply_status(&mut self, effect: StatusEffect) -> ApplyOutcome {
        let mut status = std::mem::take(&mut self.status);
        let outcome = status.apply(effect, self);
        self.status = status;
        outcome
    }

    fn remove_status(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        let mut status = std::mem::take(&mut self.status);
        let removed = status.remove(kind, self);
        self.status = status;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soldier() -> Unit {
        Unit::new(UnitId::new(1), "Soldier", 10).with_armor(1)
    }

    #[test]
    fn test_health_clamps_damage() {
        let mut health = Health::new(5);
        assert_eq!(health.apply_damage(3), 3);
        assert_eq!(health.apply_damage(10), 2);
        assert!(health.is_dead());
        assert_eq!(health.heal(10), 5);
    }

    #[test]
    fn test_unit_damage_and_death() {
        let mut unit = soldier();
        assert_eq!(unit.apply_damage(4, DamageType::Physical), 4);
        assert_eq!(unit.current_health(), 6);
        assert!(unit.is_alive());
        assert_eq!(unit.apply_damage(20, DamageType::Fire), 6);
        assert!(!unit.is_alive());
        assert!(!unit.can_act());
    }

    #[test]
    fn test_stun_blocks_action_until_expired() {
        let mut unit = soldier();
        unit.apply_status(StatusEffect::stunned(1, "hammer"));
        assert!(!unit.can_act());

        unit.start_turn();
        let events = unit.end_turn();
        assert_eq!(events, vec![StatusEvent::Expired(StatusKind::Stunned)]);
        assert!(unit.can_act());
    }

    #[test]
    fn test_rooted_zeroes_movement() {
        let mut unit = soldier();
        assert_eq!(unit.movement_remaining(), Fixed::from_num(6));
        unit.apply_status(StatusEffect::rooted(1, "vines"));
        assert_eq!(unit.movement_remaining(), Fixed::ZERO);

        unit.start_turn();
        assert_eq!(unit.movement_remaining(), Fixed::ZERO);
        unit.end_turn();
        unit.start_turn();
        assert_eq!(unit.movement_remaining(), Fixed::from_num(6));
    }

    #[test]
    fn test_unit_heal_caps_at_max() {
        let mut unit = soldier();
        assert_eq!(unit.heal(5), 0);
        unit.apply_damage(4, DamageType::Physical);
        assert_eq!(unit.heal(10), 4);
        assert_eq!(unit.current_health(), 10);
        assert_eq!(unit.heal(u32::MAX), 0);
    }

    #[test]
    fn test_turn_cycle_ticks_poison_and_bleed() {
        let mut unit = soldier();
        unit.apply_status(StatusEffect::poisoned(1, 2, 3, "dart"));
        unit.apply_status(StatusEffect::bleed(2, 1, 5, "axe"));

        let start = unit.start_turn();
        assert_eq!(
            start,
            vec![StatusEvent::Ticked {
                kind: StatusKind::Poisoned,
                damage: 1
            }]
        );
        let end = unit.end_turn();
        assert_eq!(
            end,
            vec![
                StatusEvent::Ticked {
                    kind: StatusKind::Bleed,
                    damage: 2
                },
                StatusEvent::Expired(StatusKind::Bleed),
            ]
        );
        assert_eq!(unit.current_health(), 7);
        assert!(unit.status().has(StatusKind::Poisoned));
    }

    #[test]
    fn test_affinity_lookup() {
        let unit = soldier().with_affinity(DamageType::Fire, DamageAffinity::Vulnerable);
        assert_eq!(unit.damage_affinity(DamageType::Fire), DamageAffinity::Vulnerable);
        assert_eq!(unit.damage_affinity(DamageType::Frost), DamageAffinity::Normal);
    }

    #[test]
    fn test_defense_profile_pool() {
        let pool = DefenseProfile::default().pool(6);
        assert_eq!(pool.dice_count(), 4);
        assert_eq!(pool.target_number(), 4);
    }
}
