//! Attack resolution.
//!
//! [`CombatResolver::resolve`] runs one attack from validation to the final
//! [`CombatResult`]:
//!
//! 1. reject invalid invocations before touching anything
//! 2. range check, then line of sight for ranged weapons (a failure is a
//!    valid zero-effect result, not an error)
//! 3. build both modifier stacks and dice pools
//! 4. roll attack, then defence unless the attack scored nothing or the
//!    weapon is unblockable
//! 5. compute damage, apply it through the defender, sample secondary effects
//! 6. notify observers
//!
//! The resolver holds no unit state between calls. Every random draw comes
//! from the [`DiceSource`] passed to `resolve`, in a fixed order, so the same
//! seed and inputs always give the same result. Morale is left to the caller.

use crate::battlefield::Battlefield;
use crate::config::CombatConfig;
use crate::damage::{DamageCalculator, DamageInput};
use crate::dice::{DicePool, DiceRoller, DiceSource, RollOutcome};
use crate::error::{CombatError, Result};
use crate::math::Fixed;
use crate::modifiers::{ModifierSource, ModifierStack};
use crate::result::{
    AppliedEffect, CombatObserver, CombatResult, CombatantRef, NoEffectReason,
};
use crate::unit::Combatant;
use crate::weapon::Weapon;

/// Modifier stacks supplied by card and ability systems for one attack.
///
/// They are merged into the resolver's own stacks source by source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectedModifiers {
    /// Added to the attacker's stack.
    pub attacker: ModifierStack,
    /// Added to the defender's stack.
    pub defender: ModifierStack,
}

impl InjectedModifiers {
    /// No injected modifiers.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Resolves attacks on one battlefield.
pub struct CombatResolver<'a, B: Battlefield + ?Sized> {
    battlefield: &'a B,
    roller: DiceRoller,
    calculator: DamageCalculator,
    config: CombatConfig,
    observers: Vec<Box<dyn CombatObserver + 'a>>,
}

impl<B: Battlefield + ?Sized> std::fmt::Debug for CombatResolver<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatResolver")
            .field("roller", &self.roller)
            .field("calculator", &self.calculator)
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl<'a, B: Battlefield + ?Sized> CombatResolver<'a, B> {
    /// Create a resolver with the default roller and a calculator using the
    /// configured minimum damage.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(battlefield: &'a B, config: CombatConfig) -> Result<Self> {
        let calculator = DamageCalculator::new(config.minimum_damage);
        Self::with_parts(battlefield, DiceRoller::new(), calculator, config)
    }

    /// Create a resolver from explicit parts.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_parts(
        battlefield: &'a B,
        roller: DiceRoller,
        calculator: DamageCalculator,
        config: CombatConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            battlefield,
            roller,
            calculator,
            config,
            observers: Vec::new(),
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Register an observer for every later attack.
    pub fn subscribe(&mut self, observer: impl CombatObserver + 'a) {
        self.observers.push(Box::new(observer));
    }

    /// Resolve an attack without injected modifiers.
    ///
    /// # Errors
    /// See [`Self::resolve_with`].
    pub fn resolve(
        &mut self,
        attacker: &dyn Combatant,
        defender: &mut dyn Combatant,
        weapon: &Weapon,
        dice: &mut dyn DiceSource,
    ) -> Result<CombatResult> {
        self.resolve_with(attacker, defender, weapon, &InjectedModifiers::none(), dice)
    }

    /// Resolve an attack.
    ///
    /// # Errors
    /// Returns an error, with no unit changed, when either unit is dead,
    /// the attacker targets itself, the attacker cannot act, or the weapon
    /// is invalid.
    pub fn resolve_with(
        &mut self,
        attacker: &dyn Combatant,
        defender: &mut dyn Combatant,
        weapon: &Weapon,
        injected: &InjectedModifiers,
        dice: &mut dyn DiceSource,
    ) -> Result<CombatResult> {
        if let Err(error) = validate(attacker, defender, weapon) {
            tracing::warn!(
                attacker = attacker.name(),
                defender = defender.name(),
                weapon = %weapon.name,
                %error,
                "Rejected attack"
            );
            for observer in &mut self.observers {
                observer.on_rejected(&error);
            }
            return Err(error);
        }

        let attacker_ref = CombatantRef::of(attacker);
        let defender_ref = CombatantRef::of(defender);
        let distance = self.battlefield.distance_between(attacker, defender);
        let melee = weapon.is_melee();

        let blocked = if !weapon.in_range(distance) {
            Some(NoEffectReason::OutOfRange)
        } else if !melee && !self.battlefield.has_line_of_sight(attacker, defender) {
            Some(NoEffectReason::NoLineOfSight)
        } else {
            None
        };
        if let Some(reason) = blocked {
            tracing::debug!(
                attacker = attacker.name(),
                defender = defender.name(),
                weapon = %weapon.name,
                distance = %distance,
                ?reason,
                "Attack has no effect"
            );
            let result = CombatResult::unresolved(
                attacker_ref,
                defender_ref,
                weapon.name.clone(),
                distance,
                melee,
                reason,
            );
            self.notify(&result);
            return Ok(result);
        }

        let flanked = self.is_flanking(attacker, defender);
        let attacker_stack = self.attacker_stack(attacker, weapon, distance, flanked, injected);
        let defender_stack = self.defender_stack(attacker, defender, weapon, injected);

        let mut attack_pool = weapon.attack.pool(self.config.dice_sides, weapon.allow_criticals);
        attacker_stack.apply_to_pool(&mut attack_pool);

        let defense_profile = defender.defense_profile().unwrap_or(self.config.default_defense);
        let mut defense_pool: DicePool = defense_profile.pool(self.config.dice_sides);
        defender_stack.apply_to_pool(&mut defense_pool);

        let attack_roll = self.roller.roll(&attack_pool, dice);
        let defense_roll = if attack_roll.success_count() == 0 || weapon.unblockable {
            RollOutcome::empty()
        } else {
            self.roller.roll(&defense_pool, dice)
        };

        let was_hit = attack_roll.success_count() > defense_roll.success_count();
        let breakdown = self.calculator.calculate(&DamageInput {
            base_damage: weapon.base_damage,
            attack_successes: attack_roll.success_count(),
            defense_successes: defense_roll.success_count(),
            armor: defender.armor(),
            armor_penetration: weapon.armor_penetration,
            result_modifier: attacker_stack
                .result_modifier_total()
                .saturating_add(defender_stack.result_modifier_total()),
            type_bonus: weapon.bonus_against(defender.class()),
            affinity: defender.damage_affinity(weapon.damage_type),
        });

        let final_damage = if was_hit { breakdown.final_damage } else { 0 };
        let damage_dealt = if final_damage > 0 {
            defender.apply_damage(final_damage, weapon.damage_type)
        } else {
            0
        };
        let was_killed = damage_dealt > 0 && !defender.is_alive();

        let applied_effects = if attack_roll.success_count() > 0 {
            self.apply_secondary_effects(defender, weapon, dice)
        } else {
            Vec::new()
        };

        let result = CombatResult {
            attacker: attacker_ref,
            defender: defender_ref,
            weapon: weapon.name.clone(),
            attack_roll,
            defense_roll,
            breakdown,
            final_damage,
            damage_dealt,
            was_hit,
            was_killed,
            attack_distance: distance,
            was_melee: melee,
            flanked,
            modifier_summary: summarize(&attacker_stack, &defender_stack),
            no_effect: None,
            applied_effects,
        };

        tracing::debug!(
            attacker = %result.attacker.name,
            defender = %result.defender.name,
            weapon = %result.weapon,
            attack_successes = result.attack_roll.success_count(),
            defense_successes = result.defense_roll.success_count(),
            damage = result.damage_dealt,
            killed = result.was_killed,
            "Attack resolved"
        );

        self.notify(&result);
        Ok(result)
    }

    /// Whether `attacker` has the flank on `defender`: the dot product of
    /// the defender's facing and the normalized direction from attacker to
    /// defender falls below the configured threshold.
    #[must_use]
    pub fn is_flanking(&self, attacker: &dyn Combatant, defender: &dyn Combatant) -> bool {
        let direction = (defender.position() - attacker.position()).normalize();
        defender.facing().dot(direction) < self.config.flanking_threshold
    }

    fn attacker_stack(
        &self,
        attacker: &dyn Combatant,
        weapon: &Weapon,
        distance: Fixed,
        flanked: bool,
        injected: &InjectedModifiers,
    ) -> ModifierStack {
        let mut stack = ModifierStack::new();
        if flanked {
            stack.add_dice_count_modifier(&ModifierSource::FLANKING, self.config.flank_bonus_dice);
        }
        if weapon.is_long_range(distance) {
            stack.add_dice_value_modifier(&ModifierSource::LONG_RANGE, self.config.long_range_value_penalty);
        }
        add_shaken_penalty(&mut stack, attacker);
        stack.merge(&injected.attacker);
        stack
    }

    fn defender_stack(
        &self,
        attacker: &dyn Combatant,
        defender: &dyn Combatant,
        weapon: &Weapon,
        injected: &InjectedModifiers,
    ) -> ModifierStack {
        let mut stack = ModifierStack::new();
        if !weapon.is_melee() {
            let cover_dice = self.config.cover_dice(self.battlefield.cover(attacker, defender));
            if cover_dice != 0 {
                stack.add_dice_count_modifier(&ModifierSource::COVER, cover_dice);
            }
        }
        let guard = defender.status().defense_bonus_dice();
        if guard > 0 {
            stack.add_dice_count_modifier(&ModifierSource::GUARD, to_delta(guard));
        }
        add_shaken_penalty(&mut stack, defender);
        stack.merge(&injected.defender);
        stack
    }

    fn apply_secondary_effects(
        &self,
        defender: &mut dyn Combatant,
        weapon: &Weapon,
        dice: &mut dyn DiceSource,
    ) -> Vec<AppliedEffect> {
        let mut applied = Vec::new();
        for secondary in &weapon.secondary_effects {
            // Drawn for every effect so later draws do not depend on earlier outcomes.
            let draw = dice.roll_percentile();
            if draw > secondary.chance || !defender.is_alive() {
                continue;
            }
            let effect = self.config.status.effect(secondary.kind, weapon.name.clone());
            let outcome = defender.apply_status(effect);
            applied.push(AppliedEffect {
                kind: secondary.kind,
                outcome,
            });
        }
        applied
    }

    fn notify(&mut self, result: &CombatResult) {
        for observer in &mut self.observers {
            observer.on_result(result);
        }
    }
}

fn validate(attacker: &dyn Combatant, defender: &dyn Combatant, weapon: &Weapon) -> Result<()> {
    if !attacker.is_alive() {
        return Err(CombatError::InvalidUnit {
            name: attacker.name().to_string(),
            reason: "attacker is dead".to_string(),
        });
    }
    if !defender.is_alive() {
        return Err(CombatError::InvalidUnit {
            name: defender.name().to_string(),
            reason: "defender is dead".to_string(),
        });
    }
    if attacker.id() == defender.id() {
        return Err(CombatError::SelfTarget(attacker.name().to_string()));
    }
    if !attacker.can_act() {
        return Err(CombatError::AttackerCannotAct {
            attacker: attacker.name().to_string(),
            weapon: weapon.name.clone(),
        });
    }
    weapon.validate()
}

fn add_shaken_penalty(stack: &mut ModifierStack, unit: &dyn Combatant) {
    let penalty = unit.status().dice_penalty();
    if penalty > 0 {
        stack.add_dice_count_modifier(&ModifierSource::SHAKEN, -to_delta(penalty));
    }
}

fn to_delta(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn summarize(attacker: &ModifierStack, defender: &ModifierStack) -> String {
    match (attacker.is_empty(), defender.is_empty()) {
        (true, true) => String::new(),
        (false, true) => attacker.summary(),
        (true, false) => format!("defender {}", defender.summary()),
        (false, false) => format!("{} | defender {}", attacker.summary(), defender.summary()),
    }
}
