//! Combat results and their observers.
//!
//! A [`CombatResult`] is created once per resolved attack and never changes
//! afterwards. Observers receive it by reference after the defender has been
//! mutated; [`CombatLog`] keeps every result and encodes them with `bincode`
//! so two runs can be compared byte for byte.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::damage::DamageBreakdown;
use crate::dice::RollOutcome;
use crate::error::{CombatError, Result};
use crate::math::{fixed_serde, Fixed};
use crate::status::{ApplyOutcome, StatusKind};
use crate::unit::{Combatant, UnitId};

/// Identity of a unit at the time of an attack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantRef {
    /// Unit id.
    pub id: UnitId,
    /// Unit name.
    pub name: String,
}

impl CombatantRef {
    /// Capture a unit's identity.
    #[must_use]
    pub fn of(unit: &dyn Combatant) -> Self {
        Self {
            id: unit.id(),
            name: unit.name().to_string(),
        }
    }
}

/// Why an attack had no effect before any dice were rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoEffectReason {
    /// Target outside the weapon's range band.
    OutOfRange,
    /// Ranged attack without line of sight.
    NoLineOfSight,
}

/// A secondary effect that landed on the defender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppliedEffect {
    /// Effect kind.
    pub kind: StatusKind,
    /// What applying it did.
    pub outcome: ApplyOutcome,
}

/// Immutable record of one resolved attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    pub(crate) attacker: CombatantRef,
    pub(crate) defender: CombatantRef,
    pub(crate) weapon: String,
    pub(crate) attack_roll: RollOutcome,
    pub(crate) defense_roll: RollOutcome,
    pub(crate) breakdown: DamageBreakdown,
    pub(crate) final_damage: u32,
    pub(crate) damage_dealt: u32,
    pub(crate) was_hit: bool,
    pub(crate) was_killed: bool,
    #[serde(with = "fixed_serde")]
    pub(crate) attack_distance: Fixed,
    pub(crate) was_melee: bool,
    pub(crate) flanked: bool,
    pub(crate) modifier_summary: String,
    pub(crate) no_effect: Option<NoEffectReason>,
    pub(crate) applied_effects: Vec<AppliedEffect>,
}

impl CombatResult {
    /// A result for an attack that never rolled.
    pub(crate) fn unresolved(
        attacker: CombatantRef,
        defender: CombatantRef,
        weapon: String,
        attack_distance: Fixed,
        was_melee: bool,
        reason: NoEffectReason,
    ) -> Self {
        Self {
            attacker,
            defender,
            weapon,
            attack_roll: RollOutcome::empty(),
            defense_roll: RollOutcome::empty(),
            breakdown: DamageBreakdown::default(),
            final_damage: 0,
            damage_dealt: 0,
            was_hit: false,
            was_killed: false,
            attack_distance,
            was_melee,
            flanked: false,
            modifier_summary: String::new(),
            no_effect: Some(reason),
            applied_effects: Vec::new(),
        }
    }

    /// Attacking unit.
    #[must_use]
    pub const fn attacker(&self) -> &CombatantRef {
        &self.attacker
    }

    /// Defending unit.
    #[must_use]
    pub const fn defender(&self) -> &CombatantRef {
        &self.defender
    }

    /// Weapon name.
    #[must_use]
    pub fn weapon(&self) -> &str {
        &self.weapon
    }

    /// Attacker's roll.
    #[must_use]
    pub const fn attack_roll(&self) -> &RollOutcome {
        &self.attack_roll
    }

    /// Defender's roll (empty when not rolled).
    #[must_use]
    pub const fn defense_roll(&self) -> &RollOutcome {
        &self.defense_roll
    }

    /// How the damage was computed.
    #[must_use]
    pub const fn breakdown(&self) -> &DamageBreakdown {
        &self.breakdown
    }

    /// Damage the attack inflicts. Zero on a miss, whatever the
    /// breakdown computed.
    #[must_use]
    pub const fn final_damage(&self) -> u32 {
        self.final_damage
    }

    /// Damage the defender actually lost (capped by remaining health).
    #[must_use]
    pub const fn damage_dealt(&self) -> u32 {
        self.damage_dealt
    }

    /// Attacker scored more successes than the defender.
    #[must_use]
    pub const fn was_hit(&self) -> bool {
        self.was_hit
    }

    /// The defender died from this attack.
    #[must_use]
    pub const fn was_killed(&self) -> bool {
        self.was_killed
    }

    /// Distance at the time of the attack.
    #[must_use]
    pub const fn attack_distance(&self) -> Fixed {
        self.attack_distance
    }

    /// Attack used a melee weapon.
    #[must_use]
    pub const fn was_melee(&self) -> bool {
        self.was_melee
    }

    /// Attacker had the flank.
    #[must_use]
    pub const fn flanked(&self) -> bool {
        self.flanked
    }

    /// Description of every modifier that took part.
    #[must_use]
    pub fn modifier_summary(&self) -> &str {
        &self.modifier_summary
    }

    /// Why nothing happened, if nothing was rolled.
    #[must_use]
    pub const fn no_effect(&self) -> Option<NoEffectReason> {
        self.no_effect
    }

    /// Secondary effects that landed.
    #[must_use]
    pub fn applied_effects(&self) -> &[AppliedEffect] {
        &self.applied_effects
    }
}

/// Receives every resolved attack.
pub trait CombatObserver {
    /// An attack resolved.
    fn on_result(&mut self, result: &CombatResult);

    /// An attack was rejected before any state changed.
    fn on_rejected(&mut self, _error: &CombatError) {}
}

/// Logs results through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CombatObserver for TracingObserver {
    fn on_result(&mut self, result: &CombatResult) {
        tracing::info!(
            attacker = %result.attacker.name,
            defender = %result.defender.name,
            weapon = %result.weapon,
            hit = result.was_hit,
            damage = result.damage_dealt,
            killed = result.was_killed,
            modifiers = %result.modifier_summary,
            "Attack resolved"
        );
    }

    fn on_rejected(&mut self, error: &CombatError) {
        tracing::warn!(%error, "Attack rejected");
    }
}

/// Combat log encoding version.
pub const LOG_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct EncodedLog {
    version: u32,
    results: Vec<CombatResult>,
}

#[derive(Debug, Default)]
struct LogState {
    results: Vec<CombatResult>,
    rejected: usize,
}

/// Shared in-memory record of results.
///
/// Clones share the same storage, so one handle can be subscribed to a
/// resolver while another is read afterwards.
#[derive(Debug, Clone, Default)]
pub struct CombatLog {
    state: Rc<RefCell<LogState>>,
}

impl CombatLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded result, in order.
    #[must_use]
    pub fn results(&self) -> Vec<CombatResult> {
        self.state.borrow().results.clone()
    }

    /// Number of recorded results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().results.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().results.is_empty()
    }

    /// Number of rejected attacks seen.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.state.borrow().rejected
    }

    /// Encode every result.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let state = self.state.borrow();
        let log = EncodedLog {
            version: LOG_VERSION,
            results: state.results.clone(),
        };
        bincode::serialize(&log).map_err(|e| CombatError::Encoding(e.to_string()))
    }

    /// Decode results produced by [`Self::encode`].
    ///
    /// # Errors
    /// Returns an error on malformed bytes or a version mismatch.
    pub fn decode(bytes: &[u8]) -> Result<Vec<CombatResult>> {
        let log: EncodedLog =
            bincode::deserialize(bytes).map_err(|e| CombatError::Encoding(e.to_string()))?;
        if log.version != LOG_VERSION {
            return Err(CombatError::Encoding(format!(
                "log version mismatch: expected {}, got {}",
                LOG_VERSION, log.version
            )));
        }
        Ok(log.results)
    }
}

impl CombatObserver for CombatLog {
    fn on_result(&mut self, result: &CombatResult) {
        self.state.borrow_mut().results.push(result.clone());
    }

    fn on_rejected(&mut self, _error: &CombatError) {
        self.state.borrow_mut().rejected += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CombatResult {
        CombatResult::unresolved(
            CombatantRef {
                id: UnitId::new(1),
                name: "Archer".to_string(),
            },
            CombatantRef {
                id: UnitId::new(2),
                name: "Knight".to_string(),
            },
            "Bow".to_string(),
            Fixed::from_num(30),
            false,
            NoEffectReason::OutOfRange,
        )
    }

    #[test]
    fn test_no_effect_result() {
        let result = sample();
        assert!(!result.was_hit());
        assert_eq!(result.final_damage(), 0);
        assert!(result.attack_roll().is_empty());
        assert!(result.defense_roll().is_empty());
        assert_eq!(result.modifier_summary(), "");
        assert_eq!(result.no_effect(), Some(NoEffectReason::OutOfRange));
    }

    #[test]
    fn test_log_clones_share_storage() {
        let log = CombatLog::new();
        let mut handle = log.clone();
        handle.on_result(&sample());
        handle.on_rejected(&CombatError::SelfTarget("Archer".to_string()));
        assert_eq!(log.len(), 1);
        assert_eq!(log.rejected(), 1);
    }

    #[test]
    fn test_encode_decode() {
        let mut log = CombatLog::new();
        log.on_result(&sample());
        let bytes = log.encode().unwrap();
        let decoded = CombatLog::decode(&bytes).unwrap();
        assert_eq!(decoded, log.results());
    }

    #[test]
    fn test_decode_rejects_other_versions() {
        let bytes = bincode::serialize(&EncodedLog {
            version: LOG_VERSION + 1,
            results: Vec::new(),
        })
        .unwrap();
        assert!(matches!(CombatLog::decode(&bytes), Err(CombatError::Encoding(_))));
    }
}
