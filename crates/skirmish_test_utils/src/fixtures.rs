//! Test fixtures and helpers.
//!
//! Pre-built units, weapons and a small two-unit skirmish loop for
//! consistent testing.

use fixed::types::I32F32;
use skirmish_core::battlefield::OpenField;
use skirmish_core::config::CombatConfig;
use skirmish_core::damage::{DamageAffinity, DamageType};
use skirmish_core::dice::RngDice;
use skirmish_core::error::Result;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::morale::{MoraleOutcome, MoraleSystem};
use skirmish_core::resolver::CombatResolver;
use skirmish_core::result::CombatLog;
use skirmish_core::status::StatusKind;
use skirmish_core::unit::{Combatant, DefenseProfile, Unit, UnitClass, UnitId};
use skirmish_core::weapon::Weapon;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real rules code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Line infantry: 10 health, armor 1, leadership 7.
#[must_use]
pub fn infantry(id: u32, position: Vec2Fixed) -> Unit {
    Unit::new(UnitId::new(id), format!("Infantry {id}"), 10)
        .with_armor(1)
        .with_leadership(7)
        .at(position)
}

/// Heavy cavalry: 14 health, armor 2, better defence dice.
#[must_use]
pub fn knight(id: u32, position: Vec2Fixed) -> Unit {
    Unit::new(UnitId::new(id), format!("Knight {id}"), 14)
        .with_class(UnitClass::Cavalry)
        .with_armor(2)
        .with_leadership(8)
        .with_defense(DefenseProfile::new(4, 3))
        .at(position)
}

/// Fire-vulnerable monster without leadership of its own.
#[must_use]
pub fn troll(id: u32, position: Vec2Fixed) -> Unit {
    Unit::new(UnitId::new(id), format!("Troll {id}"), 20)
        .with_class(UnitClass::Monster)
        .with_armor(1)
        .with_affinity(DamageType::Fire, DamageAffinity::Vulnerable)
        .with_affinity(DamageType::Poison, DamageAffinity::Resistant)
        .at(position)
}

/// Turn `unit` to face `target`.
#[must_use]
pub fn facing(unit: Unit, target: Vec2Fixed) -> Unit {
    let direction = target - unit.position();
    unit.facing_towards(direction)
}

/// One-handed sword: melee 1", 3 dice on 4+, 1 damage.
///
/// # Panics
/// Never; the definition is valid.
#[must_use]
pub fn sword() -> Weapon {
    Weapon::builder("Sword")
        .melee(fixed(1))
        .attack(3, 4)
        .damage(1)
        .secondary(StatusKind::Bleed, 20)
        .build()
        .expect("sword fixture is valid")
}

/// Lance: melee 2", strong against cavalry.
///
/// # Panics
/// Never; the definition is valid.
#[must_use]
pub fn lance() -> Weapon {
    Weapon::builder("Lance")
        .melee(fixed(2))
        .attack(3, 3)
        .damage(2)
        .penetration(1)
        .bonus_vs(UnitClass::Cavalry, 1)
        .build()
        .expect("lance fixture is valid")
}

/// Longbow: ranged 0-24", 2 dice on 4+.
///
/// # Panics
/// Never; the definition is valid.
#[must_use]
pub fn longbow() -> Weapon {
    Weapon::builder("Longbow")
        .ranged(fixed(0), fixed(24))
        .attack(2, 4)
        .damage(1)
        .penetration(1)
        .build()
        .expect("longbow fixture is valid")
}

/// Poisoned dagger: melee, no criticals, always tries to poison.
///
/// # Panics
/// Never; the definition is valid.
#[must_use]
pub fn poisoned_dagger() -> Weapon {
    Weapon::builder("Poisoned Dagger")
        .melee(fixed(1))
        .attack(2, 4)
        .damage(1)
        .damage_type(DamageType::Poison)
        .criticals(false)
        .secondary(StatusKind::Poisoned, 100)
        .build()
        .expect("dagger fixture is valid")
}

/// Firebrand: melee fire weapon.
///
/// # Panics
/// Never; the definition is valid.
#[must_use]
pub fn firebrand() -> Weapon {
    Weapon::builder("Firebrand")
        .melee(fixed(1))
        .attack(2, 4)
        .damage(2)
        .damage_type(DamageType::Fire)
        .build()
        .expect("firebrand fixture is valid")
}

/// Two units locked in melee, fought round by round with seeded dice.
///
/// Each round both units start their turn (Shaken units try to rally),
/// `a` attacks `b`, `b` strikes back if it still can, the damaged unit tests
/// morale, and both end their turn.
#[derive(Debug)]
pub struct Skirmish {
    /// Rules configuration.
    pub config: CombatConfig,
    /// Battlefield geometry.
    pub field: OpenField,
    /// First unit (attacks first).
    pub a: Unit,
    /// Second unit.
    pub b: Unit,
    /// Weapon used by `a`.
    pub weapon_a: Weapon,
    /// Weapon used by `b`.
    pub weapon_b: Weapon,
    dice: RngDice,
    log: CombatLog,
    round: u32,
}

impl Skirmish {
    /// Set up a fight between two units with seeded dice.
    #[must_use]
    pub fn new(a: Unit, weapon_a: Weapon, b: Unit, weapon_b: Weapon, seed: u64) -> Self {
        Self {
            config: CombatConfig::default(),
            field: OpenField::new(),
            a,
            b,
            weapon_a,
            weapon_b,
            dice: RngDice::seeded(seed),
            log: CombatLog::new(),
            round: 0,
        }
    }

    /// Infantry with a sword against a knight with a lance, one inch apart.
    #[must_use]
    pub fn infantry_vs_knight(seed: u64) -> Self {
        let a_pos = Vec2Fixed::from_ints(0, 0);
        let b_pos = Vec2Fixed::from_ints(1, 0);
        Self::new(
            facing(infantry(1, a_pos), b_pos),
            sword(),
            facing(knight(2, b_pos), a_pos),
            lance(),
            seed,
        )
    }

    /// Rounds played so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Shared log of every resolved attack.
    #[must_use]
    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    /// Whether either side is dead.
    #[must_use]
    pub fn is_over(&self) -> bool {
        !self.a.is_alive() || !self.b.is_alive()
    }

    /// The surviving unit once the fight is over.
    #[must_use]
    pub fn winner(&self) -> Option<UnitId> {
        match (self.a.is_alive(), self.b.is_alive()) {
            (true, false) => Some(self.a.id()),
            (false, true) => Some(self.b.id()),
            _ => None,
        }
    }

    /// Play one round.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn play_round(&mut self) -> Result<()> {
        let morale = MoraleSystem::new(self.config.morale, self.config.status);
        let mut resolver = CombatResolver::new(&self.field, self.config.clone())?;
        resolver.subscribe(self.log.clone());

        self.a.start_turn();
        self.b.start_turn();
        if self.a.status().has(StatusKind::Shaken) {
            morale.rally(&mut self.a, &mut self.dice);
        }
        if self.b.status().has(StatusKind::Shaken) {
            morale.rally(&mut self.b, &mut self.dice);
        }

        if self.a.can_act() && self.b.is_alive() {
            let result = resolver.resolve(&self.a, &mut self.b, &self.weapon_a, &mut self.dice)?;
            if let MoraleOutcome::Failed(check) =
                morale.after_damage(&mut self.b, result.damage_dealt(), &mut self.dice)
            {
                tracing::debug!(unit = self.b.name(), roll = check.roll, "Shaken");
            }
        }
        if self.b.can_act() && self.a.is_alive() {
            let result = resolver.resolve(&self.b, &mut self.a, &self.weapon_b, &mut self.dice)?;
            if let MoraleOutcome::Failed(check) =
                morale.after_damage(&mut self.a, result.damage_dealt(), &mut self.dice)
            {
                tracing::debug!(unit = self.a.name(), roll = check.roll, "Shaken");
            }
        }

        self.a.end_turn();
        self.b.end_turn();
        self.round += 1;
        Ok(())
    }

    /// Play until one side falls or `max_rounds` have passed. Returns the
    /// number of rounds played.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn play(&mut self, max_rounds: u32) -> Result<u32> {
        while !self.is_over() && self.round < max_rounds {
            self.play_round()?;
        }
        Ok(self.round)
    }

    /// Hash of the visible outcome: round, both units and the encoded log.
    ///
    /// # Panics
    /// Panics if the log cannot be encoded.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let log = self.log.encode().expect("combat log encodes");
        crate::determinism::compute_hash(&(
            self.round,
            self.a.current_health(),
            self.b.current_health(),
            self.a.status().len(),
            self.b.status().len(),
            log,
        ))
    }
}
