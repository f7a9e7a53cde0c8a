//! Balance testing utilities.
//!
//! Runs many seeded duels to compare unit and weapon pairings, and computes
//! exact per-attack hit chances from pool odds.

use std::ops::Range;

use skirmish_core::config::CombatConfig;
use skirmish_core::dice::SuccessOdds;
use skirmish_core::error::Result;
use skirmish_core::unit::{Combatant, UnitId};
use skirmish_core::weapon::Weapon;

use crate::fixtures::Skirmish;

/// Result of one simulated duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelResult {
    /// Surviving unit (None if both stand or both fell).
    pub winner: Option<UnitId>,
    /// Rounds played.
    pub rounds: u32,
    /// Health left on the first unit.
    pub remaining_a: u32,
    /// Health left on the second unit.
    pub remaining_b: u32,
}

/// Statistics for a set of duels.
#[derive(Debug, Clone, Default)]
pub struct DuelStats {
    /// Total duels run.
    pub total: u32,
    /// Wins for the first unit.
    pub wins_a: u32,
    /// Wins for the second unit.
    pub wins_b: u32,
    /// Duels that hit the round limit.
    pub draws: u32,
    /// Average rounds to resolution.
    pub avg_rounds: f64,
}

impl DuelStats {
    /// Win rate for the first unit (0.0 to 1.0).
    #[must_use]
    pub fn win_rate_a(&self) -> f64 {
        if self.total == 0 {
            return 0.5;
        }
        f64::from(self.wins_a) / f64::from(self.total)
    }

    /// Win rate for the second unit (0.0 to 1.0).
    #[must_use]
    pub fn win_rate_b(&self) -> f64 {
        if self.total == 0 {
            return 0.5;
        }
        f64::from(self.wins_b) / f64::from(self.total)
    }

    /// Check if the pairing is balanced (first unit's rate within range).
    #[must_use]
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.win_rate_a();
        rate >= min_rate && rate <= max_rate
    }
}

/// Fight one duel to the end or the round limit.
///
/// # Errors
/// Returns an error if a round fails to resolve.
pub fn run_duel(mut skirmish: Skirmish, max_rounds: u32) -> Result<DuelResult> {
    let rounds = skirmish.play(max_rounds)?;
    Ok(DuelResult {
        winner: skirmish.winner(),
        rounds,
        remaining_a: skirmish.a.current_health(),
        remaining_b: skirmish.b.current_health(),
    })
}

/// Fight one duel per seed and aggregate.
///
/// # Errors
/// Returns an error if any round fails to resolve.
pub fn run_duels<F>(setup: F, seeds: Range<u64>, max_rounds: u32) -> Result<DuelStats>
where
    F: Fn(u64) -> Skirmish,
{
    let mut stats = DuelStats::default();
    let mut total_rounds = 0u64;

    for seed in seeds {
        let skirmish = setup(seed);
        let a = skirmish.a.id();
        let b = skirmish.b.id();
        let result = run_duel(skirmish, max_rounds)?;

        stats.total += 1;
        total_rounds += u64::from(result.rounds);
        match result.winner {
            Some(id) if id == a => stats.wins_a += 1,
            Some(id) if id == b => stats.wins_b += 1,
            _ => stats.draws += 1,
        }
    }

    if stats.total > 0 {
        stats.avg_rounds = total_rounds as f64 / f64::from(stats.total);
    }
    tracing::debug!(
        total = stats.total,
        wins_a = stats.wins_a,
        wins_b = stats.wins_b,
        draws = stats.draws,
        "Duel batch finished"
    );
    Ok(stats)
}

/// Exact chance that `weapon` out-rolls `defender`'s defence dice, with no
/// situational modifiers.
#[must_use]
pub fn base_hit_chance(weapon: &Weapon, defender: &dyn Combatant, config: &CombatConfig) -> f64 {
    let attack = weapon.attack.pool(config.dice_sides, weapon.allow_criticals);
    let defense = defender
        .defense_profile()
        .unwrap_or(config.default_defense)
        .pool(config.dice_sides);
    if weapon.unblockable {
        SuccessOdds::for_pool(&attack).at_least(1)
    } else {
        SuccessOdds::hit_chance(&attack, &defense)
    }
}
