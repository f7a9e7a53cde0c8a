//! Exact success distributions for dice pools.
//!
//! Each die independently scores 0, 1 or 2 successes: one for clearing the
//! target, one more for a natural maximum when criticals are on. The
//! per-die distribution is derived by enumerating faces and reroll branches,
//! then convolved across the pool. Probabilities are `f64`: this is analysis
//! output for tooling and balance checks, never simulation state.

use super::pool::DicePool;

/// Probability distribution of the success count of one pool.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessOdds {
    pmf: Vec<f64>,
}

impl SuccessOdds {
    /// Compute the exact distribution for `pool`.
    #[must_use]
    pub fn for_pool(pool: &DicePool) -> Self {
        let per_die = single_die(pool);
        let mut pmf = vec![1.0];

        for _ in 0..pool.dice_count() {
            let mut next = vec![0.0; pmf.len() + 2];
            for (successes, &p) in pmf.iter().enumerate() {
                if p == 0.0 {
                    continue;
                }
                for (extra, &q) in per_die.iter().enumerate() {
                    next[successes + extra] += p * q;
                }
            }
            pmf = next;
        }

        while pmf.len() > 1 && pmf.last().is_some_and(|&p| p == 0.0) {
            pmf.pop();
        }

        Self { pmf }
    }

    /// Probability of exactly `successes`.
    #[must_use]
    pub fn probability(&self, successes: u32) -> f64 {
        self.pmf.get(successes as usize).copied().unwrap_or(0.0)
    }

    /// Probability of `successes` or more.
    #[must_use]
    pub fn at_least(&self, successes: u32) -> f64 {
        self.pmf.iter().skip(successes as usize).sum()
    }

    /// Expected number of successes.
    #[must_use]
    pub fn expected(&self) -> f64 {
        self.pmf
            .iter()
            .enumerate()
            .map(|(k, p)| k as f64 * p)
            .sum()
    }

    /// Highest success count with non-zero probability.
    #[must_use]
    pub fn max_successes(&self) -> u32 {
        (self.pmf.len() - 1) as u32
    }

    /// The full mass function, indexed by success count.
    #[must_use]
    pub fn distribution(&self) -> &[f64] {
        &self.pmf
    }

    /// Probability that an attack pool scores more successes than a
    /// defence pool rolled independently.
    #[must_use]
    pub fn hit_chance(attack: &DicePool, defense: &DicePool) -> f64 {
        let attack = Self::for_pool(attack);
        let defense = Self::for_pool(defense);

        let mut chance = 0.0;
        for (a, pa) in attack.pmf.iter().enumerate() {
            let beaten: f64 = defense.pmf.iter().take(a).sum();
            chance += pa * beaten;
        }
        chance
    }
}

/// Distribution over {0, 1, 2} successes for one die of `pool`.
fn single_die(pool: &DicePool) -> [f64; 3] {
    let sides = pool.sides();
    let final_faces = final_face_distribution(pool);

    let mut dist = [0.0; 3];
    for face in 1..=sides {
        let p = final_faces[face as usize];
        if p == 0.0 {
            continue;
        }
        let mut successes = 0;
        if pool.is_success(face) {
            successes += 1;
        }
        if pool.allow_criticals() && face == sides {
            successes += 1;
        }
        dist[successes] += p;
    }

    debug_assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    dist
}

/// Probability of each final raw face (index = face) after reroll rules.
fn final_face_distribution(pool: &DicePool) -> Vec<f64> {
    let sides = pool.sides();
    let face_p = 1.0 / f64::from(sides);
    let mut faces = vec![0.0; sides as usize + 1];

    for first in 1..=sides {
        let rerolled = if pool.reroll_ones() && first == 1 {
            true
        } else {
            pool.reroll_failed() && !pool.is_success(first)
        };

        if rerolled {
            for second in 1..=sides {
                faces[second as usize] += face_p * face_p;
            }
        } else {
            faces[first as usize] += face_p;
        }
    }

    faces
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_single_die_four_plus() {
        let odds = SuccessOdds::for_pool(&DicePool::new(1).with_target(4));
        assert!((odds.probability(1) - 0.5).abs() < EPS);
        assert!((odds.probability(0) - 0.5).abs() < EPS);
        assert_eq!(odds.max_successes(), 1);
    }

    #[test]
    fn test_criticals_extend_range() {
        let odds = SuccessOdds::for_pool(&DicePool::new(1).with_target(4).with_criticals(true));
        // 6 scores 2, 4-5 score 1, 1-3 score 0.
        assert!((odds.probability(2) - 1.0 / 6.0).abs() < EPS);
        assert!((odds.probability(1) - 2.0 / 6.0).abs() < EPS);
        assert!((odds.probability(0) - 0.5).abs() < EPS);
        assert!((odds.expected() - 4.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn test_reroll_failed_raises_odds() {
        let mut pool = DicePool::new(1).with_target(4);
        pool.set_reroll_failed(true);
        let odds = SuccessOdds::for_pool(&pool);
        // 1 - 0.5 * 0.5
        assert!((odds.at_least(1) - 0.75).abs() < EPS);
    }

    #[test]
    fn test_reroll_ones() {
        let mut pool = DicePool::new(1).with_target(4);
        pool.set_reroll_ones(true);
        let odds = SuccessOdds::for_pool(&pool);
        // 3/6 + 1/6 * 3/6
        assert!((odds.at_least(1) - (0.5 + 1.0 / 12.0)).abs() < EPS);
    }

    #[test]
    fn test_pmf_sums_to_one() {
        let mut pool = DicePool::new(5).with_target(5).with_modifier(1).with_criticals(true);
        pool.set_reroll_ones(true);
        let odds = SuccessOdds::for_pool(&pool);
        let total: f64 = odds.distribution().iter().sum();
        assert!((total - 1.0).abs() < EPS);
        assert!(odds.max_successes() <= 10);
    }

    #[test]
    fn test_empty_pool() {
        let odds = SuccessOdds::for_pool(&DicePool::new(0));
        assert!((odds.probability(0) - 1.0).abs() < EPS);
        assert_eq!(odds.expected(), 0.0);
    }

    #[test]
    fn test_hit_chance() {
        // One die 4+ vs nothing: hit whenever the die succeeds.
        let attack = DicePool::new(1).with_target(4);
        let defense = DicePool::new(0);
        assert!((SuccessOdds::hit_chance(&attack, &defense) - 0.5).abs() < EPS);

        // Symmetric single dice: P(a > d) = P(a=1) * P(d=0) = 0.25
        let defense = DicePool::new(1).with_target(4);
        assert!((SuccessOdds::hit_chance(&attack, &defense) - 0.25).abs() < EPS);
    }
}
