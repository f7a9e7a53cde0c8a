//! Determinism testing utilities.
//!
//! Provides a harness for verifying that rules resolution produces
//! identical results given identical inputs and seeds.
//!
//! # Testing Strategy
//!
//! A replayed skirmish must reproduce every roll. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: distances, facings and ratios use fixed-point
//!   arithmetic via [`skirmish_core::math::Fixed`].
//!
//! - **HashMap iteration order**: modifier stacks and unit affinity tables
//!   are `BTreeMap`s, so summaries and encodings never depend on hashing.
//!
//! - **System randomness**: every draw goes through an injected
//!   [`skirmish_core::dice::DiceSource`], seeded per run.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: rolls, stacks and damage in isolation
//! 2. **Property tests**: random inputs must still produce deterministic outputs
//! 3. **Integration tests**: full skirmishes are reproducible from a seed
//! 4. **Parallel tests**: running N skirmishes on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use crate::fixtures::Skirmish;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps (rounds) played per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Rules resolution is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```ignore
/// use skirmish_test_utils::determinism::verify_determinism;
/// use skirmish_test_utils::fixtures::Skirmish;
///
/// let result = verify_determinism(
///     5,  // Run 5 times
///     20, // 20 rounds each
///     || Skirmish::infantry_vs_knight(42),
///     |s| { s.play_round().unwrap(); },
///     |s| s.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play the same skirmish twice and compare the final hashes.
///
/// # Panics
///
/// Panics if a round fails to resolve.
pub fn verify_skirmish_determinism<F>(setup_fn: F, rounds: u64) -> bool
where
    F: Fn() -> Skirmish,
{
    let result = verify_determinism(
        2,
        rounds,
        &setup_fn,
        |skirmish| {
            skirmish.play_round().expect("round resolves");
        },
        |skirmish| skirmish.state_hash(),
    );
    result.is_deterministic
}

/// Play N skirmishes on scoped threads and collect final hashes.
///
/// Each thread builds its own skirmish; the dice and logs are not shared.
///
/// # Panics
///
/// Panics if a thread panics or a round fails to resolve.
pub fn run_parallel_skirmishes<F>(setup_fn: F, num_runs: usize, rounds: u64) -> DeterminismResult
where
    F: Fn() -> Skirmish + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut skirmish = setup_fn();
                    for _ in 0..rounds {
                        skirmish.play_round().expect("round resolves");
                    }
                    skirmish.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("skirmish thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps: rounds,
    }
}

/// Play two skirmishes round by round, finding the first divergence.
///
/// # Returns
///
/// `None` if they stay identical, `Some(round)` if they diverge after
/// that round (0 means the initial states already differ).
///
/// # Panics
///
/// Panics if a round fails to resolve.
pub fn find_first_divergence<F>(setup_fn: F, rounds: u64) -> Option<u64>
where
    F: Fn() -> Skirmish,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for round in 1..=rounds {
        first.play_round().expect("round resolves");
        second.play_round().expect("round resolves");

        if first.state_hash() != second.state_hash() {
            return Some(round);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for rules testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based tests.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::dice::DicePool;
    use skirmish_core::math::{Fixed, Vec2Fixed};
    use skirmish_core::modifiers::ModifierSource;

    /// Generate a fixed-point coordinate on a 48" table.
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-48i32..48i32).prop_map(Fixed::from_num)
    }

    /// Generate a fixed-point 2D position.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a d6 pool with any target, modifier and reroll flags.
    pub fn arb_dice_pool() -> impl Strategy<Value = DicePool> {
        (
            0u32..12,
            1u32..=6,
            -3i32..=3,
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(count, target, modifier, criticals, ones, failed)| {
                let mut pool = DicePool::new(count)
                    .with_target(target)
                    .with_modifier(modifier)
                    .with_criticals(criticals);
                pool.set_reroll_ones(ones);
                pool.set_reroll_failed(failed);
                pool
            })
    }

    /// Generate a d6 face sequence long enough for any pool from
    /// [`arb_dice_pool`] including rerolls.
    pub fn arb_faces() -> impl Strategy<Value = Vec<u32>> {
        proptest::collection::vec(1u32..=6, 24)
    }

    /// Generate a modifier source key like `card:3`.
    pub fn arb_source() -> impl Strategy<Value = ModifierSource> {
        (prop_oneof![Just("card"), Just("ability"), Just("terrain")], 0u32..20).prop_map(
            |(prefix, n)| {
                ModifierSource::new(format!("{prefix}:{n}")).expect("generated keys are not empty")
            },
        )
    }

    /// One contribution to a stack: (source, dice, value, result).
    pub fn arb_contribution() -> impl Strategy<Value = (ModifierSource, i32, i32, i32)> {
        (arb_source(), -3i32..=3, -2i32..=2, -3i32..=3)
    }

    /// Generate health values (1-100).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..100u32
    }

    /// Generate seeds.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use skirmish_core::dice::{DiceRoller, ScriptedDice};

    #[test]
    fn test_verify_determinism_detects_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            3,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |state| *state,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 3);
    }

    #[test]
    fn test_skirmish_determinism() {
        assert!(verify_skirmish_determinism(|| Skirmish::infantry_vs_knight(1234), 30));
    }

    #[test]
    fn test_parallel_skirmishes_match() {
        run_parallel_skirmishes(|| Skirmish::infantry_vs_knight(99), 4, 25).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| Skirmish::infantry_vs_knight(5), 20), None);
    }

    #[test]
    fn test_different_seeds_usually_differ() {
        let hashes: Vec<u64> = (0..8)
            .map(|seed| {
                let mut skirmish = Skirmish::infantry_vs_knight(seed);
                skirmish.play(30).unwrap();
                skirmish.state_hash()
            })
            .collect();
        let mut unique = hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        assert!(unique.len() > 1);
    }

    proptest! {
        /// Any seed replays identically.
        #[test]
        fn prop_any_seed_replays(seed in strategies::arb_seed()) {
            prop_assert!(verify_skirmish_determinism(move || Skirmish::infantry_vs_knight(seed), 10));
        }

        /// A scripted roll depends only on the pool and the faces.
        #[test]
        fn prop_scripted_rolls_repeat(
            pool in strategies::arb_dice_pool(),
            faces in strategies::arb_faces(),
        ) {
            let roller = DiceRoller::new();
            let first = roller.roll(&pool, &mut ScriptedDice::new(faces.clone()));
            let second = roller.roll(&pool, &mut ScriptedDice::new(faces));
            prop_assert_eq!(first, second);
        }
    }
}
