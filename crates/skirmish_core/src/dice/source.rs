//! Injectable random sources.
//!
//! Every random draw in the rules core goes through [`DiceSource`], so a
//! seeded source (or a scripted one) makes a whole battle reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Die size used for percentage chances.
pub const PERCENTILE: u32 = 100;

/// Supplies die faces.
pub trait DiceSource {
    /// Draw a face uniformly from `[1, sides]`.
    fn roll(&mut self, sides: u32) -> u32;

    /// Roll a percentile die (1-100 inclusive).
    fn roll_percentile(&mut self) -> u32 {
        self.roll(PERCENTILE)
    }
}

impl<T: DiceSource + ?Sized> DiceSource for &mut T {
    fn roll(&mut self, sides: u32) -> u32 {
        (**self).roll(sides)
    }
}

/// Dice backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R = ChaCha8Rng> {
    rng: R,
}

impl RngDice<ChaCha8Rng> {
    /// Seeded ChaCha dice; the same seed always produces the same faces.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> RngDice<R> {
    /// Wrap an existing generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Unwrap the generator.
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> DiceSource for RngDice<R> {
    fn roll(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.rng.gen_range(1..=sides)
    }
}

/// Replays a fixed sequence of faces.
///
/// Faces are clamped into `[1, sides]` of the die being rolled. When the
/// script runs out it starts again from the beginning; an empty script
/// always rolls `1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedDice {
    faces: Vec<u32>,
    cursor: usize,
    drawn: usize,
}

impl ScriptedDice {
    /// Create a script from a face sequence.
    #[must_use]
    pub fn new(faces: impl Into<Vec<u32>>) -> Self {
        Self {
            faces: faces.into(),
            cursor: 0,
            drawn: 0,
        }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub fn drawn(&self) -> usize {
        self.drawn
    }

    /// Faces left before the script wraps around.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.faces.len().saturating_sub(self.cursor)
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self, sides: u32) -> u32 {
        self.drawn += 1;
        if self.faces.is_empty() {
            return 1.min(sides);
        }
        if self.cursor >= self.faces.len() {
            self.cursor = 0;
        }
        let face = self.faces[self.cursor];
        self.cursor += 1;
        face.clamp(1.min(sides), sides)
    }
}
