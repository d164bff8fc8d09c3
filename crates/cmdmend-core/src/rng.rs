//! Injectable randomness for corruption and sampling.
//!
//! Every random decision in the pipeline (mistake kind, character position,
//! replacement character, corpus sampling) goes through [`NoiseSource`] so a
//! test harness can supply a seeded or fully scripted sequence. Production
//! runs are not required to be reproducible across processes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the random draws the pipeline makes.
pub trait NoiseSource {
    /// Uniform integer in `[0, upper)`. `upper` must be non-zero.
    fn index(&mut self, upper: usize) -> usize;

    /// Uniform float in `[0, 1)`.
    fn fraction(&mut self) -> f32;

    /// Uniform pick from a non-empty slice of characters.
    fn pick(&mut self, chars: &[char]) -> char {
        chars[self.index(chars.len())]
    }
}

/// `StdRng`-backed noise source.
pub struct SeededNoise {
    rng: StdRng,
}

impl SeededNoise {
    /// Deterministic source for a given seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// OS-entropy-seeded source for production runs.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }

    fn fraction(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Plays back a fixed sequence of draws.
///
/// `index` calls consume from `indices` (clamped into range), `fraction`
/// calls from `fractions`; both repeat their last element when exhausted.
/// Test-only by intent, but exported so integration tests can script the
/// injector deterministically.
pub struct ScriptedNoise {
    indices: Vec<usize>,
    fractions: Vec<f32>,
    index_pos: usize,
    fraction_pos: usize,
}

impl ScriptedNoise {
    /// A scripted source over the given draw sequences.
    pub fn new(indices: Vec<usize>, fractions: Vec<f32>) -> Self {
        Self {
            indices,
            fractions,
            index_pos: 0,
            fraction_pos: 0,
        }
    }
}

impl NoiseSource for ScriptedNoise {
    fn index(&mut self, upper: usize) -> usize {
        let pos = self.index_pos.min(self.indices.len().saturating_sub(1));
        self.index_pos += 1;
        self.indices.get(pos).copied().unwrap_or(0).min(upper - 1)
    }

    fn fraction(&mut self) -> f32 {
        let pos = self.fraction_pos.min(self.fractions.len().saturating_sub(1));
        self.fraction_pos += 1;
        self.fractions.get(pos).copied().unwrap_or(0.0)
    }
}
