//! Per-worker random sample source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic uniform sample stream.
///
/// Each render worker owns one; samplers are never shared between threads.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn next_float(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform integer in `[0, n)`; returns 0 when `n` is 0.
    #[inline]
    pub fn next_discrete(&mut self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            self.rng.gen_range(0..n)
        }
    }

    /// Exponentially distributed distance with the given rate.
    #[inline]
    pub fn next_exponential(&mut self, rate: f32) -> f32 {
        -(1.0 - self.next_float()).ln() / rate
    }
}
