//! Seeded random number generation for the layout engine.
//!
//! RULE: The layout never calls a platform RNG directly.
//! Every run draws its starting positions from one LayoutRng, so a run
//! with a fixed seed reproduces the same picture. An unseeded run picks
//! a fresh seed and logs it, which makes any run replayable.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct LayoutRng {
    seed: u64,
    inner: Pcg64Mcg,
}

impl LayoutRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Use `seed` when given, otherwise draw one from the thread RNG.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let drawn = rand::random::<u64>();
            log::info!("layout seed not set, using {drawn}");
            drawn
        });
        Self::new(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform point in the square [-half, half]².
    pub fn point_in_square(&mut self, half: f32) -> (f32, f32) {
        let x = (self.next_f64() * 2.0 - 1.0) as f32 * half;
        let y = (self.next_f64() * 2.0 - 1.0) as f32 * half;
        (x, y)
    }
}
