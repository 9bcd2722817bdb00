//! Deterministic terrain RNG
//!
//! A 32-bit linear congruential generator. Placement sampling and procedural
//! mesh perturbation both draw from it, so a level's whole terrain is a pure
//! function of its seed.

use rand::rand_core::impls::{fill_bytes_via_next, next_u64_via_u32};
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

const LCG_MUL: u32 = 1_664_525;
const LCG_INC: u32 = 1_013_904_223;
const INV_2_POW_32: f64 = 1.0 / 4_294_967_296.0;

/// Salt mixed into a feature seed for its layout stream
pub const SALT_LAYOUT: u32 = 0x6c61_7900;
/// Salt mixed into a feature seed for its visual mesh stream
pub const SALT_VISUAL: u32 = 0x7669_7300;
/// Salt mixed into a feature seed for its collider stream
pub const SALT_COLLIDER: u32 = 0x636f_6c00;

/// Seeded LCG: `state = state * 1664525 + 1013904223 (mod 2^32)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainRng {
    state: u32,
}

impl TerrainRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Independent stream derived from `seed` with a salt
    ///
    /// Different salts give uncorrelated streams for the same root seed.
    pub fn forked(seed: u32, salt: u32) -> Self {
        let mixed = (seed ^ salt)
            .wrapping_mul(2_654_435_761) // Golden ratio hash
            .rotate_left(13)
            ^ salt.wrapping_mul(0x85eb_ca6b);
        Self::new(mixed)
    }

    /// Current raw state (for logging/debugging)
    pub fn state(&self) -> u32 {
        self.state
    }

    #[inline]
    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        self.state
    }

    /// Next value in `[0, 1)`
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.step() as f64 * INV_2_POW_32
    }

    /// Uniform value in `[lo, hi)`
    #[inline]
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform value in `[-half, half)`
    #[inline]
    pub fn jitter(&mut self, half: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * half
    }

    /// Power-biased value in `[lo, hi)`; `bias > 1` skews toward `lo`
    #[inline]
    pub fn biased(&mut self, lo: f64, hi: f64, bias: f64) -> f64 {
        lo + (hi - lo) * self.next_f64().powf(bias.max(1e-3))
    }

    /// Angle in `[0, 2π)`
    #[inline]
    pub fn angle(&mut self) -> f64 {
        self.next_f64() * TAU
    }

    /// Uniform index in `0..n` (n must be non-zero)
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        ((self.next_f64() * n as f64) as usize).min(n.saturating_sub(1))
    }

    /// Fresh seed for a child stream
    #[inline]
    pub fn next_seed(&mut self) -> u32 {
        self.step()
    }
}

/// Public interop point: lets callers drive `rand::Rng` and `rand::seq`
/// helpers from a level's stream. Terrain code uses the inherent draws above.
impl RngCore for TerrainRng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        fill_bytes_via_next(self, dst)
    }
}

impl SeedableRng for TerrainRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32)
    }
}
