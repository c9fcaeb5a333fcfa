//! Seed-derived substream generator for Monte Carlo path workers.
//!
//! This module provides [`SubstreamRng`], a `StdRng` wrapper keyed by a
//! `(seed, substream)` pair. Every path (or antithetic pair) owns one
//! substream, so the draws it sees never depend on which worker thread ran
//! it or in which order blocks were scheduled.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finaliser.
#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Mix a base seed and a substream index into a generator seed.
///
/// Two rounds of SplitMix64 keep neighbouring indices far apart in seed
/// space, so substreams `k` and `k + 1` of the same seed are unrelated.
#[inline]
pub fn substream_seed(seed: u64, substream: u64) -> u64 {
    splitmix64(splitmix64(seed) ^ substream.wrapping_mul(GOLDEN_GAMMA))
}

/// Reproducible standard-normal source for one substream.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::rng::SubstreamRng;
///
/// let mut a = SubstreamRng::new(42, 7);
/// let mut b = SubstreamRng::new(42, 7);
/// assert_eq!(a.gen_normal(), b.gen_normal());
///
/// let mut buffer = vec![0.0; 16];
/// a.fill_normal(&mut buffer);
/// ```
#[derive(Debug, Clone)]
pub struct SubstreamRng {
    inner: StdRng,
    seed: u64,
    substream: u64,
}

impl SubstreamRng {
    /// Creates the generator for `substream` of `seed`.
    #[inline]
    pub fn new(seed: u64, substream: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(substream_seed(seed, substream)),
            seed,
            substream,
        }
    }

    /// Base seed this substream was derived from.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Substream index.
    #[inline]
    pub fn substream(&self) -> u64 {
        self.substream
    }

    /// Single standard normal variate (Ziggurat via `rand_distr`).
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Fills `buffer` with standard normal variates.
    ///
    /// Zero-allocation; an empty buffer is a no-op.
    #[inline]
    pub fn fill_normal(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = StandardNormal.sample(&mut self.inner);
        }
    }
}
