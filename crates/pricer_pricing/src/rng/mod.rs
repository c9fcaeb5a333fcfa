//! # Random Number Generation
//!
//! Seed-derived substreams for parallel path generation. There is no global
//! generator: the simulator hands each path (or antithetic pair) the
//! substream whose index equals the path (or pair) index, so results are
//! bit-identical regardless of thread count.
//!
//! ```rust
//! use pricer_pricing::rng::SubstreamRng;
//!
//! let mut rng = SubstreamRng::new(42, 0);
//! let mut normals = vec![0.0; 8];
//! rng.fill_normal(&mut normals);
//! ```

mod prng;

pub use prng::{substream_seed, SubstreamRng};
