//! Single-step simulation contract shared by every rate model.
//!
//! A rate model advances a flat `f64` state vector from one grid time to the
//! next and reports the numeraire of its pricing measure at the new time.
//! Path storage, random numbers and parallelism live in the simulator; the
//! model only sees one path and one step at a time.

use serde::{Deserialize, Serialize};

/// Time discretisation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// Closed-form transition where the model has one, otherwise the
    /// model's most accurate discretisation.
    #[default]
    Exact,
    /// First-order Euler with step equal to the grid spacing.
    Euler,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Exact => write!(f, "exact"),
            Scheme::Euler => write!(f, "euler"),
        }
    }
}

/// Per-path dynamics of a term-structure model under its pricing measure.
///
/// # Contract
///
/// - `evolve` reads exactly `brownian_dim(scheme)` standard normals
/// - the returned numeraire is strictly positive for finite inputs
/// - `zero_bond(t, T, state)` is the model bond price P(t, T) given the
///   state at `t`, so `E[zero_bond(t, T) / N(t)] = P(0, T) / N(0)`
pub trait RateDynamics {
    /// Short display name.
    fn model_name(&self) -> &'static str;

    /// Number of state variables per path and time.
    fn state_dim(&self) -> usize;

    /// Number of standard normals consumed per step.
    fn brownian_dim(&self, scheme: Scheme) -> usize;

    /// Last time the model can be simulated to.
    fn horizon(&self) -> f64 {
        f64::INFINITY
    }

    /// Write the state at t = 0 into `out`.
    fn initial_state(&self, out: &mut [f64]);

    /// Numeraire at t = 0.
    fn initial_numeraire(&self) -> f64;

    /// Length of the work buffer [`evolve_with_scratch`](Self::evolve_with_scratch)
    /// needs.
    fn scratch_len(&self) -> usize {
        0
    }

    /// Advance one path from `t0` to `t1`.
    ///
    /// `numeraire` is N(t0); the return value is N(t1). Allocates its work
    /// buffer on every call; path loops use
    /// [`evolve_with_scratch`](Self::evolve_with_scratch).
    #[allow(clippy::too_many_arguments)]
    fn evolve(
        &self,
        t0: f64,
        t1: f64,
        state: &[f64],
        numeraire: f64,
        normals: &[f64],
        scheme: Scheme,
        next: &mut [f64],
    ) -> f64 {
        let mut scratch = vec![0.0; self.scratch_len()];
        self.evolve_with_scratch(t0, t1, state, numeraire, normals, scheme, next, &mut scratch)
    }

    /// [`evolve`](Self::evolve) with a caller-owned work buffer of at least
    /// `scratch_len()` entries. Its contents on entry are ignored.
    #[allow(clippy::too_many_arguments)]
    fn evolve_with_scratch(
        &self,
        t0: f64,
        t1: f64,
        state: &[f64],
        numeraire: f64,
        normals: &[f64],
        scheme: Scheme,
        next: &mut [f64],
        scratch: &mut [f64],
    ) -> f64;

    /// Model zero-coupon bond price P(t, maturity) given the state at `t`.
    fn zero_bond(&self, t: f64, maturity: f64, state: &[f64]) -> f64;

    /// Initial discount factor P(0, maturity) implied by the model.
    fn initial_zero_bond(&self, maturity: f64) -> f64;
}
