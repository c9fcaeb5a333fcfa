//! Exercise-value contract between products and the pricing engine.
//!
//! The engine asks a product one question per path and exercise date: what
//! is the undiscounted value received if exercised now, given the simulated
//! state? The answer must be a pure function of its inputs and defined for
//! every input; the engine rebases it by the path numeraire.

use crate::models::RateModel;

/// What a payoff sees at one exercise date on one path.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    /// Exercise time (years).
    pub time: f64,
    /// Model state on this path at `time`.
    pub state: &'a [f64],
    /// Model that produced the state; used for bond prices.
    pub model: &'a RateModel,
}

impl<'a> Observation<'a> {
    /// Bundle an observation.
    pub fn new(time: f64, state: &'a [f64], model: &'a RateModel) -> Self {
        Self { time, state, model }
    }

    /// Model bond price P(time, maturity) on this path.
    #[inline]
    pub fn zero_bond(&self, maturity: f64) -> f64 {
        self.model.zero_bond(self.time, maturity, self.state)
    }

    /// Present value of a fixed leg paying `rate * (d_k - d_{k-1})` at each
    /// `d_k` strictly after `time`, per unit notional.
    pub fn annuity(&self, dates: &[f64]) -> f64 {
        dates
            .windows(2)
            .filter(|w| w[1] > self.time + DATE_TOLERANCE)
            .map(|w| (w[1] - w[0]) * self.zero_bond(w[1]))
            .sum()
    }
}

/// Absolute tolerance used when comparing times (years).
pub const DATE_TOLERANCE: f64 = 1e-10;

/// Exercise value of a callable or exercisable product.
///
/// Implementations must be pure and total: no side effects, a finite
/// result for any finite state. A non-finite result is treated as a fatal
/// numerical fault by the engine.
pub trait Payoff: Send + Sync {
    /// Undiscounted value received if exercised at `obs.time`.
    fn exercise_value(&self, obs: &Observation<'_>) -> f64;
}

impl<P: Payoff + ?Sized> Payoff for &P {
    fn exercise_value(&self, obs: &Observation<'_>) -> f64 {
        (**self).exercise_value(obs)
    }
}

impl<P: Payoff + ?Sized> Payoff for Box<P> {
    fn exercise_value(&self, obs: &Observation<'_>) -> f64 {
        (**self).exercise_value(obs)
    }
}

/// Payoff backed by a closure.
///
/// ```
/// use pricer_models::instruments::{FnPayoff, Observation, Payoff};
/// # use pricer_core::market_data::MarketSnapshot;
/// # use pricer_models::models::rates::HullWhite1F;
/// # use pricer_models::models::RateModel;
///
/// // Pays the simulated short rate above 2%.
/// let caplet = FnPayoff::new(|obs: &Observation<'_>| (obs.state[0] - 0.02).max(0.0));
/// # let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
/// # let model: RateModel = HullWhite1F::from_market(&market, 0.1, 0.01, 5.0).unwrap().into();
/// let value = caplet.exercise_value(&Observation::new(1.0, &[0.05], &model));
/// assert!((value - 0.03).abs() < 1e-15);
/// ```
pub struct FnPayoff<F> {
    f: F,
}

impl<F> FnPayoff<F>
where
    F: Fn(&Observation<'_>) -> f64 + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Payoff for FnPayoff<F>
where
    F: Fn(&Observation<'_>) -> f64 + Send + Sync,
{
    fn exercise_value(&self, obs: &Observation<'_>) -> f64 {
        (self.f)(obs)
    }
}

impl<F> std::fmt::Debug for FnPayoff<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnPayoff")
    }
}
