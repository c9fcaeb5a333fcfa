//! Yield curve trait definition.

use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Generic yield curve trait for discount factor and rate calculations.
///
/// Implementations only provide [`discount_factor`](YieldCurve::discount_factor);
/// the rate accessors are derived from it.
///
/// # Invariants
///
/// - D(0) = 1
/// - D(t) > 0 for all t >= 0
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{YieldCurve, FlatCurve};
///
/// let curve = FlatCurve::new(0.05_f64);
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - 0.951229).abs() < 1e-5);
///
/// let fwd = curve.instantaneous_forward(3.0).unwrap();
/// assert!((fwd - 0.05).abs() < 1e-8);
/// ```
pub trait YieldCurve<T: Float> {
    /// Discount factor D(t) for maturity `t` (years, `t >= 0`).
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError>;

    /// Continuously compounded zero rate `r(t) = -ln D(t) / t`.
    ///
    /// At `t = 0` the short end is returned as the instantaneous forward.
    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(f64::NAN),
            });
        }
        if t == T::zero() {
            return self.instantaneous_forward(t);
        }
        let df = self.discount_factor(t)?;
        Ok(-df.ln() / t)
    }

    /// Continuously compounded forward rate between `t1` and `t2`.
    fn forward_rate(&self, t1: T, t2: T) -> Result<T, MarketDataError> {
        let dt = t2 - t1;
        if dt <= T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: dt.to_f64().unwrap_or(f64::NAN),
            });
        }
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok(-(df2 / df1).ln() / dt)
    }

    /// Instantaneous forward rate f(0, t).
    ///
    /// Central difference of `-ln D` with a one-sided stencil at the origin.
    fn instantaneous_forward(&self, t: T) -> Result<T, MarketDataError> {
        let h = T::from(1e-5).unwrap_or_else(T::epsilon);
        let lo = if t > h { t - h } else { T::zero() };
        let hi = t + h;
        self.forward_rate(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct LinearRateCurve;

    // r(t) = 0.01 + 0.002 t  =>  f(t) = 0.01 + 0.004 t
    impl YieldCurve<f64> for LinearRateCurve {
        fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
            if t < 0.0 {
                return Err(MarketDataError::InvalidMaturity { t });
            }
            Ok((-(0.01 + 0.002 * t) * t).exp())
        }
    }

    #[test]
    fn test_zero_rate_from_discount_factor() {
        let r = LinearRateCurve.zero_rate(2.0).unwrap();
        assert_relative_eq!(r, 0.014, epsilon = 1e-12);
    }

    #[test]
    fn test_instantaneous_forward_matches_derivative() {
        let f = LinearRateCurve.instantaneous_forward(2.5).unwrap();
        assert_relative_eq!(f, 0.02, epsilon = 1e-8);
        let f0 = LinearRateCurve.instantaneous_forward(0.0).unwrap();
        assert_relative_eq!(f0, 0.01, epsilon = 1e-6);
    }

    #[test]
    fn test_forward_rate_rejects_reversed_interval() {
        assert!(matches!(
            LinearRateCurve.forward_rate(2.0, 1.0),
            Err(MarketDataError::InvalidMaturity { .. })
        ));
    }

    #[test]
    fn test_negative_maturity_rejected() {
        assert!(LinearRateCurve.zero_rate(-1.0).is_err());
    }
}
