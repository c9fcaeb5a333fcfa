//! Pillar-based yield curve.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Interpolation method for yield curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveInterpolation {
    /// Linear interpolation on zero rates.
    #[default]
    Linear,

    /// Linear interpolation of `ln D(t)` (piecewise-constant forwards).
    LogLinear,
}

/// Yield curve defined by zero rates at pillar tenors.
///
/// Rates are flat-extrapolated on both sides, so the curve is defined for
/// every `t >= 0`. Pillars can be shifted individually, which is how the
/// risk engine applies key-rate bumps.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{YieldCurve, InterpolatedCurve, CurveInterpolation};
///
/// let curve = InterpolatedCurve::new(
///     &[0.5, 1.0, 2.0, 5.0],
///     &[0.02, 0.025, 0.03, 0.035],
///     CurveInterpolation::Linear,
/// ).unwrap();
///
/// let r: f64 = curve.zero_rate(1.5).unwrap();
/// assert!((r - 0.0275).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedCurve<T: Float> {
    tenors: Vec<T>,
    rates: Vec<T>,
    method: CurveInterpolation,
}

impl<T: Float> InterpolatedCurve<T> {
    /// Construct a curve from pillar tenors and zero rates.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` when no pillar is given or the lengths differ
    /// - `InvalidMaturity` for a non-positive tenor
    /// - `NonMonotonicAxis` when tenors are not strictly increasing
    /// - `NonFinite` for a NaN/Inf rate
    pub fn new(
        tenors: &[T],
        rates: &[T],
        method: CurveInterpolation,
    ) -> Result<Self, MarketDataError> {
        if tenors.is_empty() {
            return Err(MarketDataError::InsufficientData { got: 0, need: 1 });
        }
        if tenors.len() != rates.len() {
            return Err(MarketDataError::InsufficientData {
                got: rates.len(),
                need: tenors.len(),
            });
        }

        for (i, &t) in tenors.iter().enumerate() {
            let tf = t.to_f64().unwrap_or(f64::NAN);
            if !(t > T::zero()) {
                return Err(MarketDataError::InvalidMaturity { t: tf });
            }
            if i > 0 && t <= tenors[i - 1] {
                return Err(MarketDataError::NonMonotonicAxis {
                    axis: "tenor",
                    value: tf,
                });
            }
        }
        if let Some(bad) = rates.iter().find(|r| !r.is_finite()) {
            return Err(MarketDataError::NonFinite {
                what: "zero rate",
                value: bad.to_f64().unwrap_or(f64::NAN),
            });
        }

        Ok(Self {
            tenors: tenors.to_vec(),
            rates: rates.to_vec(),
            method,
        })
    }

    /// Pillar tenors.
    #[inline]
    pub fn tenors(&self) -> &[T] {
        &self.tenors
    }

    /// Pillar zero rates.
    #[inline]
    pub fn rates(&self) -> &[T] {
        &self.rates
    }

    /// Interpolation method.
    #[inline]
    pub fn method(&self) -> CurveInterpolation {
        self.method
    }

    /// Return a copy with `f` applied to every pillar rate.
    pub fn map_rates<F>(&self, mut f: F) -> Result<Self, MarketDataError>
    where
        F: FnMut(usize, T) -> T,
    {
        let rates: Vec<T> = self
            .rates
            .iter()
            .enumerate()
            .map(|(i, &r)| f(i, r))
            .collect();
        Self::new(&self.tenors, &rates, self.method)
    }

    /// Index `i` such that `tenors[i] <= t < tenors[i + 1]`, or `None`
    /// outside the pillar range.
    fn bracket(&self, t: T) -> Option<usize> {
        let n = self.tenors.len();
        if n < 2 || t < self.tenors[0] || t >= self.tenors[n - 1] {
            return None;
        }
        let upper = self.tenors.partition_point(|&x| x <= t);
        Some(upper - 1)
    }

    fn rate_at(&self, t: T) -> T {
        let last = self.rates.len() - 1;
        match self.bracket(t) {
            None if t < self.tenors[0] => self.rates[0],
            None => self.rates[last],
            Some(i) => {
                let (t0, t1) = (self.tenors[i], self.tenors[i + 1]);
                let (r0, r1) = (self.rates[i], self.rates[i + 1]);
                let w = (t - t0) / (t1 - t0);
                match self.method {
                    CurveInterpolation::Linear => r0 + w * (r1 - r0),
                    CurveInterpolation::LogLinear => {
                        let log_df = -(r0 * t0) - w * (r1 * t1 - r0 * t0);
                        -log_df / t
                    }
                }
            }
        }
    }
}

impl<T: Float> YieldCurve<T> for InterpolatedCurve<T> {
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() || !t.is_finite() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok((-self.rate_at(t) * t).exp())
    }

    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(self.rate_at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_curve(method: CurveInterpolation) -> InterpolatedCurve<f64> {
        InterpolatedCurve::new(&[1.0, 2.0, 5.0], &[0.02, 0.03, 0.04], method).unwrap()
    }

    #[test]
    fn test_pillars_reprice_exactly() {
        for method in [CurveInterpolation::Linear, CurveInterpolation::LogLinear] {
            let curve = sample_curve(method);
            assert_relative_eq!(curve.zero_rate(2.0).unwrap(), 0.03, epsilon = 1e-14);
            assert_relative_eq!(
                curve.discount_factor(5.0).unwrap(),
                (-0.2_f64).exp(),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn test_flat_extrapolation() {
        let curve = sample_curve(CurveInterpolation::Linear);
        assert_eq!(curve.zero_rate(0.25).unwrap(), 0.02);
        assert_eq!(curve.zero_rate(30.0).unwrap(), 0.04);
        assert_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_log_linear_gives_constant_forward_between_pillars() {
        let curve = sample_curve(CurveInterpolation::LogLinear);
        let f1 = curve.forward_rate(2.2, 2.6).unwrap();
        let f2 = curve.forward_rate(3.5, 4.9).unwrap();
        assert_relative_eq!(f1, f2, epsilon = 1e-10);
        // (0.04*5 - 0.03*2) / 3
        assert_relative_eq!(f1, 0.14 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_unsorted_tenors() {
        let err = InterpolatedCurve::new(&[1.0, 1.0], &[0.01, 0.02], CurveInterpolation::Linear)
            .unwrap_err();
        assert!(matches!(err, MarketDataError::NonMonotonicAxis { .. }));
    }

    #[test]
    fn test_rejects_non_finite_rate() {
        let err = InterpolatedCurve::new(&[1.0], &[f64::NAN], CurveInterpolation::Linear)
            .unwrap_err();
        assert!(matches!(err, MarketDataError::NonFinite { .. }));
    }

    #[test]
    fn test_map_rates_shifts_single_pillar() {
        let curve = sample_curve(CurveInterpolation::Linear);
        let bumped = curve
            .map_rates(|i, r| if i == 1 { r + 0.0001 } else { r })
            .unwrap();
        assert_relative_eq!(bumped.rates()[1], 0.0301, epsilon = 1e-15);
        assert_eq!(bumped.rates()[0], 0.02);
    }
}
