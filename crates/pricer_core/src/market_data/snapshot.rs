//! Immutable market snapshot and the shifts applied to it for risk.
//!
//! A [`MarketSnapshot`] pairs a pillar zero curve with a swaption
//! volatility grid. Shifted copies are produced by [`MarketSnapshot::shifted`];
//! the original is never mutated, so base and bumped valuations can run
//! side by side.

use super::curves::{CurveInterpolation, InterpolatedCurve, YieldCurve};
use super::error::MarketDataError;
use super::provider::MarketDataProvider;
use super::surfaces::{SwaptionVolGrid, SwaptionVolSurface};
use serde::{Deserialize, Serialize};

/// How a shift size is applied to a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    /// `q + h`
    #[default]
    Additive,
    /// `q * (1 + h)`
    Relative,
}

impl ShiftKind {
    /// Apply a shift of size `h` to quote `q`.
    #[inline]
    pub fn apply(self, q: f64, h: f64) -> f64 {
        match self {
            ShiftKind::Additive => q + h,
            ShiftKind::Relative => q * (1.0 + h),
        }
    }
}

/// Which quotes of the snapshot a shift touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum MarketNode {
    /// One zero-rate pillar.
    ZeroRate {
        /// Pillar index
        pillar: usize,
    },
    /// Every zero-rate pillar.
    ParallelRate,
    /// One volatility quote.
    Vol {
        /// Expiry index
        expiry: usize,
        /// Tenor index
        tenor: usize,
    },
    /// Every volatility quote.
    ParallelVol,
}

/// Zero curve plus swaption volatility grid.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::{MarketDataProvider, MarketNode, MarketSnapshot, ShiftKind};
///
/// let market = MarketSnapshot::flat(0.03, 0.20).unwrap();
/// let up = market.shifted(MarketNode::ParallelRate, ShiftKind::Additive, 0.0001).unwrap();
///
/// assert!(up.discount_factor(5.0).unwrap() < market.discount_factor(5.0).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    curve: InterpolatedCurve<f64>,
    vols: SwaptionVolGrid<f64>,
}

impl MarketSnapshot {
    /// Pair a curve with a volatility grid.
    pub fn new(curve: InterpolatedCurve<f64>, vols: SwaptionVolGrid<f64>) -> Self {
        Self { curve, vols }
    }

    /// Single-pillar curve and single-node grid.
    pub fn flat(rate: f64, vol: f64) -> Result<Self, MarketDataError> {
        let curve = InterpolatedCurve::new(&[1.0], &[rate], CurveInterpolation::Linear)?;
        let vols = SwaptionVolGrid::new(&[1.0], &[1.0], &[&[vol][..]])?;
        Ok(Self::new(curve, vols))
    }

    /// Discount curve.
    pub fn curve(&self) -> &InterpolatedCurve<f64> {
        &self.curve
    }

    /// Volatility grid.
    pub fn vols(&self) -> &SwaptionVolGrid<f64> {
        &self.vols
    }

    /// Copy of the snapshot with `node` shifted by `size` under `kind`.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` for a pillar or node index outside the data, and
    /// `InvalidShift` for a non-finite size or a shift producing a negative
    /// volatility.
    pub fn shifted(
        &self,
        node: MarketNode,
        kind: ShiftKind,
        size: f64,
    ) -> Result<Self, MarketDataError> {
        if !size.is_finite() {
            return Err(MarketDataError::InvalidShift(format!(
                "shift size must be finite, got {size}"
            )));
        }

        match node {
            MarketNode::ZeroRate { pillar } => {
                let n = self.curve.tenors().len();
                if pillar >= n {
                    return Err(MarketDataError::OutOfBounds {
                        x: pillar as f64,
                        min: 0.0,
                        max: (n - 1) as f64,
                    });
                }
                let curve = self
                    .curve
                    .map_rates(|i, r| if i == pillar { kind.apply(r, size) } else { r })?;
                Ok(Self::new(curve, self.vols.clone()))
            }
            MarketNode::ParallelRate => {
                let curve = self.curve.map_rates(|_, r| kind.apply(r, size))?;
                Ok(Self::new(curve, self.vols.clone()))
            }
            MarketNode::Vol { expiry, tenor } => {
                if self.vols.node(expiry, tenor).is_none() {
                    return Err(MarketDataError::OutOfBounds {
                        x: (expiry * self.vols.tenors().len() + tenor) as f64,
                        min: 0.0,
                        max: (self.vols.expiries().len() * self.vols.tenors().len() - 1) as f64,
                    });
                }
                let vols = self.vols_shifted(|i, j| (i, j) == (expiry, tenor), kind, size)?;
                Ok(Self::new(self.curve.clone(), vols))
            }
            MarketNode::ParallelVol => {
                let vols = self.vols_shifted(|_, _| true, kind, size)?;
                Ok(Self::new(self.curve.clone(), vols))
            }
        }
    }

    fn vols_shifted<P>(
        &self,
        touches: P,
        kind: ShiftKind,
        size: f64,
    ) -> Result<SwaptionVolGrid<f64>, MarketDataError>
    where
        P: Fn(usize, usize) -> bool,
    {
        self.vols
            .map_nodes(|i, j, v| if touches(i, j) { kind.apply(v, size) } else { v })
            .map_err(|e| match e {
                MarketDataError::InvalidVolatility { vol } => MarketDataError::InvalidShift(
                    format!("shift leaves a negative volatility ({vol})"),
                ),
                other => other,
            })
    }
}

impl MarketDataProvider for MarketSnapshot {
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        self.curve.discount_factor(t)
    }

    fn volatility(&self, expiry: f64, tenor: f64) -> Result<f64, MarketDataError> {
        self.vols.volatility(expiry, tenor)
    }
}

/// Raw quotes as they appear in a run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuotes {
    /// Zero curve pillar tenors (years).
    pub tenors: Vec<f64>,
    /// Continuously compounded zero rates at `tenors`.
    pub zero_rates: Vec<f64>,
    /// Curve interpolation.
    #[serde(default)]
    pub interpolation: CurveInterpolation,
    /// Volatility grid expiries.
    pub vol_expiries: Vec<f64>,
    /// Volatility grid swap tenors.
    pub vol_tenors: Vec<f64>,
    /// Quotes, one row per expiry.
    pub vols: Vec<Vec<f64>>,
}

impl TryFrom<&MarketQuotes> for MarketSnapshot {
    type Error = MarketDataError;

    fn try_from(q: &MarketQuotes) -> Result<Self, Self::Error> {
        let curve = InterpolatedCurve::new(&q.tenors, &q.zero_rates, q.interpolation)?;
        let rows: Vec<&[f64]> = q.vols.iter().map(Vec::as_slice).collect();
        let vols = SwaptionVolGrid::new(&q.vol_expiries, &q.vol_tenors, &rows)?;
        Ok(Self::new(curve, vols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn market() -> MarketSnapshot {
        let q = MarketQuotes {
            tenors: vec![1.0, 2.0, 5.0, 10.0],
            zero_rates: vec![0.02, 0.025, 0.03, 0.032],
            interpolation: CurveInterpolation::Linear,
            vol_expiries: vec![1.0, 5.0],
            vol_tenors: vec![1.0, 5.0],
            vols: vec![vec![0.25, 0.22], vec![0.21, 0.19]],
        };
        MarketSnapshot::try_from(&q).unwrap()
    }

    #[test]
    fn test_pillar_shift_is_local() {
        let base = market();
        let up = base
            .shifted(MarketNode::ZeroRate { pillar: 2 }, ShiftKind::Additive, 0.001)
            .unwrap();
        assert_relative_eq!(up.curve().rates()[2], 0.031, epsilon = 1e-15);
        assert_eq!(
            up.discount_factor(1.5).unwrap(),
            base.discount_factor(1.5).unwrap()
        );
        assert!(up.discount_factor(5.0).unwrap() < base.discount_factor(5.0).unwrap());
    }

    #[test]
    fn test_relative_vol_shift() {
        let up = market()
            .shifted(MarketNode::ParallelVol, ShiftKind::Relative, 0.01)
            .unwrap();
        assert_relative_eq!(up.vols().node(1, 1).unwrap(), 0.19 * 1.01, epsilon = 1e-15);
    }

    #[test]
    fn test_single_vol_node_shift() {
        let up = market()
            .shifted(MarketNode::Vol { expiry: 0, tenor: 1 }, ShiftKind::Additive, 0.01)
            .unwrap();
        assert_relative_eq!(up.vols().node(0, 1).unwrap(), 0.23, epsilon = 1e-15);
        assert_relative_eq!(up.vols().node(0, 0).unwrap(), 0.25, epsilon = 1e-15);
    }

    #[test]
    fn test_out_of_range_pillar() {
        let err = market()
            .shifted(MarketNode::ZeroRate { pillar: 9 }, ShiftKind::Additive, 0.001)
            .unwrap_err();
        assert!(matches!(err, MarketDataError::OutOfBounds { .. }));
    }

    #[test]
    fn test_negative_vol_after_shift() {
        let err = market()
            .shifted(MarketNode::ParallelVol, ShiftKind::Additive, -1.0)
            .unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidShift(_)));
    }

    #[test]
    fn test_non_finite_shift() {
        let err = market()
            .shifted(MarketNode::ParallelRate, ShiftKind::Additive, f64::NAN)
            .unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidShift(_)));
    }

    #[test]
    fn test_quotes_from_toml() {
        let text = r#"
            tenors = [1.0, 5.0]
            zero_rates = [0.02, 0.03]
            interpolation = "log_linear"
            vol_expiries = [1.0]
            vol_tenors = [1.0, 5.0]
            vols = [[0.2, 0.18]]
        "#;
        let q: MarketQuotes = toml::from_str(text).unwrap();
        let m = MarketSnapshot::try_from(&q).unwrap();
        assert_eq!(m.curve().method(), CurveInterpolation::LogLinear);
        assert_relative_eq!(m.volatility(1.0, 3.0).unwrap(), 0.19, epsilon = 1e-12);
    }

    #[test]
    fn test_node_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            target: MarketNode,
        }
        let w: Wrapper = toml::from_str("target = { node = \"zero_rate\", pillar = 3 }").unwrap();
        assert_eq!(w.target, MarketNode::ZeroRate { pillar: 3 });
    }
}
