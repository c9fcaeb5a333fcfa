//! Read-only market data contract consumed by model construction.

use super::curves::YieldCurve;
use super::error::MarketDataError;
use super::surfaces::SwaptionVolSurface;

/// Market data queried when a rate model is initialised.
///
/// Implementations are read-only and must be safe to share across threads;
/// the pricing loop never calls back into the provider.
pub trait MarketDataProvider: Send + Sync {
    /// Discount factor P(0, t).
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError>;

    /// Simply compounded forward rate over `[t1, t2]`:
    /// `(P(0,t1) / P(0,t2) - 1) / (t2 - t1)`.
    fn forward_rate(&self, t1: f64, t2: f64) -> Result<f64, MarketDataError> {
        let tau = t2 - t1;
        if !(tau > 0.0) {
            return Err(MarketDataError::InvalidMaturity { t: tau });
        }
        let p1 = self.discount_factor(t1)?;
        let p2 = self.discount_factor(t2)?;
        Ok((p1 / p2 - 1.0) / tau)
    }

    /// Lognormal swaption volatility for (expiry, tenor).
    fn volatility(&self, expiry: f64, tenor: f64) -> Result<f64, MarketDataError>;
}

/// Any curve paired with any surface is a provider.
#[derive(Debug, Clone)]
pub struct CurveAndSurface<C, S> {
    /// Discount curve.
    pub curve: C,
    /// Swaption volatility surface.
    pub surface: S,
}

impl<C, S> MarketDataProvider for CurveAndSurface<C, S>
where
    C: YieldCurve<f64> + Send + Sync,
    S: SwaptionVolSurface<f64> + Send + Sync,
{
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        self.curve.discount_factor(t)
    }

    fn volatility(&self, expiry: f64, tenor: f64) -> Result<f64, MarketDataError> {
        self.surface.volatility(expiry, tenor)
    }
}
