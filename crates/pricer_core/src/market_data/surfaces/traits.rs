//! Swaption volatility surface trait definition.

use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Volatility quoted on an (option expiry, underlying swap tenor) grid.
///
/// Quotes are lognormal (Black) volatilities. Models that need a normal
/// volatility convert with the forward level themselves.
///
/// ```
/// use pricer_core::market_data::surfaces::{SwaptionVolSurface, FlatVol};
///
/// let surface = FlatVol::new(0.20_f64);
/// assert_eq!(surface.volatility(1.0, 5.0).unwrap(), 0.20);
/// ```
pub trait SwaptionVolSurface<T: Float> {
    /// Volatility for an option expiring at `expiry` on a swap of length `tenor`.
    fn volatility(&self, expiry: T, tenor: T) -> Result<T, MarketDataError>;

    /// Range of quoted expiries.
    fn expiry_domain(&self) -> (T, T);

    /// Range of quoted tenors.
    fn tenor_domain(&self) -> (T, T);
}

/// Shared argument check for surface lookups.
pub(crate) fn check_query<T: Float>(expiry: T, tenor: T) -> Result<(), MarketDataError> {
    if !(expiry >= T::zero()) || !expiry.is_finite() {
        return Err(MarketDataError::InvalidExpiry {
            expiry: expiry.to_f64().unwrap_or(f64::NAN),
        });
    }
    if !(tenor > T::zero()) || !tenor.is_finite() {
        return Err(MarketDataError::InvalidExpiry {
            expiry: tenor.to_f64().unwrap_or(f64::NAN),
        });
    }
    Ok(())
}
