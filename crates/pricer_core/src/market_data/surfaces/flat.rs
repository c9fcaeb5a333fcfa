//! Constant volatility surface.

use super::traits::{check_query, SwaptionVolSurface};
use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// The same volatility for every expiry and tenor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatVol<T: Float> {
    sigma: T,
}

impl<T: Float> FlatVol<T> {
    /// Construct a flat surface.
    #[inline]
    pub fn new(sigma: T) -> Self {
        Self { sigma }
    }

    /// The quoted volatility.
    #[inline]
    pub fn sigma(&self) -> T {
        self.sigma
    }
}

impl<T: Float> SwaptionVolSurface<T> for FlatVol<T> {
    fn volatility(&self, expiry: T, tenor: T) -> Result<T, MarketDataError> {
        check_query(expiry, tenor)?;
        Ok(self.sigma)
    }

    fn expiry_domain(&self) -> (T, T) {
        (T::zero(), T::infinity())
    }

    fn tenor_domain(&self) -> (T, T) {
        (T::zero(), T::infinity())
    }
}
