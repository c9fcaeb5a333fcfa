//! Grid of swaption volatility quotes.

use super::traits::{check_query, SwaptionVolSurface};
use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Swaption volatilities on an expiry × tenor grid.
///
/// Lookups interpolate bilinearly inside the grid and clamp to the nearest
/// edge outside it. A single row or column degenerates to 1-D linear
/// interpolation along the other axis.
///
/// # Grid Layout
///
/// `vols[expiry_idx][tenor_idx]`, stored row-major.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::surfaces::{SwaptionVolSurface, SwaptionVolGrid};
///
/// let grid = SwaptionVolGrid::new(
///     &[1.0, 2.0],
///     &[1.0, 5.0],
///     &[&[0.20, 0.18][..], &[0.22, 0.20][..]],
/// ).unwrap();
///
/// let vol: f64 = grid.volatility(1.5, 3.0).unwrap();
/// assert!((vol - 0.20).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SwaptionVolGrid<T: Float> {
    expiries: Vec<T>,
    tenors: Vec<T>,
    vols: Vec<T>,
}

fn check_axis<T: Float>(axis: &'static str, values: &[T]) -> Result<(), MarketDataError> {
    if values.is_empty() {
        return Err(MarketDataError::InsufficientData { got: 0, need: 1 });
    }
    for (i, &v) in values.iter().enumerate() {
        let vf = v.to_f64().unwrap_or(f64::NAN);
        if !v.is_finite() || v < T::zero() {
            return Err(MarketDataError::InvalidExpiry { expiry: vf });
        }
        if i > 0 && v <= values[i - 1] {
            return Err(MarketDataError::NonMonotonicAxis { axis, value: vf });
        }
    }
    Ok(())
}

/// Position of `x` on `axis` as (lower index, weight of the upper node).
fn locate<T: Float>(axis: &[T], x: T) -> (usize, T) {
    let n = axis.len();
    if n == 1 || x <= axis[0] {
        return (0, T::zero());
    }
    if x >= axis[n - 1] {
        return (n - 2, T::one());
    }
    let i = axis.partition_point(|&a| a <= x) - 1;
    let w = (x - axis[i]) / (axis[i + 1] - axis[i]);
    (i, w)
}

impl<T: Float> SwaptionVolGrid<T> {
    /// Construct a grid from axis values and rows of quotes.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` when an axis is empty or a row has the wrong length
    /// - `NonMonotonicAxis` when an axis is not strictly increasing
    /// - `InvalidVolatility` for a negative or non-finite quote
    pub fn new(expiries: &[T], tenors: &[T], vols: &[&[T]]) -> Result<Self, MarketDataError> {
        check_axis("expiry", expiries)?;
        check_axis("tenor", tenors)?;
        if vols.len() != expiries.len() {
            return Err(MarketDataError::InsufficientData {
                got: vols.len(),
                need: expiries.len(),
            });
        }

        let mut flat = Vec::with_capacity(expiries.len() * tenors.len());
        for row in vols {
            if row.len() != tenors.len() {
                return Err(MarketDataError::InsufficientData {
                    got: row.len(),
                    need: tenors.len(),
                });
            }
            for &v in row.iter() {
                if !v.is_finite() || v < T::zero() {
                    return Err(MarketDataError::InvalidVolatility {
                        vol: v.to_f64().unwrap_or(f64::NAN),
                    });
                }
                flat.push(v);
            }
        }

        Ok(Self {
            expiries: expiries.to_vec(),
            tenors: tenors.to_vec(),
            vols: flat,
        })
    }

    /// Expiry axis.
    pub fn expiries(&self) -> &[T] {
        &self.expiries
    }

    /// Tenor axis.
    pub fn tenors(&self) -> &[T] {
        &self.tenors
    }

    /// Quote at grid node `(i, j)`.
    pub fn node(&self, expiry_idx: usize, tenor_idx: usize) -> Option<T> {
        if expiry_idx >= self.expiries.len() || tenor_idx >= self.tenors.len() {
            return None;
        }
        Some(self.vols[expiry_idx * self.tenors.len() + tenor_idx])
    }

    /// Return a copy with `f(expiry_idx, tenor_idx, vol)` applied to every node.
    pub fn map_nodes<F>(&self, mut f: F) -> Result<Self, MarketDataError>
    where
        F: FnMut(usize, usize, T) -> T,
    {
        let nt = self.tenors.len();
        let rows: Vec<Vec<T>> = (0..self.expiries.len())
            .map(|i| (0..nt).map(|j| f(i, j, self.vols[i * nt + j])).collect())
            .collect();
        let row_refs: Vec<&[T]> = rows.iter().map(Vec::as_slice).collect();
        Self::new(&self.expiries, &self.tenors, &row_refs)
    }

    fn at(&self, i: usize, j: usize) -> T {
        self.vols[i * self.tenors.len() + j]
    }
}

impl<T: Float> SwaptionVolSurface<T> for SwaptionVolGrid<T> {
    fn volatility(&self, expiry: T, tenor: T) -> Result<T, MarketDataError> {
        check_query(expiry, tenor)?;

        let (i, wx) = locate(&self.expiries, expiry);
        let (j, wy) = locate(&self.tenors, tenor);
        let i1 = (i + 1).min(self.expiries.len() - 1);
        let j1 = (j + 1).min(self.tenors.len() - 1);

        let lower = self.at(i, j) * (T::one() - wy) + self.at(i, j1) * wy;
        let upper = self.at(i1, j) * (T::one() - wy) + self.at(i1, j1) * wy;
        Ok(lower * (T::one() - wx) + upper * wx)
    }

    fn expiry_domain(&self) -> (T, T) {
        (self.expiries[0], self.expiries[self.expiries.len() - 1])
    }

    fn tenor_domain(&self) -> (T, T) {
        (self.tenors[0], self.tenors[self.tenors.len() - 1])
    }
}
