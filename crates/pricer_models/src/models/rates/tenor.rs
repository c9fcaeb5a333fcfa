//! Tenor structure shared by the forward-rate models.
//!
//! Forward `L_i` accrues over `[T_i, T_{i+1}]` and fixes at `T_i`. The first
//! date is always zero, so `L_0` is fixed at the valuation date and the
//! front stub of any bond or numeraire is driven by an already-fixed rate.

use super::super::error::ModelError;

/// Reset/payment dates `0 = T_0 < T_1 < ... < T_n`.
#[derive(Debug, Clone, PartialEq)]
pub struct TenorStructure {
    dates: Vec<f64>,
}

impl TenorStructure {
    /// Build from explicit dates.
    ///
    /// # Errors
    ///
    /// `InvalidTenorStructure` unless the dates start at 0, have at least two
    /// entries and increase strictly.
    pub fn new(dates: Vec<f64>) -> Result<Self, ModelError> {
        if dates.len() < 2 {
            return Err(ModelError::InvalidTenorStructure(format!(
                "need at least two dates, got {}",
                dates.len()
            )));
        }
        if dates[0] != 0.0 {
            return Err(ModelError::InvalidTenorStructure(format!(
                "first date must be 0, got {}",
                dates[0]
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| !(w[1] > w[0]) || !w[1].is_finite()) {
            return Err(ModelError::InvalidTenorStructure(format!(
                "dates must increase strictly ({} then {})",
                w[0], w[1]
            )));
        }
        Ok(Self { dates })
    }

    /// Equally spaced dates `0, tau, 2 tau, ...` covering `horizon`.
    ///
    /// The last period is shortened when `horizon` is not a multiple of `tau`.
    pub fn uniform(horizon: f64, accrual: f64) -> Result<Self, ModelError> {
        if !(accrual > 0.0) || !accrual.is_finite() {
            return Err(ModelError::InvalidParameter {
                name: "accrual",
                value: accrual,
            });
        }
        if !(horizon > 0.0) || !horizon.is_finite() {
            return Err(ModelError::InvalidParameter {
                name: "horizon",
                value: horizon,
            });
        }
        let mut dates = vec![0.0];
        let mut k = 1usize;
        loop {
            let t = k as f64 * accrual;
            if t >= horizon - 1e-10 {
                dates.push(horizon);
                break;
            }
            dates.push(t);
            k += 1;
        }
        Self::new(dates)
    }

    /// All dates including 0.
    #[inline]
    pub fn dates(&self) -> &[f64] {
        &self.dates
    }

    /// Number of forward rates.
    #[inline]
    pub fn n_forwards(&self) -> usize {
        self.dates.len() - 1
    }

    /// Accrual fraction of forward `i`.
    #[inline]
    pub fn accrual(&self, i: usize) -> f64 {
        self.dates[i + 1] - self.dates[i]
    }

    /// Reset time of forward `i`.
    #[inline]
    pub fn reset(&self, i: usize) -> f64 {
        self.dates[i]
    }

    /// Reset times of every forward.
    pub fn resets(&self) -> &[f64] {
        &self.dates[..self.n_forwards()]
    }

    /// Final date.
    #[inline]
    pub fn end(&self) -> f64 {
        self.dates[self.dates.len() - 1]
    }

    /// Index of the first forward still alive at `t` (reset strictly after `t`).
    ///
    /// Equals `n_forwards()` once every forward has fixed.
    #[inline]
    pub fn first_live(&self, t: f64) -> usize {
        self.resets().partition_point(|&d| d <= t)
    }

    /// Index of the accrual period containing `t`.
    #[inline]
    fn current_period(&self, t: f64) -> usize {
        self.first_live(t).saturating_sub(1)
    }

    /// Bond price P(t, maturity) implied by the forwards.
    ///
    /// Partial periods accrue simply at the period's forward; maturities past
    /// the last date continue at the last forward.
    pub fn bond(&self, t: f64, maturity: f64, forwards: &[f64]) -> f64 {
        if maturity <= t {
            return 1.0;
        }
        let n = self.n_forwards();
        let mut price = 1.0;
        let mut cursor = t;
        let mut j = self.current_period(t);
        while cursor < maturity {
            let (rate, seg_end) = if j < n {
                (forwards[j], self.dates[j + 1].min(maturity))
            } else {
                (forwards[n - 1], maturity)
            };
            price /= 1.0 + (seg_end - cursor) * rate;
            cursor = seg_end;
            j += 1;
        }
        price
    }

    /// Discretely rebalanced bank account (spot measure numeraire).
    ///
    /// `N(t) = prod_{j<k} (1 + tau_j L_j) * (1 + tau_k L_k) / (1 + (T_{k+1} - t) L_k)`
    /// for `t` in period `k`; fixed forwards keep their fixing in the state.
    pub fn spot_numeraire(&self, t: f64, forwards: &[f64]) -> f64 {
        let k = self.current_period(t).min(self.n_forwards() - 1);
        let rolled: f64 = (0..=k).map(|j| 1.0 + self.accrual(j) * forwards[j]).product();
        let stub = 1.0 + (self.dates[k + 1] - t).max(0.0) * forwards[k];
        rolled / stub
    }

    /// `P(t, T_n)`, the terminal measure numeraire.
    pub fn terminal_numeraire(&self, t: f64, forwards: &[f64]) -> f64 {
        self.bond(t, self.end(), forwards)
    }
}
