//! Bermudan swaption.
//!
//! The holder may, on any exercise date, enter the remainder of an
//! underlying fixed-for-floating swap.
//!
//! # Types
//!
//! - **Payer**: pay fixed, receive floating
//! - **Receiver**: receive fixed, pay floating
//!
//! The floating leg is valued at par, `P(t, s) - P(t, T_end)` with `s` the
//! start of the current accrual period (or `t` once inside it), and the
//! fixed leg as `K * annuity`. The exercise value is floored at zero.
//!
//! # Example
//!
//! ```
//! use pricer_models::instruments::rates::{BermudanSwaption, SwaptionType};
//!
//! // 1y-into-5y annual Bermudan, exercisable on every reset.
//! let swaption = BermudanSwaption::coterminal(
//!     SwaptionType::Payer,
//!     1_000_000.0,
//!     0.03,
//!     1.0,
//!     6.0,
//!     1.0,
//! )
//! .unwrap();
//!
//! assert_eq!(swaption.exercise_dates(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::instruments::error::InstrumentError;
use crate::instruments::payoff::{Observation, Payoff, DATE_TOLERANCE};

/// Swaption type (payer or receiver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwaptionType {
    /// Right to enter a payer swap (pay fixed, receive floating).
    Payer,
    /// Right to enter a receiver swap (receive fixed, pay floating).
    Receiver,
}

impl fmt::Display for SwaptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwaptionType::Payer => write!(f, "Payer"),
            SwaptionType::Receiver => write!(f, "Receiver"),
        }
    }
}

/// Bermudan swaption on a fixed-for-floating swap.
#[derive(Debug, Clone, PartialEq)]
pub struct BermudanSwaption {
    swaption_type: SwaptionType,
    notional: f64,
    strike: f64,
    /// Swap start followed by fixed-leg payment dates.
    swap_dates: Vec<f64>,
    exercise_dates: Vec<f64>,
}

impl BermudanSwaption {
    /// Create a swaption.
    ///
    /// `swap_dates` is the swap start followed by every payment date.
    /// `exercise_dates` must be strictly increasing and fall strictly before
    /// the swap end.
    pub fn new(
        swaption_type: SwaptionType,
        notional: f64,
        strike: f64,
        swap_dates: Vec<f64>,
        exercise_dates: Vec<f64>,
    ) -> Result<Self, InstrumentError> {
        if !(notional > 0.0) || !notional.is_finite() {
            return Err(InstrumentError::InvalidNotional { notional });
        }
        if !strike.is_finite() {
            return Err(InstrumentError::InvalidStrike { strike });
        }
        check_increasing("swap dates", &swap_dates, 2)?;
        check_increasing("exercise dates", &exercise_dates, 1)?;

        let end = swap_dates[swap_dates.len() - 1];
        if exercise_dates.iter().any(|&e| e < 0.0 || e >= end) {
            return Err(InstrumentError::InvalidSchedule {
                message: format!("exercise dates must lie in [0, {end})"),
            });
        }

        Ok(Self {
            swaption_type,
            notional,
            strike,
            swap_dates,
            exercise_dates,
        })
    }

    /// Swap from `start` to `end` with payments every `period`, exercisable
    /// at the start of every period.
    pub fn coterminal(
        swaption_type: SwaptionType,
        notional: f64,
        strike: f64,
        start: f64,
        end: f64,
        period: f64,
    ) -> Result<Self, InstrumentError> {
        if !(period > 0.0) || !(end > start) || !start.is_finite() || !end.is_finite() {
            return Err(InstrumentError::InvalidSchedule {
                message: format!("cannot roll {start}..{end} by {period}"),
            });
        }
        let mut dates = vec![start];
        let mut k = 1usize;
        loop {
            let t = start + k as f64 * period;
            if t >= end - DATE_TOLERANCE {
                dates.push(end);
                break;
            }
            dates.push(t);
            k += 1;
        }
        let exercise = dates[..dates.len() - 1].to_vec();
        Self::new(swaption_type, notional, strike, dates, exercise)
    }

    /// Payer or receiver.
    pub fn swaption_type(&self) -> SwaptionType {
        self.swaption_type
    }

    /// Notional.
    pub fn notional(&self) -> f64 {
        self.notional
    }

    /// Fixed rate.
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Swap start and payment dates.
    pub fn swap_dates(&self) -> &[f64] {
        &self.swap_dates
    }

    /// Exercise dates.
    pub fn exercise_dates(&self) -> &[f64] {
        &self.exercise_dates
    }

    /// Value of the remaining payer swap at `obs.time` (not floored).
    pub fn underlying_value(&self, obs: &Observation<'_>) -> f64 {
        let d = &self.swap_dates;
        let end = d[d.len() - 1];
        if obs.time >= end - DATE_TOLERANCE {
            return 0.0;
        }
        let first = d.partition_point(|&x| x <= obs.time + DATE_TOLERANCE);
        let float_start = if first == 0 { d[0] } else { d[first - 1].max(obs.time) };
        let floating = obs.zero_bond(float_start) - obs.zero_bond(end);
        let fixed = self.strike * obs.annuity(d);
        self.notional * (floating - fixed)
    }
}

fn check_increasing(what: &str, v: &[f64], min_len: usize) -> Result<(), InstrumentError> {
    if v.len() < min_len {
        return Err(InstrumentError::InvalidSchedule {
            message: format!("{what}: need at least {min_len}, got {}", v.len()),
        });
    }
    if v.iter().any(|x| !x.is_finite()) || v.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(InstrumentError::InvalidSchedule {
            message: format!("{what} must be finite and strictly increasing"),
        });
    }
    Ok(())
}

impl Payoff for BermudanSwaption {
    fn exercise_value(&self, obs: &Observation<'_>) -> f64 {
        let payer = self.underlying_value(obs);
        match self.swaption_type {
            SwaptionType::Payer => payer.max(0.0),
            SwaptionType::Receiver => (-payer).max(0.0),
        }
    }
}
