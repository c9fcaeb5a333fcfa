//! Least-Squares Monte Carlo pricing of early-exercise products.
//!
//! ```text
//! LsmPricer
//! ├── PathSimulator      (ensemble + numeraire, optional control sample)
//! ├── CashflowProjector  (payoff per path per exercise date, rebased)
//! ├── RegressionEngine   (continuation fit on in-the-money paths)
//! │   └── RegressionBasis
//! └── PriceEstimate      (mean, standard error, path count)
//! ```
//!
//! Exercise dates are processed strictly latest first. Within a date, the
//! payoff evaluation, the in-the-money scan and the exercise comparison run
//! in parallel over paths; the regression itself is a single reduction.

mod basis;
mod error;
mod pricer;
mod projector;
mod regression;

pub use basis::{BasisFamily, RegressionBasis, MAX_DEGREE};
pub use error::{PricingError, PricingWarning};
pub use pricer::{
    ExerciseDiagnostics, ExerciseSchedule, LsmPricer, LsmResult, PriceEstimate,
};
pub use projector::{CashflowPath, CashflowProjector, ExerciseValues};
pub use regression::{ContinuationEstimate, DegenerateRegression, RegressionEngine};
