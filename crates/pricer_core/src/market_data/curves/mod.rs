//! Yield curve abstractions.
//!
//! - [`YieldCurve`]: discount factor and rate contract
//! - [`FlatCurve`]: constant rate curve
//! - [`InterpolatedCurve`]: pillar-based zero curve with [`CurveInterpolation`]

mod flat;
mod interpolated;
mod traits;

pub use flat::FlatCurve;
pub use interpolated::{CurveInterpolation, InterpolatedCurve};
pub use traits::YieldCurve;
