//! Swaption volatility surfaces.
//!
//! - [`SwaptionVolSurface`]: lookup by (expiry, tenor)
//! - [`FlatVol`]: constant surface
//! - [`SwaptionVolGrid`]: bilinear grid of quotes

mod flat;
mod interpolated;
mod traits;

pub use flat::FlatVol;
pub use interpolated::SwaptionVolGrid;
pub use traits::SwaptionVolSurface;
