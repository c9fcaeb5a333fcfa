//! Term-structure models.
//!
//! - [`HullWhite1F`]: Gaussian short rate, risk-neutral bank account numeraire
//! - [`LiborMarketModel`]: lognormal forwards under spot or terminal measure
//! - [`SabrLmm`]: CEV forwards with a shared stochastic volatility factor
//! - [`TenorStructure`]: dates and bond/numeraire algebra of the forward models

pub mod hull_white;
pub mod lmm;
pub mod sabr_lmm;
pub mod tenor;

pub use hull_white::HullWhite1F;
pub use lmm::{LiborMarketModel, LmmMeasure, VolSource};
pub use sabr_lmm::{SabrLmm, SabrParams};
pub use tenor::TenorStructure;
