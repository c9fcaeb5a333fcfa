//! Interest rate products.

mod swaption;

pub use swaption::{BermudanSwaption, SwaptionType};
