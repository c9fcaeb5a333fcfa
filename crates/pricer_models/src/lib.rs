//! # Pricer Models (L2: Business Logic)
//!
//! Term-structure models and the products priced on them.
//!
//! This crate provides:
//! - Rate models behind the closed [`RateModel`](models::RateModel) enum:
//!   Hull-White 1F, lognormal LMM (spot and terminal measure) and SABR-LMM
//! - Model construction from a `pricer_core` market snapshot via
//!   [`ModelSpec`](models::ModelSpec)
//! - The [`Payoff`](instruments::Payoff) contract and Bermudan swaptions
//!
//! ## Design Principles
//!
//! - **Enum-based models** for static dispatch in the simulation loop
//! - **Market data read once** at model construction, never during simulation
//! - **Pure payoffs**: exercise values depend only on time, state and model

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod instruments;
pub mod models;
