//! Declarative model description, built against a market snapshot.
//!
//! A [`ModelSpec`] holds the model parameters that are not market data. It
//! is deserialised from run files and turned into a [`RateModel`] with
//! [`ModelSpec::build`]. Risk runs shift either the market (through
//! `pricer_core`) or one of the [`ModelParameter`]s here.

use pricer_core::market_data::{MarketDataProvider, ShiftKind};
use serde::{Deserialize, Serialize};

use super::correlation::CorrelationSpec;
use super::error::ModelError;
use super::model_enum::RateModel;
use super::rates::{
    HullWhite1F, LiborMarketModel, LmmMeasure, SabrLmm, SabrParams, TenorStructure, VolSource,
};

fn default_curve_horizon() -> f64 {
    50.0
}

/// Source of the Hull-White short-rate volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SigmaSource {
    /// Given directly.
    Fixed {
        /// Short-rate volatility
        value: f64,
    },
    /// Normal-vol approximation from one swaption quote:
    /// `sigma = sigma_black(expiry, tenor) * F(expiry, expiry + tenor)`.
    Market {
        /// Option expiry
        expiry: f64,
        /// Swap tenor
        tenor: f64,
    },
}

/// Model parameters that risk runs may shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelParameter {
    /// Hull-White mean reversion.
    MeanReversion,
    /// Hull-White sigma (fixed source) or LMM/SABR-LMM flat/fixed vols.
    Volatility,
    /// SABR-LMM vol-of-vol.
    VolOfVol,
    /// SABR-LMM forward/volatility correlation.
    RhoSv,
}

/// Model choice and its non-market parameters.
///
/// ```
/// use pricer_models::models::ModelSpec;
///
/// let spec: ModelSpec = toml::from_str(r#"
///     model = "hull_white"
///     mean_reversion = 0.05
///     sigma = { source = "fixed", value = 0.01 }
/// "#).unwrap();
/// assert!(matches!(spec, ModelSpec::HullWhite { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Hull-White 1F.
    HullWhite {
        /// Mean reversion speed
        mean_reversion: f64,
        /// Volatility source
        sigma: SigmaSource,
        /// How far out the market curve is sampled
        #[serde(default = "default_curve_horizon")]
        curve_horizon: f64,
    },
    /// Lognormal LMM.
    Lmm {
        /// Last tenor date
        horizon: f64,
        /// Accrual period
        accrual: f64,
        /// Pricing measure
        #[serde(default)]
        measure: LmmMeasure,
        /// Forward volatilities
        #[serde(default)]
        vols: VolSource,
        /// Forward correlation
        #[serde(default)]
        correlation: CorrelationSpec,
    },
    /// SABR-LMM.
    SabrLmm {
        /// Last tenor date
        horizon: f64,
        /// Accrual period
        accrual: f64,
        /// Forward volatilities
        #[serde(default)]
        vols: VolSource,
        /// CEV exponent
        beta: f64,
        /// Vol-of-vol
        vol_of_vol: f64,
        /// Forward/volatility correlation
        rho_sv: f64,
        /// Forward correlation
        #[serde(default)]
        correlation: CorrelationSpec,
    },
}

impl ModelSpec {
    /// Build the model from market data.
    pub fn build(&self, market: &dyn MarketDataProvider) -> Result<RateModel, ModelError> {
        let model: RateModel = match self {
            ModelSpec::HullWhite {
                mean_reversion,
                sigma,
                curve_horizon,
            } => {
                let vol = match sigma {
                    SigmaSource::Fixed { value } => *value,
                    SigmaSource::Market { expiry, tenor } => {
                        let black = market.volatility(*expiry, *tenor)?;
                        let fwd = market.forward_rate(*expiry, expiry + tenor)?;
                        black * fwd.abs()
                    }
                };
                HullWhite1F::from_market(market, *mean_reversion, vol, *curve_horizon)?.into()
            }
            ModelSpec::Lmm {
                horizon,
                accrual,
                measure,
                vols,
                correlation,
            } => LiborMarketModel::from_market(
                market,
                TenorStructure::uniform(*horizon, *accrual)?,
                vols,
                correlation,
                *measure,
            )?
            .into(),
            ModelSpec::SabrLmm {
                horizon,
                accrual,
                vols,
                beta,
                vol_of_vol,
                rho_sv,
                correlation,
            } => SabrLmm::from_market(
                market,
                TenorStructure::uniform(*horizon, *accrual)?,
                vols,
                SabrParams {
                    beta: *beta,
                    vol_of_vol: *vol_of_vol,
                    rho_sv: *rho_sv,
                },
                correlation,
            )?
            .into(),
        };
        tracing::debug!(model = model.model_name(), "built rate model");
        Ok(model)
    }

    /// Copy with `param` shifted by `size` under `kind`.
    ///
    /// # Errors
    ///
    /// `UnsupportedShift` when the parameter does not exist on this model or
    /// is sourced from the market (shift the market instead).
    pub fn shifted(
        &self,
        param: ModelParameter,
        kind: ShiftKind,
        size: f64,
    ) -> Result<Self, ModelError> {
        let unsupported = || {
            ModelError::UnsupportedShift(format!("{param:?} is not a free parameter of this model"))
        };
        let mut out = self.clone();
        match (&mut out, param) {
            (ModelSpec::HullWhite { mean_reversion, .. }, ModelParameter::MeanReversion) => {
                *mean_reversion = kind.apply(*mean_reversion, size);
            }
            (
                ModelSpec::HullWhite {
                    sigma: SigmaSource::Fixed { value },
                    ..
                },
                ModelParameter::Volatility,
            ) => {
                *value = kind.apply(*value, size);
            }
            (ModelSpec::Lmm { vols, .. }, ModelParameter::Volatility)
            | (ModelSpec::SabrLmm { vols, .. }, ModelParameter::Volatility) => {
                *vols = vols.map(|v| kind.apply(v, size)).ok_or_else(unsupported)?;
            }
            (ModelSpec::SabrLmm { vol_of_vol, .. }, ModelParameter::VolOfVol) => {
                *vol_of_vol = kind.apply(*vol_of_vol, size);
            }
            (ModelSpec::SabrLmm { rho_sv, .. }, ModelParameter::RhoSv) => {
                *rho_sv = kind.apply(*rho_sv, size);
            }
            _ => return Err(unsupported()),
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::MarketSnapshot;

    fn hw_spec() -> ModelSpec {
        ModelSpec::HullWhite {
            mean_reversion: 0.05,
            sigma: SigmaSource::Fixed { value: 0.01 },
            curve_horizon: 20.0,
        }
    }

    #[test]
    fn test_build_hull_white_from_market_vol() {
        let market = MarketSnapshot::flat(0.03, 0.25).unwrap();
        let spec = ModelSpec::HullWhite {
            mean_reversion: 0.05,
            sigma: SigmaSource::Market {
                expiry: 1.0,
                tenor: 5.0,
            },
            curve_horizon: 20.0,
        };
        match spec.build(&market).unwrap() {
            RateModel::HullWhite1F(hw) => {
                let fwd = ((0.03_f64 * 5.0).exp() - 1.0) / 5.0;
                assert_relative_eq!(hw.volatility(), 0.25 * fwd, epsilon = 1e-14);
            }
            other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn test_shift_mean_reversion() {
        let up = hw_spec()
            .shifted(ModelParameter::MeanReversion, ShiftKind::Relative, 0.1)
            .unwrap();
        match up {
            ModelSpec::HullWhite { mean_reversion, .. } => {
                assert_relative_eq!(mean_reversion, 0.055, epsilon = 1e-15)
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_shift_market_sourced_vol_is_rejected() {
        let spec = ModelSpec::Lmm {
            horizon: 3.0,
            accrual: 0.5,
            measure: LmmMeasure::Spot,
            vols: VolSource::Market,
            correlation: CorrelationSpec::default(),
        };
        let err = spec
            .shifted(ModelParameter::Volatility, ShiftKind::Additive, 0.01)
            .unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedShift(_)));
    }

    #[test]
    fn test_shift_wrong_model_parameter() {
        assert!(hw_spec()
            .shifted(ModelParameter::VolOfVol, ShiftKind::Additive, 0.01)
            .is_err());
    }

    #[test]
    fn test_sabr_spec_from_toml() {
        let spec: ModelSpec = toml::from_str(
            r#"
            model = "sabr_lmm"
            horizon = 5.0
            accrual = 0.5
            beta = 0.5
            vol_of_vol = 0.3
            rho_sv = -0.2
            vols = { source = "flat", value = 0.02 }
            correlation = { kind = "exponential", decay = 0.05 }
            "#,
        )
        .unwrap();
        let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
        let model = spec.build(&market).unwrap();
        assert_eq!(model.model_name(), "SABR-LMM");
        assert_eq!(model.state_dim(), 11);
    }
}
