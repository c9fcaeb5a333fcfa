//! Payoff evaluation over a path ensemble.

use pricer_models::instruments::{Observation, Payoff};
use pricer_models::models::RateModel;
use rayon::prelude::*;

use super::error::PricingError;
use crate::mc::PathEnsemble;

/// Ordered `(time, amount)` cashflows of one path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashflowPath {
    flows: Vec<(f64, f64)>,
}

impl CashflowPath {
    /// Flows sorted by time.
    pub fn new(mut flows: Vec<(f64, f64)>) -> Self {
        flows.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { flows }
    }

    /// The flows.
    pub fn flows(&self) -> &[(f64, f64)] {
        &self.flows
    }

    /// True when the path pays nothing.
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Undiscounted sum of amounts.
    pub fn total(&self) -> f64 {
        self.flows.iter().map(|(_, a)| a).sum()
    }
}

/// Exercise values of every path at one grid date.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseValues {
    /// Grid time.
    pub time: f64,
    /// Payoff as returned by the product.
    pub raw: Vec<f64>,
    /// Payoff divided by the path numeraire.
    pub rebased: Vec<f64>,
}

/// Calls the payoff once per path at a given grid date.
pub struct CashflowProjector<'a, P: ?Sized> {
    model: &'a RateModel,
    payoff: &'a P,
    ensemble: &'a PathEnsemble,
}

impl<'a, P: Payoff + ?Sized> CashflowProjector<'a, P> {
    /// Projector over `ensemble` generated by `model`.
    pub fn new(model: &'a RateModel, payoff: &'a P, ensemble: &'a PathEnsemble) -> Self {
        Self {
            model,
            payoff,
            ensemble,
        }
    }

    /// Exercise values at grid index `time_index`, in parallel over paths.
    ///
    /// # Errors
    ///
    /// `NonFinitePayoff` when the payoff returns NaN or infinity on any path.
    pub fn exercise_values(&self, time_index: usize) -> Result<ExerciseValues, PricingError> {
        let time = self.ensemble.grid().times()[time_index];
        let pairs: Vec<(f64, f64)> = (0..self.ensemble.path_count())
            .into_par_iter()
            .map(|path| {
                let state = self.ensemble.state(path, time_index);
                let value = self
                    .payoff
                    .exercise_value(&Observation::new(time, state, self.model));
                if !value.is_finite() {
                    return Err(PricingError::NonFinitePayoff { path, time, value });
                }
                Ok((value, value / self.ensemble.numeraire(path, time_index)))
            })
            .collect::<Result<_, _>>()?;
        let (raw, rebased) = pairs.into_iter().unzip();
        Ok(ExerciseValues { time, raw, rebased })
    }

    /// Cash flow of each path given the date it was exercised at.
    ///
    /// `exercised[p]` is the grid index and raw amount of path `p`'s
    /// exercise, or `None` if it never exercised.
    pub fn cashflow_paths(&self, exercised: &[Option<(usize, f64)>]) -> Vec<CashflowPath> {
        let times = self.ensemble.grid().times();
        exercised
            .iter()
            .map(|e| match e {
                Some((k, amount)) => CashflowPath::new(vec![(times[*k], *amount)]),
                None => CashflowPath::default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::TimeGrid;
    use pricer_core::market_data::MarketSnapshot;
    use pricer_models::instruments::FnPayoff;
    use pricer_models::models::rates::HullWhite1F;

    fn setup() -> (RateModel, PathEnsemble) {
        let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
        let model: RateModel = HullWhite1F::from_market(&market, 0.1, 0.01, 5.0)
            .unwrap()
            .into();
        let grid = TimeGrid::new(vec![1.0, 2.0]).unwrap();
        let ensemble = PathEnsemble::from_raw(
            grid,
            1,
            vec![0.05, 0.04, 0.01, 0.02],
            vec![1.05, 1.10, 1.01, 1.03],
            1.0,
            false,
        )
        .unwrap();
        (model, ensemble)
    }

    #[test]
    fn test_values_are_rebased_by_numeraire() {
        let (model, ensemble) = setup();
        let payoff = FnPayoff::new(|obs: &Observation<'_>| 100.0 * (obs.state[0] - 0.02).max(0.0));
        let projector = CashflowProjector::new(&model, &payoff, &ensemble);
        let v = projector.exercise_values(0).unwrap();
        assert_eq!(v.time, 1.0);
        assert!((v.raw[0] - 3.0).abs() < 1e-12);
        assert_eq!(v.raw[1], 0.0);
        assert!((v.rebased[0] - 3.0 / 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_payoff_is_fatal() {
        let (model, ensemble) = setup();
        let payoff = FnPayoff::new(|obs: &Observation<'_>| {
            if obs.state[0] < 0.015 {
                f64::NAN
            } else {
                1.0
            }
        });
        let err = CashflowProjector::new(&model, &payoff, &ensemble)
            .exercise_values(0)
            .unwrap_err();
        assert!(matches!(
            err,
            PricingError::NonFinitePayoff { path: 1, time, .. } if time == 1.0
        ));
    }

    #[test]
    fn test_cashflow_paths() {
        let (model, ensemble) = setup();
        let payoff = FnPayoff::new(|_: &Observation<'_>| 0.0);
        let projector = CashflowProjector::new(&model, &payoff, &ensemble);
        let paths = projector.cashflow_paths(&[Some((1, 2.5)), None]);
        assert_eq!(paths[0].flows(), &[(2.0, 2.5)]);
        assert!(paths[1].is_empty());
        assert_eq!(paths[0].total(), 2.5);
    }
}
