//! Simulated path ensemble.
//!
//! States are stored row-major as `states[path][time][dim]` in one flat
//! buffer and numeraires as `numeraires[path][time]`. The buffers are
//! written once by the simulator and read-only afterwards.

use super::error::SimulationError;
use super::grid::TimeGrid;

/// Per-path values of the control variate and its known expectation.
///
/// The control is the numeraire-rebased unit discount bond `1 / N(T_c)`
/// whose expectation is `P(0, T_c) / N(0)` under any pricing measure.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSample {
    time: f64,
    values: Vec<f64>,
    expectation: f64,
}

impl ControlSample {
    /// Bundle control values.
    pub fn new(time: f64, values: Vec<f64>, expectation: f64) -> Self {
        Self {
            time,
            values,
            expectation,
        }
    }

    /// Maturity of the control bond.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Per-path control values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Analytic expectation of the control.
    pub fn expectation(&self) -> f64 {
        self.expectation
    }
}

/// Checks one path: finite states, strictly positive finite numeraires.
pub(crate) fn check_path(
    path: usize,
    times: &[f64],
    state_dim: usize,
    states: &[f64],
    numeraires: &[f64],
) -> Result<(), SimulationError> {
    for (k, &time) in times.iter().enumerate() {
        let state = &states[k * state_dim..(k + 1) * state_dim];
        if state.iter().any(|x| !x.is_finite()) {
            return Err(SimulationError::NumericalFault {
                path,
                time,
                detail: "state is not finite".into(),
            });
        }
        let n = numeraires[k];
        if !(n > 0.0) || !n.is_finite() {
            return Err(SimulationError::NumericalFault {
                path,
                time,
                detail: format!("numeraire {n} is not strictly positive"),
            });
        }
    }
    Ok(())
}

/// Paths of model state and numeraire over a [`TimeGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathEnsemble {
    grid: TimeGrid,
    path_count: usize,
    state_dim: usize,
    states: Vec<f64>,
    numeraires: Vec<f64>,
    valuation_numeraire: f64,
    antithetic: bool,
    control: Option<ControlSample>,
}

impl PathEnsemble {
    /// Wraps raw buffers after validating every invariant.
    ///
    /// # Errors
    ///
    /// - `InvalidPathCount` for zero paths, or an odd count when `antithetic`
    /// - `InvalidGrid` when buffer lengths do not match the grid
    /// - `NumericalFault` for a non-finite state, or a numeraire (including
    ///   `valuation_numeraire`) that is not strictly positive and finite
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pricer_pricing::mc::{PathEnsemble, TimeGrid};
    ///
    /// let grid = TimeGrid::new(vec![1.0, 2.0]).unwrap();
    /// let ensemble = PathEnsemble::from_raw(
    ///     grid,
    ///     1,
    ///     vec![0.01, 0.02, 0.03, 0.04],
    ///     vec![1.01, 1.03, 1.02, 1.05],
    ///     1.0,
    ///     false,
    /// )
    /// .unwrap();
    /// assert_eq!(ensemble.path_count(), 2);
    /// assert_eq!(ensemble.state(1, 0), &[0.03]);
    /// ```
    pub fn from_raw(
        grid: TimeGrid,
        state_dim: usize,
        states: Vec<f64>,
        numeraires: Vec<f64>,
        valuation_numeraire: f64,
        antithetic: bool,
    ) -> Result<Self, SimulationError> {
        let steps = grid.len();
        if numeraires.len() % steps != 0 {
            return Err(SimulationError::InvalidGrid(format!(
                "{} numeraires do not fill whole paths of {steps} grid points",
                numeraires.len()
            )));
        }
        let path_count = numeraires.len() / steps;
        if path_count == 0 || (antithetic && path_count % 2 != 0) {
            return Err(SimulationError::InvalidPathCount {
                count: path_count,
                antithetic,
            });
        }
        if states.len() != path_count * steps * state_dim {
            return Err(SimulationError::InvalidGrid(format!(
                "expected {} state values for {path_count} paths, got {}",
                path_count * steps * state_dim,
                states.len()
            )));
        }
        if !(valuation_numeraire > 0.0) || !valuation_numeraire.is_finite() {
            return Err(SimulationError::NumericalFault {
                path: 0,
                time: 0.0,
                detail: format!("valuation numeraire {valuation_numeraire} is not positive"),
            });
        }

        let ensemble = Self {
            grid,
            path_count,
            state_dim,
            states,
            numeraires,
            valuation_numeraire,
            antithetic,
            control: None,
        };
        let stride = steps * state_dim;
        for path in 0..path_count {
            check_path(
                path,
                ensemble.grid.times(),
                state_dim,
                &ensemble.states[path * stride..(path + 1) * stride],
                &ensemble.numeraires[path * steps..(path + 1) * steps],
            )?;
        }
        Ok(ensemble)
    }

    /// Buffers already checked path by path during generation.
    pub(crate) fn from_checked(
        grid: TimeGrid,
        state_dim: usize,
        states: Vec<f64>,
        numeraires: Vec<f64>,
        valuation_numeraire: f64,
        antithetic: bool,
    ) -> Self {
        let path_count = numeraires.len() / grid.len();
        Self {
            grid,
            path_count,
            state_dim,
            states,
            numeraires,
            valuation_numeraire,
            antithetic,
            control: None,
        }
    }

    /// Attach control-variate values, one per path.
    ///
    /// # Errors
    ///
    /// `InvalidPathCount` when the value count differs from the path count,
    /// `NumericalFault` for a non-finite value or expectation.
    pub fn with_control(mut self, control: ControlSample) -> Result<Self, SimulationError> {
        if control.values.len() != self.path_count {
            return Err(SimulationError::InvalidPathCount {
                count: control.values.len(),
                antithetic: self.antithetic,
            });
        }
        if let Some(path) = control.values.iter().position(|v| !v.is_finite()) {
            return Err(SimulationError::NumericalFault {
                path,
                time: control.time,
                detail: "control value is not finite".into(),
            });
        }
        if !control.expectation.is_finite() {
            return Err(SimulationError::NumericalFault {
                path: 0,
                time: control.time,
                detail: "control expectation is not finite".into(),
            });
        }
        self.control = Some(control);
        Ok(self)
    }

    /// Simulation grid.
    #[inline]
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Number of paths.
    #[inline]
    pub fn path_count(&self) -> usize {
        self.path_count
    }

    /// Length of one state vector.
    #[inline]
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    /// State of `path` at grid index `time_index`.
    #[inline]
    pub fn state(&self, path: usize, time_index: usize) -> &[f64] {
        let start = (path * self.grid.len() + time_index) * self.state_dim;
        &self.states[start..start + self.state_dim]
    }

    /// Numeraire of `path` at grid index `time_index`.
    #[inline]
    pub fn numeraire(&self, path: usize, time_index: usize) -> f64 {
        self.numeraires[path * self.grid.len() + time_index]
    }

    /// Numeraire at the valuation date, N(0).
    #[inline]
    pub fn valuation_numeraire(&self) -> f64 {
        self.valuation_numeraire
    }

    /// Whether paths `2i` and `2i + 1` are antithetic partners.
    #[inline]
    pub fn is_antithetic(&self) -> bool {
        self.antithetic
    }

    /// Control-variate sample, when generated.
    #[inline]
    pub fn control(&self) -> Option<&ControlSample> {
        self.control.as_ref()
    }
}
