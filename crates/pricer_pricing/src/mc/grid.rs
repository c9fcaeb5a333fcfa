//! Simulation time grid.

use pricer_models::instruments::DATE_TOLERANCE;

use super::error::SimulationError;

/// Strictly increasing, finite, non-negative simulation times (years).
///
/// Simulation always starts from the model's initial state at t = 0; a grid
/// point at 0 simply records that state.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::mc::TimeGrid;
///
/// let grid = TimeGrid::refined(2.0, 4, &[0.3, 1.0]).unwrap();
/// assert_eq!(grid.times()[0], 0.0);
/// assert!(grid.index_of(0.3).is_some());
/// assert_eq!(grid.last(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    /// Validates and wraps `times`.
    ///
    /// # Errors
    ///
    /// `InvalidGrid` if `times` is empty, contains a negative or non-finite
    /// value, or is not strictly increasing.
    pub fn new(times: Vec<f64>) -> Result<Self, SimulationError> {
        if times.is_empty() {
            return Err(SimulationError::InvalidGrid("grid is empty".into()));
        }
        if let Some(t) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(SimulationError::InvalidGrid(format!(
                "grid times must be finite and non-negative, got {t}"
            )));
        }
        if let Some(w) = times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(SimulationError::InvalidGrid(format!(
                "grid must be strictly increasing, found {} followed by {}",
                w[0], w[1]
            )));
        }
        Ok(Self { times })
    }

    /// Uniform grid on `[0, end]` with `steps_per_year` steps per year,
    /// merged with `required` dates.
    ///
    /// Uniform points closer than the date tolerance to a required date are
    /// replaced by it, so required dates are hit exactly.
    ///
    /// # Errors
    ///
    /// `InvalidGrid` for a non-positive `end`, zero `steps_per_year`, or a
    /// required date outside `[0, end]`.
    pub fn refined(
        end: f64,
        steps_per_year: usize,
        required: &[f64],
    ) -> Result<Self, SimulationError> {
        if !(end > 0.0) || !end.is_finite() || steps_per_year == 0 {
            return Err(SimulationError::InvalidGrid(format!(
                "cannot refine [0, {end}] with {steps_per_year} steps per year"
            )));
        }
        if let Some(t) = required
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0 || **t > end + DATE_TOLERANCE)
        {
            return Err(SimulationError::InvalidGrid(format!(
                "required date {t} lies outside [0, {end}]"
            )));
        }

        let steps = (end * steps_per_year as f64 - DATE_TOLERANCE).ceil().max(1.0) as usize;
        let dt = end / steps as f64;
        let mut times: Vec<f64> = (0..=steps).map(|k| k as f64 * dt).collect();
        times[steps] = end;

        let mut sorted = required.to_vec();
        sorted.sort_by(f64::total_cmp);
        let near_required = |t: f64| {
            let pos = sorted.partition_point(|&r| r < t - DATE_TOLERANCE);
            pos < sorted.len() && (sorted[pos] - t).abs() <= DATE_TOLERANCE
        };
        let mut merged: Vec<f64> = times.into_iter().filter(|&t| !near_required(t)).collect();
        merged.extend_from_slice(&sorted);
        merged.sort_by(f64::total_cmp);
        merged.dedup_by(|a, b| (*a - *b).abs() <= DATE_TOLERANCE);
        Self::new(merged)
    }

    /// Grid times.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of grid points.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always `false`; grids are non-empty by construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Last grid time.
    #[inline]
    pub fn last(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Index of the grid point within the date tolerance of `t`.
    pub fn index_of(&self, t: f64) -> Option<usize> {
        let pos = self.times.partition_point(|&x| x < t - DATE_TOLERANCE);
        (pos < self.times.len() && (self.times[pos] - t).abs() <= DATE_TOLERANCE).then_some(pos)
    }
}
