//! Parallel path generation.
//!
//! [`PathSimulator`] drives a [`RateModel`] across a [`TimeGrid`]. Paths are
//! generated in blocks of `block_size` with rayon; each path (or antithetic
//! pair) draws from the substream whose index is the path (or pair) index,
//! so the ensemble is bit-identical for any thread count or block size.

use pricer_models::instruments::DATE_TOLERANCE;
use pricer_models::models::{RateModel, Scheme};
use rayon::prelude::*;
use tracing::{debug, info_span};

use super::config::{EngineConfig, DEFAULT_BLOCK_SIZE, MAX_PATHS};
use super::ensemble::{check_path, ControlSample, PathEnsemble};
use super::error::SimulationError;
use super::grid::TimeGrid;
use crate::cancel::CancellationToken;
use crate::rng::SubstreamRng;

/// Single-call simulation contract on a rate model.
pub trait SimulateRates {
    /// Plain (non-antithetic) ensemble of `path_count` paths over `grid`,
    /// drawn from the substreams of `seed`.
    fn simulate(
        &self,
        grid: &TimeGrid,
        path_count: usize,
        seed: u64,
        scheme: Scheme,
    ) -> Result<PathEnsemble, SimulationError>;
}

impl SimulateRates for RateModel {
    fn simulate(
        &self,
        grid: &TimeGrid,
        path_count: usize,
        seed: u64,
        scheme: Scheme,
    ) -> Result<PathEnsemble, SimulationError> {
        PathSimulator::new(scheme).generate(self, grid, path_count, seed)
    }
}

/// Path generator with variance-reduction options.
///
/// # Examples
///
/// ```rust
/// use pricer_core::market_data::MarketSnapshot;
/// use pricer_models::models::{ModelSpec, Scheme, SigmaSource};
/// use pricer_pricing::mc::{PathSimulator, TimeGrid};
///
/// let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
/// let model = ModelSpec::HullWhite {
///     mean_reversion: 0.05,
///     sigma: SigmaSource::Fixed { value: 0.01 },
///     curve_horizon: 10.0,
/// }
/// .build(&market)
/// .unwrap();
///
/// let grid = TimeGrid::new(vec![0.5, 1.0]).unwrap();
/// let ensemble = PathSimulator::new(Scheme::Exact)
///     .with_antithetic(true)
///     .generate(&model, &grid, 1000, 42)
///     .unwrap();
/// assert_eq!(ensemble.path_count(), 1000);
/// ```
#[derive(Debug, Clone)]
pub struct PathSimulator {
    scheme: Scheme,
    antithetic: bool,
    control_variate: bool,
    block_size: usize,
    cancel: Option<CancellationToken>,
}

impl PathSimulator {
    /// Simulator with the given scheme and no variance reduction.
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            antithetic: false,
            control_variate: false,
            block_size: DEFAULT_BLOCK_SIZE,
            cancel: None,
        }
    }

    /// Simulator set up from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.scheme())
            .with_antithetic(config.antithetic())
            .with_control_variate(config.control_variate())
            .with_block_size(config.block_size())
    }

    /// Generate antithetic pairs.
    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    /// Record the rebased discount bond to the last grid date per path.
    pub fn with_control_variate(mut self, control_variate: bool) -> Self {
        self.control_variate = control_variate;
        self
    }

    /// Paths per parallel block (at least one path, rounded up to whole
    /// antithetic pairs).
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Poll `token` between blocks.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Discretisation scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Generate `path_count` paths of `model` over `grid`.
    ///
    /// # Errors
    ///
    /// - `InvalidPathCount` for zero paths, too many paths, or an odd count
    ///   with antithetic pairing
    /// - `InvalidGrid` when the grid runs past the model horizon
    /// - `NumericalFault` when a state or numeraire leaves its domain
    /// - `Cancelled` when the token fires between blocks
    pub fn generate(
        &self,
        model: &RateModel,
        grid: &TimeGrid,
        path_count: usize,
        seed: u64,
    ) -> Result<PathEnsemble, SimulationError> {
        if path_count == 0 || path_count > MAX_PATHS || (self.antithetic && path_count % 2 != 0) {
            return Err(SimulationError::InvalidPathCount {
                count: path_count,
                antithetic: self.antithetic,
            });
        }
        if grid.last() > model.horizon() + DATE_TOLERANCE {
            return Err(SimulationError::InvalidGrid(format!(
                "grid ends at {} but {} is only defined up to {}",
                grid.last(),
                model.model_name(),
                model.horizon()
            )));
        }

        let span = info_span!(
            "simulate",
            model = model.model_name(),
            scheme = %self.scheme,
            paths = path_count,
            steps = grid.len(),
            antithetic = self.antithetic
        );
        let _guard = span.enter();

        let steps = grid.len();
        let dim = model.state_dim();
        let block = if self.antithetic {
            self.block_size + self.block_size % 2
        } else {
            self.block_size
        };

        let mut states = vec![0.0; path_count * steps * dim];
        let mut numeraires = vec![0.0; path_count * steps];

        states
            .par_chunks_mut(block * steps * dim)
            .zip(numeraires.par_chunks_mut(block * steps))
            .enumerate()
            .try_for_each(|(b, (state_block, numeraire_block))| {
                if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                    return Err(SimulationError::Cancelled);
                }
                self.run_block(
                    model,
                    grid,
                    seed,
                    b * block,
                    state_block,
                    numeraire_block,
                )
            })?;

        let valuation_numeraire = model.initial_numeraire();
        let ensemble = PathEnsemble::from_checked(
            grid.clone(),
            dim,
            states,
            numeraires,
            valuation_numeraire,
            self.antithetic,
        );

        let ensemble = if self.control_variate {
            let last = steps - 1;
            let maturity = grid.last();
            let values = (0..path_count)
                .map(|p| 1.0 / ensemble.numeraire(p, last))
                .collect();
            let expectation = model.initial_zero_bond(maturity) / valuation_numeraire;
            ensemble.with_control(ControlSample::new(maturity, values, expectation))?
        } else {
            ensemble
        };

        debug!(paths = path_count, "path generation complete");
        Ok(ensemble)
    }

    /// Fill one block of paths starting at global path `first`.
    fn run_block(
        &self,
        model: &RateModel,
        grid: &TimeGrid,
        seed: u64,
        first: usize,
        states: &mut [f64],
        numeraires: &mut [f64],
    ) -> Result<(), SimulationError> {
        let steps = grid.len();
        let dim = model.state_dim();
        let m = model.brownian_dim(self.scheme);
        let paths = numeraires.len() / steps;
        let mut normals = vec![0.0; steps * m];
        let mut scratch = PathScratch::new(dim, model.scratch_len());

        let mut local = 0;
        while local < paths {
            let path = first + local;
            let span = if self.antithetic { 2 } else { 1 };
            let substream = (path / span) as u64;
            SubstreamRng::new(seed, substream).fill_normal(&mut normals);

            for partner in 0..span {
                if partner == 1 {
                    normals.iter_mut().for_each(|z| *z = -*z);
                }
                let p = local + partner;
                let path_states = &mut states[p * steps * dim..(p + 1) * steps * dim];
                let path_numeraires = &mut numeraires[p * steps..(p + 1) * steps];
                scratch.run(
                    model,
                    grid,
                    self.scheme,
                    &normals,
                    m,
                    path_states,
                    path_numeraires,
                );
                check_path(first + p, grid.times(), dim, path_states, path_numeraires)?;
            }
            local += span;
        }
        Ok(())
    }
}

/// Working state for one path, reused across the paths of a block.
struct PathScratch {
    current: Vec<f64>,
    next: Vec<f64>,
    work: Vec<f64>,
}

impl PathScratch {
    fn new(dim: usize, work: usize) -> Self {
        Self {
            current: vec![0.0; dim],
            next: vec![0.0; dim],
            work: vec![0.0; work],
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &mut self,
        model: &RateModel,
        grid: &TimeGrid,
        scheme: Scheme,
        normals: &[f64],
        m: usize,
        states: &mut [f64],
        numeraires: &mut [f64],
    ) {
        let dim = self.current.len();
        model.initial_state(&mut self.current);
        let mut numeraire = model.initial_numeraire();
        let mut t_prev = 0.0;

        for (k, &t) in grid.times().iter().enumerate() {
            if t - t_prev > DATE_TOLERANCE {
                numeraire = model.evolve_with_scratch(
                    t_prev,
                    t,
                    &self.current,
                    numeraire,
                    &normals[k * m..(k + 1) * m],
                    scheme,
                    &mut self.next,
                    &mut self.work,
                );
                std::mem::swap(&mut self.current, &mut self.next);
                t_prev = t;
            }
            states[k * dim..(k + 1) * dim].copy_from_slice(&self.current);
            numeraires[k] = numeraire;
        }
    }
}
