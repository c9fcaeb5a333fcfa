//! Engine configuration.
//!
//! This module provides [`EngineConfig`] and its builder. The same struct is
//! deserialised from the `[engine]` table of a run file; call
//! [`EngineConfig::validate`] after deserialising.

use pricer_models::models::Scheme;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::lsm::BasisFamily;

/// Maximum number of simulation paths allowed.
pub const MAX_PATHS: usize = 10_000_000;

/// Default number of simulation paths.
pub const DEFAULT_PATH_COUNT: usize = 10_000;

/// Default base seed.
pub const DEFAULT_SEED: u64 = 42;

/// Default grid refinement for grids built around exercise dates.
pub const DEFAULT_STEPS_PER_YEAR: usize = 252;

/// Default paths per parallel block.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Default regression degree.
pub const DEFAULT_REGRESSION_DEGREE: usize = 2;

/// Relative standard deviation below which a control variate is treated as
/// constant and left out.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Monte Carlo / LSM engine configuration.
///
/// Immutable once built. Use [`EngineConfigBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use pricer_models::models::Scheme;
/// use pricer_pricing::mc::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .path_count(20_000)
///     .antithetic(true)
///     .scheme(Scheme::Euler)
///     .regression_degree(3)
///     .seed(7)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.path_count(), 20_000);
/// assert!(config.antithetic());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    scheme: Scheme,
    antithetic: bool,
    control_variate: bool,
    regression_degree: usize,
    basis_family: BasisFamily,
    exercise_indicator: bool,
    path_count: usize,
    seed: u64,
    steps_per_year: usize,
    block_size: usize,
    std_error_tolerance: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Exact,
            antithetic: false,
            control_variate: false,
            regression_degree: DEFAULT_REGRESSION_DEGREE,
            basis_family: BasisFamily::Monomial,
            exercise_indicator: false,
            path_count: DEFAULT_PATH_COUNT,
            seed: DEFAULT_SEED,
            steps_per_year: DEFAULT_STEPS_PER_YEAR,
            block_size: DEFAULT_BLOCK_SIZE,
            std_error_tolerance: None,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration builder seeded with the defaults.
    #[inline]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Time discretisation scheme.
    #[inline]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Whether paths are generated in antithetic pairs.
    #[inline]
    pub fn antithetic(&self) -> bool {
        self.antithetic
    }

    /// Whether the discount-bond control variate is applied.
    #[inline]
    pub fn control_variate(&self) -> bool {
        self.control_variate
    }

    /// Polynomial degree of the continuation regression.
    #[inline]
    pub fn regression_degree(&self) -> usize {
        self.regression_degree
    }

    /// Basis polynomial family.
    #[inline]
    pub fn basis_family(&self) -> BasisFamily {
        self.basis_family
    }

    /// Whether the immediate exercise value is a regressor.
    #[inline]
    pub fn exercise_indicator(&self) -> bool {
        self.exercise_indicator
    }

    /// Number of simulation paths.
    #[inline]
    pub fn path_count(&self) -> usize {
        self.path_count
    }

    /// Base seed for the substream allocator.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Grid refinement for grids built around exercise dates.
    #[inline]
    pub fn steps_per_year(&self) -> usize {
        self.steps_per_year
    }

    /// Paths per parallel block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Standard error above which a convergence warning is raised.
    #[inline]
    pub fn std_error_tolerance(&self) -> Option<f64> {
        self.std_error_tolerance
    }

    /// Copy with a different seed. Used for reseeded bump runs.
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Copy with a different path count.
    ///
    /// # Errors
    ///
    /// Same as [`validate`](Self::validate).
    pub fn with_path_count(&self, path_count: usize) -> Result<Self, ConfigError> {
        let config = Self {
            path_count,
            ..self.clone()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `path_count` is 0 or greater than 10,000,000
    /// - `path_count` is odd while `antithetic` is set
    /// - `regression_degree` is outside [1, 3]
    /// - `steps_per_year` or `block_size` is 0
    /// - `std_error_tolerance` is not a positive finite number
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path_count == 0 || self.path_count > MAX_PATHS {
            return Err(ConfigError::InvalidPathCount(self.path_count));
        }
        if self.antithetic && self.path_count % 2 != 0 {
            return Err(ConfigError::InvalidParameter {
                name: "path_count",
                value: format!("{} is odd but antithetic pairing is on", self.path_count),
            });
        }
        if !(1..=3).contains(&self.regression_degree) {
            return Err(ConfigError::InvalidRegressionDegree(self.regression_degree));
        }
        if self.steps_per_year == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "steps_per_year",
                value: "must be positive".to_string(),
            });
        }
        if self.block_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "block_size",
                value: "must be positive".to_string(),
            });
        }
        if let Some(tol) = self.std_error_tolerance {
            if !(tol > 0.0) || !tol.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "std_error_tolerance",
                    value: format!("must be positive and finite, got {tol}"),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`].
///
/// Starts from the defaults and validates at build time.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::mc::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .path_count(50_000)
///     .control_variate(true)
///     .std_error_tolerance(1e-4)
///     .build()
///     .expect("valid config");
/// assert_eq!(config.seed(), 42);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Sets the discretisation scheme.
    #[inline]
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.config.scheme = scheme;
        self
    }

    /// Enables or disables antithetic pairing.
    #[inline]
    pub fn antithetic(mut self, antithetic: bool) -> Self {
        self.config.antithetic = antithetic;
        self
    }

    /// Enables or disables the control variate.
    #[inline]
    pub fn control_variate(mut self, control_variate: bool) -> Self {
        self.config.control_variate = control_variate;
        self
    }

    /// Sets the regression degree.
    ///
    /// # Arguments
    ///
    /// * `degree` - Polynomial degree in [1, 3]
    #[inline]
    pub fn regression_degree(mut self, degree: usize) -> Self {
        self.config.regression_degree = degree;
        self
    }

    /// Sets the basis family.
    #[inline]
    pub fn basis_family(mut self, family: BasisFamily) -> Self {
        self.config.basis_family = family;
        self
    }

    /// Adds the immediate exercise value as a regressor.
    #[inline]
    pub fn exercise_indicator(mut self, on: bool) -> Self {
        self.config.exercise_indicator = on;
        self
    }

    /// Sets the number of simulation paths.
    ///
    /// # Arguments
    ///
    /// * `path_count` - Number of paths in [1, 10_000_000]
    #[inline]
    pub fn path_count(mut self, path_count: usize) -> Self {
        self.config.path_count = path_count;
        self
    }

    /// Sets the base seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the grid refinement.
    #[inline]
    pub fn steps_per_year(mut self, steps: usize) -> Self {
        self.config.steps_per_year = steps;
        self
    }

    /// Sets the number of paths per parallel block.
    #[inline]
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.config.block_size = block_size;
        self
    }

    /// Sets the standard error tolerance for convergence warnings.
    #[inline]
    pub fn std_error_tolerance(mut self, tolerance: f64) -> Self {
        self.config.std_error_tolerance = Some(tolerance);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::validate`].
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
