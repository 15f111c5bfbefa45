//! Configuration types for a multibody world.
//!
//! [`WorldConfig`] fixes the vertical direction used by gravity-related
//! controllers and observers, and carries the [`SolverConfig`] that
//! `simulate` hands to the constraint solver each step.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Main configuration for a world.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Unit vector pointing up, in ground coordinates.
    pub up: Vector3<f64>,
    /// Constraint solver settings.
    pub solver: SolverConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            up: Vector3::y(),
            solver: SolverConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Create a configuration with the given up vector.
    #[must_use]
    pub fn with_up(up: Vector3<f64>) -> Self {
        Self {
            up,
            ..Default::default()
        }
    }

    /// Z-up convention, as used by most robotics tools.
    #[must_use]
    pub fn z_up() -> Self {
        Self::with_up(Vector3::z())
    }

    /// Set the solver configuration.
    #[must_use]
    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        let norm = self.up.norm();
        if !norm.is_finite() || (norm - 1.0).abs() > 1e-9 {
            return Err(crate::ArborError::invalid_config(format!(
                "up vector must be a unit vector (norm is {norm})"
            )));
        }

        self.solver.validate()?;

        Ok(())
    }
}

/// Configuration for the Gauss-Seidel constraint solver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Maximum number of sweeps over the active constraints.
    pub max_iterations: usize,
    /// Stop once the constraint velocity changes by less than this between sweeps.
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-4,
        }
    }
}

impl SolverConfig {
    /// Create a high-accuracy solver configuration.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-8,
        }
    }

    /// Create a fast solver configuration.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-3,
        }
    }

    /// Set the maximum number of sweeps.
    #[must_use]
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    #[must_use]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Validate the solver configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_iterations == 0 {
            return Err(crate::ArborError::invalid_config(
                "max_iterations must be at least 1",
            ));
        }

        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(crate::ArborError::invalid_config(
                "tolerance must be finite and non-negative",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorldConfig::default();
        assert_eq!(config.up, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(config.solver.max_iterations, 1000);
        assert_eq!(config.solver.tolerance, 1e-4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(WorldConfig::z_up().validate().is_ok());
        assert!(SolverConfig::high_accuracy().validate().is_ok());
        assert!(SolverConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_invalid_up() {
        let config = WorldConfig::with_up(Vector3::new(0.0, 2.0, 0.0));
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_invalid_solver() {
        let config = WorldConfig::default().solver(SolverConfig::default().max_iterations(0));
        assert!(config.validate().is_err());

        let solver = SolverConfig::default().tolerance(f64::NAN);
        assert!(solver.validate().is_err());
    }
}
