//! Controller contract.

use arbor_types::Result;
use nalgebra::{DMatrix, DVector};

use crate::multibody::Multibody;

/// Contribution of a controller to one step.
///
/// The controller force is linearized around the current velocity as
/// `f(ν) ≈ gforce + impedance · ν_next`. The world subtracts `impedance`
/// from the system impedance and adds `gforce` to the generalized force.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOutput {
    /// Constant generalized force, length ndof.
    pub gforce: DVector<f64>,
    /// Velocity-dependent part, ndof×ndof.
    pub impedance: DMatrix<f64>,
}

impl ControllerOutput {
    /// No force, no impedance.
    #[must_use]
    pub fn zeros(ndof: usize) -> Self {
        Self {
            gforce: DVector::zeros(ndof),
            impedance: DMatrix::zeros(ndof, ndof),
        }
    }
}

/// Source of generalized forces (actuators, weight, springs).
pub trait Controller: std::fmt::Debug {
    /// Prepare for the current number of dofs.
    fn init(&mut self, _mb: &Multibody) -> Result<()> {
        Ok(())
    }

    /// Force and impedance for a step of length `dt`.
    fn update(&mut self, mb: &Multibody, dt: f64) -> Result<ControllerOutput>;
}
