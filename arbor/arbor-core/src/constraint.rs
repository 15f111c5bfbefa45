//! Constraint contract.
//!
//! Constraints are registered independently of the tree. Every step the world
//! calls [`Constraint::update`] on the enabled ones, keeps those reporting
//! [`Constraint::is_active`], stacks their jacobians and runs a blocked
//! Gauss-Seidel fixed point in which each constraint projects its own force
//! through [`Constraint::solve`].

use arbor_types::Result;
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView};

use crate::multibody::Multibody;

/// Bilateral or unilateral velocity constraint.
pub trait Constraint: std::fmt::Debug {
    /// Degrees of liaison: number of velocity components restricted.
    fn ndol(&self) -> usize;

    /// Size internal buffers for the current number of dofs.
    fn init(&mut self, mb: &Multibody) -> Result<()>;

    /// Recompute geometry-dependent state (jacobian, activity).
    ///
    /// Called after the dynamic pass, so poses and jacobians are available.
    fn update(&mut self, mb: &Multibody, dt: f64) -> Result<()>;

    /// Whether the constraint takes part in this step's solve.
    fn is_active(&self) -> bool;

    /// Constraint jacobian, ndol×ndof.
    fn jacobian(&self) -> &DMatrix<f64>;

    /// Accumulated constraint force, length ndol.
    fn force(&self) -> &DVector<f64>;

    /// Generalized force `Jᵀ f`.
    fn gforce(&self) -> DVector<f64> {
        self.jacobian().tr_mul(self.force())
    }

    /// Project the force given the current constraint velocity `vel` and the
    /// diagonal admittance block. Accumulates the change into
    /// [`Constraint::force`] and returns it.
    fn solve(
        &mut self,
        vel: DVectorView<'_, f64>,
        admittance: DMatrixView<'_, f64>,
        dt: f64,
    ) -> Result<DVector<f64>>;
}
