//! Joint contract.
//!
//! A joint moves its frame `n` (on the child side) relative to its frame
//! `r` (on the parent side). It exposes:
//!
//! - the relative pose `H_rn`
//! - the jacobian `J_nr` (6×ndof) mapping its generalized velocity to the
//!   twist of `n` relative to `r`, expressed in `n`
//! - the time derivative of that jacobian
//!
//! The generalized velocity itself belongs to the world: after
//! [`World::init`](crate::World::init) each joint reads it through its slice
//! of the global vector, passed in as a view.

use arbor_spatial::transform::{Transform, adjoint, iadjoint};
use arbor_spatial::twist::{Twist, adjacency};
use arbor_spatial::Adjoint;
use arbor_types::Result;
use nalgebra::{DVector, DVectorView, Matrix6xX};

/// Relative motion between two frames.
pub trait Joint: std::fmt::Debug {
    /// Number of degrees of freedom.
    fn ndof(&self) -> usize;

    /// Relative pose `H_rn`.
    fn pose(&self) -> Transform;

    /// Jacobian `J_nr`, 6×ndof.
    fn jacobian(&self) -> Matrix6xX<f64>;

    /// Time derivative of [`Joint::jacobian`] at generalized velocity `gvel`.
    fn djacobian(&self, gvel: DVectorView<'_, f64>) -> Matrix6xX<f64>;

    /// Generalized velocity held by the joint, copied into the world by `init`.
    fn gvel(&self) -> DVector<f64>;

    /// Overwrite the velocity held by the joint.
    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()>;

    /// Advance the generalized position by `dt` at velocity `gvel`, and keep
    /// `gvel` as the joint's velocity.
    fn integrate(&mut self, gvel: DVectorView<'_, f64>, dt: f64);

    /// Access to the vector configuration space, when the joint has one.
    fn as_linear(&self) -> Option<&dyn LinearJoint> {
        None
    }

    /// Mutable access to the vector configuration space.
    fn as_linear_mut(&mut self) -> Option<&mut dyn LinearJoint> {
        None
    }

    /// Twist `T_nr = J_nr ν`.
    fn twist(&self, gvel: DVectorView<'_, f64>) -> Twist {
        self.jacobian() * gvel
    }

    /// Twist of `r` relative to `n`, expressed in `r`.
    fn itwist(&self, gvel: DVectorView<'_, f64>) -> Twist {
        -(adjoint(&self.pose()) * self.twist(gvel))
    }

    /// Time derivative of `iadjoint(H_rn) = Ad_nr`.
    fn idadjoint(&self, gvel: DVectorView<'_, f64>) -> Adjoint {
        iadjoint(&self.pose()) * adjacency(&self.itwist(gvel))
    }
}

/// Joint whose generalized position is a plain vector integrated as
/// `q += dt ν`.
pub trait LinearJoint: Joint {
    /// Generalized position.
    fn gpos(&self) -> DVector<f64>;

    /// Overwrite the generalized position.
    fn set_gpos(&mut self, gpos: &[f64]) -> Result<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::testing::{TestFreeJoint, TestHinge};
    use approx::assert_relative_eq;
    use arbor_spatial::transform::transl;
    use arbor_spatial::twist::exp;

    #[test]
    fn test_hinge_twist() {
        let hinge = TestHinge::new(0.3, 2.0);
        let gvel = hinge.gvel();
        let twist = hinge.twist(gvel.as_view());
        assert_relative_eq!(twist, Twist::new(0.0, 0.0, 2.0, 0.0, 0.0, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn test_idadjoint_matches_finite_difference() {
        let pose = transl(0.3, -1.0, 2.0) * arbor_spatial::transform::rotzyx(0.4, -0.2, 0.9);
        let gvel = DVector::from_vec(vec![0.5, -0.3, 0.8, 1.0, 2.0, -0.5]);
        let joint = TestFreeJoint::new(pose);

        let h = 1e-6;
        let v = Twist::from_column_slice(gvel.as_slice());
        let ahead = pose * exp(&(v * h));
        let behind = pose * exp(&(v * -h));
        let numeric = (iadjoint(&ahead) - iadjoint(&behind)) / (2.0 * h);

        assert_relative_eq!(joint.idadjoint(gvel.as_view()), numeric, epsilon = 1e-6);
    }
}
