//! Concrete constraints for arbor worlds.
//!
//! Each constraint plugs into the blocked Gauss-Seidel solve of
//! [`World::update_constraints`](arbor_core::World::update_constraints):
//! each step they refresh their jacobian from the current state, then
//! project their own force given the predicted constraint velocity.
//!
//! - [`BallAndSocketConstraint`] - bilateral, keeps two frame origins
//!   together (3 degrees of liaison), with error reduction on position drift
//! - [`PointContact`] - unilateral and frictionless, keeps two shapes from
//!   interpenetrating along their contact normal (1 degree of liaison)
//! - [`JointLimits`] - unilateral, keeps each coordinate of a linear joint
//!   inside its bounds (1 degree of liaison per joint dof)
//!
//! Directions an admittance block cannot move along (for instance the
//! out-of-plane axis of a socket closing a planar loop) receive no force.
//!
//! # Example
//!
//! ```
//! use arbor_collision::{Geometry, Shape};
//! use arbor_constraint::PointContact;
//! use arbor_core::{Body, World};
//! use arbor_joints::TranslationJoint;
//! use arbor_spatial::mass::sphere_mass;
//! use nalgebra::Vector3;
//!
//! let mut world = World::default();
//! let floor = world
//!     .add_shape(Shape::new(world.ground(), Geometry::plane([0.0, 1.0, 0.0, 0.0]).unwrap()))
//!     .unwrap();
//! let ball = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
//! world
//!     .add_link(world.ground(), TranslationJoint::new(Vector3::new(0.0, 0.1, 0.0), Vector3::zeros()), ball)
//!     .unwrap();
//! let surface = world
//!     .add_shape(Shape::new(ball, Geometry::sphere(0.1).unwrap()))
//!     .unwrap();
//! world.add_constraint(PointContact::new(floor, surface));
//! world.init().unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/arbor-constraint/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,   // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod ball;
mod contact;
mod limits;

pub use ball::BallAndSocketConstraint;
pub use contact::{DEFAULT_PROXIMITY, PointContact};
pub use limits::JointLimits;

/// Singular values (or diagonal admittances) below this are treated as zero.
pub const ADMITTANCE_EPSILON: f64 = 1e-12;

use arbor_spatial::transform::Transform;
use nalgebra::{Matrix6xX, RowDVector, Vector3};

/// Row mapping generalized velocity to the velocity of `point` (rigidly
/// attached to a frame at `pose` with jacobian `jacobian`) along `direction`.
///
/// Both `point` and `direction` are in ground coordinates.
pub(crate) fn point_velocity_row(
    pose: &Transform,
    jacobian: &Matrix6xX<f64>,
    point: &Vector3<f64>,
    direction: &Vector3<f64>,
) -> RowDVector<f64> {
    let rotation = pose.fixed_view::<3, 3>(0, 0);
    let origin = pose.fixed_view::<3, 1>(0, 3);
    let lever = point - origin;
    // wrench of a unit force along `direction` at `point`, in the frame
    let torque = rotation.tr_mul(&lever.cross(direction));
    let force = rotation.tr_mul(direction);
    jacobian.fixed_rows::<3>(0).tr_mul(&torque).transpose()
        + jacobian.fixed_rows::<3>(3).tr_mul(&force).transpose()
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    fn assert_serde<T: Serialize + DeserializeOwned>() {}

    #[test]
    fn test_constraints_are_serializable() {
        assert_serde::<BallAndSocketConstraint>();
        assert_serde::<PointContact>();
        assert_serde::<JointLimits>();
    }
}
