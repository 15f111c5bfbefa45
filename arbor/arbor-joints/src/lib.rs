//! Concrete joints for arbor worlds.
//!
//! | Joint | dof | Pose `H_rn` |
//! |-------|-----|-------------|
//! | [`FreeJoint`] | 6 | any rigid transform, integrated with the twist exponential |
//! | [`FixedJoint`] | 0 | identity |
//! | [`RevoluteJoint`] | 1 | rotation about a unit axis |
//! | [`PrismaticJoint`] | 1 | translation along a unit axis |
//! | [`UniversalJoint`] | 2 | two successive rotations (`RzRy`, `RzRx`, `RyRx`, ...) |
//! | [`SphericalJoint`] | 3 | `Rz(q0) Ry(q1) Rx(q2)` |
//! | [`TranslationJoint`] | 3 | `T(q0, q1, q2)` |
//!
//! Every joint but [`FreeJoint`] has a vector configuration space and
//! implements [`LinearJoint`](arbor_core::LinearJoint).
//!
//! # Example
//!
//! ```
//! use arbor_core::{Body, World};
//! use arbor_joints::RevoluteJoint;
//! use arbor_spatial::mass::sphere_mass;
//!
//! let mut world = World::default();
//! let arm = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
//! let shoulder = world
//!     .add_link(world.ground(), RevoluteJoint::rz(0.0, 1.0), arm)
//!     .unwrap();
//! world.init().unwrap();
//! assert_eq!(world.joint_dofs(shoulder).unwrap(), 0..1);
//! ```

#![doc(html_root_url = "https://docs.rs/arbor-joints/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,   // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod fixed;
mod free;
mod rotation;
mod single;
mod translation;

pub use fixed::FixedJoint;
pub use free::FreeJoint;
pub use rotation::{SphericalJoint, UniversalJoint};
pub use single::{PrismaticJoint, RevoluteJoint};
pub use translation::TranslationJoint;

use arbor_types::{ArborError, Result};
use nalgebra::SVector;

/// Overwrite a fixed-size state vector from a slice of the same length.
pub(crate) fn assign<const N: usize>(
    what: &str,
    target: &mut SVector<f64, N>,
    values: &[f64],
) -> Result<()> {
    if values.len() != N {
        return Err(ArborError::dimension_mismatch(what, N, values.len()));
    }
    target.copy_from_slice(values);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod check {
    //! Finite-difference checks shared by the joint tests.

    use approx::assert_relative_eq;
    use arbor_core::LinearJoint;
    use arbor_spatial::transform::inv;
    use nalgebra::{DVector, Matrix6xX, Vector6};

    const STEP: f64 = 1e-6;

    fn pose_at(joint: &mut dyn LinearJoint, gpos: &DVector<f64>) -> nalgebra::Matrix4<f64> {
        joint.set_gpos(gpos.as_slice()).unwrap();
        joint.pose()
    }

    fn jacobian_at(joint: &mut dyn LinearJoint, gpos: &DVector<f64>) -> Matrix6xX<f64> {
        joint.set_gpos(gpos.as_slice()).unwrap();
        joint.jacobian()
    }

    /// `J ν` must equal the body twist read from `H⁻¹ dH/dt`, and `dJ` must
    /// equal the derivative of `J` along `ν`.
    pub(crate) fn assert_consistent(joint: &mut dyn LinearJoint, gpos: &[f64], gvel: &[f64]) {
        let q = DVector::from_column_slice(gpos);
        let v = DVector::from_column_slice(gvel);
        let ahead = &q + &v * STEP;
        let behind = &q - &v * STEP;

        let h = pose_at(joint, &q);
        let dh = (pose_at(joint, &ahead) - pose_at(joint, &behind)) / (2.0 * STEP);
        let body = inv(&h) * dh;
        let numeric = Vector6::new(
            body[(2, 1)],
            body[(0, 2)],
            body[(1, 0)],
            body[(0, 3)],
            body[(1, 3)],
            body[(2, 3)],
        );

        joint.set_gpos(gpos).unwrap();
        let twist = joint.twist(v.as_view());
        assert_relative_eq!(twist, numeric, epsilon = 1e-6);

        let numeric_dj = (jacobian_at(joint, &ahead) - jacobian_at(joint, &behind)) / (2.0 * STEP);
        joint.set_gpos(gpos).unwrap();
        assert_relative_eq!(joint.djacobian(v.as_view()), numeric_dj, epsilon = 1e-6);
    }
}
