//! Six-dof joint.

use arbor_core::Joint;
use arbor_spatial::transform::{Transform, ensure_homogeneous};
use arbor_spatial::twist::{Twist, exp};
use arbor_types::Result;
use nalgebra::{DVector, DVectorView, Matrix6xX};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::assign;

/// Unconstrained relative motion.
///
/// The generalized position is the pose itself and the generalized velocity
/// is the twist of the child-side frame, expressed in that frame. Positions
/// are integrated with the twist exponential, so the pose stays rigid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FreeJoint {
    pose: Transform,
    gvel: Twist,
}

impl FreeJoint {
    /// Free joint at `pose` moving with body twist `gvel`.
    pub fn new(pose: Transform, gvel: Twist) -> Result<Self> {
        ensure_homogeneous(&pose)?;
        Ok(Self { pose, gvel })
    }

    /// Free joint at the identity, at rest.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            pose: Transform::identity(),
            gvel: Twist::zeros(),
        }
    }

    /// Overwrite the pose.
    pub fn set_pose(&mut self, pose: Transform) -> Result<()> {
        ensure_homogeneous(&pose)?;
        self.pose = pose;
        Ok(())
    }
}

impl Default for FreeJoint {
    fn default() -> Self {
        Self::identity()
    }
}

impl Joint for FreeJoint {
    fn ndof(&self) -> usize {
        6
    }

    fn pose(&self) -> Transform {
        self.pose
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        Matrix6xX::identity(6)
    }

    fn djacobian(&self, _gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        Matrix6xX::zeros(6)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::from_column_slice(self.gvel.as_slice())
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        assign("free gvel", &mut self.gvel, gvel)
    }

    fn integrate(&mut self, gvel: DVectorView<'_, f64>, dt: f64) {
        self.gvel = Twist::from_fn(|i, _| gvel[i]);
        self.pose *= exp(&(self.gvel * dt));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_spatial::transform::{is_homogeneous_matrix, rotx, transl};

    #[test]
    fn test_rejects_non_rigid_pose() {
        let mut pose = Transform::identity();
        pose[(1, 1)] = 2.0;
        assert!(FreeJoint::new(pose, Twist::zeros()).is_err());
        assert!(FreeJoint::identity().set_pose(pose).is_err());
    }

    #[test]
    fn test_integrate_translation_in_body_frame() {
        // rotated a quarter turn about x, moving along body y: ground z
        let mut joint = FreeJoint::new(rotx(std::f64::consts::FRAC_PI_2), Twist::zeros()).unwrap();
        let gvel = DVector::from_vec(vec![0.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        joint.integrate(gvel.as_view(), 0.5);
        assert_relative_eq!(
            joint.pose().fixed_view::<3, 1>(0, 3).into_owned(),
            transl(0.0, 0.0, 1.0).fixed_view::<3, 1>(0, 3).into_owned(),
            epsilon = 1e-12
        );
        assert!(joint.as_linear().is_none());
    }

    #[test]
    fn test_integrate_stays_rigid() {
        let mut joint = FreeJoint::identity();
        let gvel = DVector::from_vec(vec![0.3, -1.2, 2.0, 0.5, 0.1, -0.7]);
        for _ in 0..1000 {
            joint.integrate(gvel.as_view(), 0.01);
        }
        assert!(is_homogeneous_matrix(&joint.pose(), 1e-9));
        assert_eq!(joint.gvel(), gvel);
    }
}
