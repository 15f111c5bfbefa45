//! Zero-dof joint.

use arbor_core::{Joint, LinearJoint};
use arbor_spatial::transform::Transform;
use arbor_types::{ArborError, Result};
use nalgebra::{DVector, DVectorView, Matrix6xX};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rigid weld: the two frames coincide.
///
/// Useful to attach a body to the tree without adding degrees of freedom;
/// the offset comes from the frames passed to `add_link`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FixedJoint;

impl FixedJoint {
    /// Create a fixed joint.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn ensure_empty(what: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        Ok(())
    } else {
        Err(ArborError::dimension_mismatch(what, 0, values.len()))
    }
}

impl Joint for FixedJoint {
    fn ndof(&self) -> usize {
        0
    }

    fn pose(&self) -> Transform {
        Transform::identity()
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        Matrix6xX::zeros(0)
    }

    fn djacobian(&self, _gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        Matrix6xX::zeros(0)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::zeros(0)
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        ensure_empty("fixed gvel", gvel)
    }

    fn integrate(&mut self, _gvel: DVectorView<'_, f64>, _dt: f64) {}

    fn as_linear(&self) -> Option<&dyn LinearJoint> {
        Some(self)
    }

    fn as_linear_mut(&mut self) -> Option<&mut dyn LinearJoint> {
        Some(self)
    }
}

impl LinearJoint for FixedJoint {
    fn gpos(&self) -> DVector<f64> {
        DVector::zeros(0)
    }

    fn set_gpos(&mut self, gpos: &[f64]) -> Result<()> {
        ensure_empty("fixed gpos", gpos)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use arbor_core::{Body, SubFrame, World};
    use arbor_spatial::mass::point_mass;
    use arbor_spatial::transform::transl;

    #[test]
    fn test_fixed_joint_adds_no_dof() {
        let mut world = World::default();
        let base = world.add_body(Body::new(point_mass(1.0)).unwrap());
        let offset = world
            .add_subframe(SubFrame::new(world.ground(), transl(0.0, 2.0, 0.0)).unwrap())
            .unwrap();
        let joint = world.add_link(offset, FixedJoint::new(), base).unwrap();
        world.init().unwrap();
        world.update_geometric().unwrap();

        assert_eq!(world.ndof(), 0);
        assert_eq!(world.joint_dofs(joint).unwrap(), 0..0);
        assert_eq!(world.frame_pose(base).unwrap(), transl(0.0, 2.0, 0.0));
        assert!(FixedJoint.set_gvel(&[1.0]).is_err());
    }
}
