//! Position limits on a joint with a vector configuration space.

use arbor_core::{Constraint, Multibody};
use arbor_types::{ArborError, JointId, Result};
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ADMITTANCE_EPSILON;

/// Keeps each coordinate of a linear joint inside `[min, max]`.
///
/// One degree of liaison per joint dof. A coordinate's force pushes up
/// (positive) only while its next position would fall below `min`, and down
/// only while it would exceed `max`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    joint: JointId,
    min: DVector<f64>,
    max: DVector<f64>,
    gpos: DVector<f64>,
    jacobian: DMatrix<f64>,
    force: DVector<f64>,
}

impl JointLimits {
    /// Limit `joint` to `min ≤ q ≤ max`, coordinate by coordinate.
    pub fn new(joint: JointId, min: &[f64], max: &[f64]) -> Result<Self> {
        if min.len() != max.len() {
            return Err(ArborError::dimension_mismatch(
                "joint limits max",
                min.len(),
                max.len(),
            ));
        }
        let inverted = min
            .iter()
            .zip(max)
            .find(|(lo, hi)| lo.is_nan() || hi.is_nan() || lo > hi);
        if let Some((lo, hi)) = inverted {
            return Err(ArborError::invalid_config(format!(
                "joint limit min {lo} exceeds max {hi}"
            )));
        }
        let n = min.len();
        Ok(Self {
            joint,
            min: DVector::from_column_slice(min),
            max: DVector::from_column_slice(max),
            gpos: DVector::zeros(n),
            jacobian: DMatrix::zeros(n, 0),
            force: DVector::zeros(n),
        })
    }

    /// Limited joint.
    #[must_use]
    pub fn joint(&self) -> JointId {
        self.joint
    }

    /// Lower bounds.
    #[must_use]
    pub fn min(&self) -> &DVector<f64> {
        &self.min
    }

    /// Upper bounds.
    #[must_use]
    pub fn max(&self) -> &DVector<f64> {
        &self.max
    }
}

impl Constraint for JointLimits {
    fn ndol(&self) -> usize {
        self.min.len()
    }

    fn init(&mut self, mb: &Multibody) -> Result<()> {
        let joint = mb.joint(self.joint)?;
        if joint.as_linear().is_none() {
            return Err(ArborError::NotLinearJoint { joint: self.joint });
        }
        let n = self.ndol();
        if joint.ndof() != n {
            return Err(ArborError::dimension_mismatch(
                "joint limits",
                joint.ndof(),
                n,
            ));
        }
        let mut jacobian = DMatrix::zeros(n, mb.ndof());
        for (row, col) in mb.joint_dofs(self.joint)?.enumerate() {
            jacobian[(row, col)] = 1.0;
        }
        self.jacobian = jacobian;
        self.force = DVector::zeros(n);
        Ok(())
    }

    fn update(&mut self, mb: &Multibody, _dt: f64) -> Result<()> {
        let joint = mb
            .joint(self.joint)?
            .as_linear()
            .ok_or(ArborError::NotLinearJoint { joint: self.joint })?;
        self.gpos = joint.gpos();
        Ok(())
    }

    fn is_active(&self) -> bool {
        true
    }

    fn jacobian(&self) -> &DMatrix<f64> {
        &self.jacobian
    }

    fn force(&self) -> &DVector<f64> {
        &self.force
    }

    fn solve(
        &mut self,
        vel: DVectorView<'_, f64>,
        admittance: DMatrixView<'_, f64>,
        dt: f64,
    ) -> Result<DVector<f64>> {
        let n = self.ndol();
        let mut vel = vel.clone_owned();
        let mut dforce = DVector::zeros(n);
        for i in 0..n {
            let a = admittance[(i, i)];
            if !a.is_finite() {
                return Err(ArborError::SingularAdmittance {
                    constraint: format!("joint limits on {}", self.joint),
                });
            }
            if a.abs() < ADMITTANCE_EPSILON {
                continue;
            }
            // velocity this coordinate would have without its own force
            let free = vel[i] - a * self.force[i];
            let lowest = (self.min[i] - self.gpos[i]) / dt;
            let highest = (self.max[i] - self.gpos[i]) / dt;
            let force = if free < lowest {
                (lowest - free) / a
            } else if free > highest {
                (highest - free) / a
            } else {
                0.0
            };
            let delta = force - self.force[i];
            self.force[i] = force;
            dforce[i] = delta;
            vel += admittance.column(i) * delta;
        }
        Ok(dforce)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_core::{Body, World, simulate};
    use arbor_joints::{FreeJoint, PrismaticJoint, RevoluteJoint};
    use arbor_spatial::mass::{sphere_mass, transport};
    use arbor_spatial::transform::transl;

    fn hinge_arm(gpos: f64, gvel: f64) -> (World, JointId) {
        let mut world = World::default();
        let mass = transport(&sphere_mass(0.05, 1.0), &transl(-0.5, 0.0, 0.0));
        let arm = world.add_body(Body::new(mass).unwrap());
        let hinge = world
            .add_link(world.ground(), RevoluteJoint::rz(gpos, gvel), arm)
            .unwrap();
        (world, hinge)
    }

    fn position(world: &World, joint: JointId) -> f64 {
        world.joint(joint).unwrap().as_linear().unwrap().gpos()[0]
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = JointLimits::new(JointId::new(0), &[1.0], &[-1.0]).unwrap_err();
        assert!(err.is_config_error());
        assert!(matches!(
            JointLimits::new(JointId::new(0), &[0.0, 0.0], &[1.0]),
            Err(ArborError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_free_joint() {
        let mut world = World::default();
        let body = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
        let free = world
            .add_link(world.ground(), FreeJoint::identity(), body)
            .unwrap();
        world.add_constraint(JointLimits::new(free, &[0.0; 6], &[1.0; 6]).unwrap());
        assert_eq!(world.init(), Err(ArborError::NotLinearJoint { joint: free }));
    }

    #[test]
    fn test_rejects_wrong_size() {
        let (mut world, hinge) = hinge_arm(0.0, 0.0);
        world.add_constraint(JointLimits::new(hinge, &[0.0, 0.0], &[1.0, 1.0]).unwrap());
        assert!(matches!(
            world.init(),
            Err(ArborError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_stops_at_upper_limit() {
        let (mut world, hinge) = hinge_arm(0.0, 2.0);
        let id = world.add_constraint(JointLimits::new(hinge, &[-0.5], &[0.5]).unwrap());
        let timeline: Vec<f64> = (0..=100).map(|i| f64::from(i) * 0.01).collect();
        simulate(&mut world, &timeline, &mut []).unwrap();

        assert_relative_eq!(position(&world, hinge), 0.5, epsilon = 1e-9);
        assert_relative_eq!(world.gvel()[0], 0.0, epsilon = 1e-9);
        // resting on the stop with no load needs no force
        assert_relative_eq!(world.constraint(id).unwrap().force()[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_idle_inside_limits() {
        let (mut world, hinge) = hinge_arm(0.0, 1.0);
        let id = world.add_constraint(JointLimits::new(hinge, &[-3.14], &[3.14]).unwrap());
        simulate(&mut world, &[0.0, 0.01, 0.02], &mut []).unwrap();
        assert_relative_eq!(position(&world, hinge), 0.02, epsilon = 1e-12);
        assert_eq!(world.constraint(id).unwrap().force()[0], 0.0);
    }

    #[test]
    fn test_pushes_back_from_lower_limit() {
        let mut world = World::default();
        let body = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
        let slider = world
            .add_link(world.ground(), PrismaticJoint::tx(-0.2, 0.0), body)
            .unwrap();
        world.add_constraint(JointLimits::new(slider, &[0.0], &[1.0]).unwrap());
        simulate(&mut world, &[0.0, 0.01], &mut []).unwrap();
        // violated limit is recovered in one step
        assert_relative_eq!(position(&world, slider), 0.0, epsilon = 1e-12);
    }
}
