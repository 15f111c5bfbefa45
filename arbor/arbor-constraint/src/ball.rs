//! Ball-and-socket (spherical) loop closure.

use arbor_core::{Constraint, Multibody};
use arbor_spatial::transform::translation;
use arbor_types::{ArborError, FrameId, Result};
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ADMITTANCE_EPSILON, point_velocity_row};

/// Keeps the origins of two frames together while leaving their relative
/// orientation free.
///
/// The force is expressed in ground coordinates and applied at both origins
/// with opposite signs. Position drift `e = p1 − p0` is corrected by asking
/// for the constraint velocity `−erp · e / dt`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BallAndSocketConstraint {
    frames: [FrameId; 2],
    erp: f64,
    jacobian: DMatrix<f64>,
    force: DVector<f64>,
    error: Vector3<f64>,
}

impl BallAndSocketConstraint {
    /// Joint `frame0` and `frame1` at their origins, with full error
    /// reduction.
    #[must_use]
    pub fn new(frame0: impl Into<FrameId>, frame1: impl Into<FrameId>) -> Self {
        Self {
            frames: [frame0.into(), frame1.into()],
            erp: 1.0,
            jacobian: DMatrix::zeros(3, 0),
            force: DVector::zeros(3),
            error: Vector3::zeros(),
        }
    }

    /// Set the error reduction parameter, in `[0, 1]`.
    pub fn with_erp(mut self, erp: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&erp) {
            return Err(ArborError::invalid_config(format!(
                "erp must be in [0, 1], got {erp}"
            )));
        }
        self.erp = erp;
        Ok(self)
    }

    /// Constrained frames.
    #[must_use]
    pub fn frames(&self) -> [FrameId; 2] {
        self.frames
    }

    /// Error reduction parameter.
    #[must_use]
    pub fn erp(&self) -> f64 {
        self.erp
    }

    /// Position error `p1 − p0` at the last update, in ground coordinates.
    #[must_use]
    pub fn error(&self) -> &Vector3<f64> {
        &self.error
    }
}

impl Constraint for BallAndSocketConstraint {
    fn ndol(&self) -> usize {
        3
    }

    fn init(&mut self, mb: &Multibody) -> Result<()> {
        for frame in self.frames {
            mb.frame(frame)?;
        }
        self.jacobian = DMatrix::zeros(3, mb.ndof());
        self.force = DVector::zeros(3);
        Ok(())
    }

    fn update(&mut self, mb: &Multibody, _dt: f64) -> Result<()> {
        let [f0, f1] = self.frames;
        let (pose0, pose1) = (mb.frame_pose(f0)?, mb.frame_pose(f1)?);
        let (jac0, jac1) = (mb.frame_jacobian(f0)?, mb.frame_jacobian(f1)?);
        let (p0, p1) = (translation(&pose0), translation(&pose1));
        let mut jacobian = DMatrix::zeros(3, mb.ndof());
        for (row, axis) in [Vector3::x(), Vector3::y(), Vector3::z()].iter().enumerate() {
            let jrow = point_velocity_row(&pose1, &jac1, &p1, axis)
                - point_velocity_row(&pose0, &jac0, &p0, axis);
            jacobian.row_mut(row).copy_from(&jrow);
        }
        self.jacobian = jacobian;
        self.error = p1 - p0;
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
        let singular = || ArborError::SingularAdmittance {
            constraint: format!("ball and socket {} / {}", self.frames[0], self.frames[1]),
        };
        if admittance.iter().any(|a| !a.is_finite()) {
            return Err(singular());
        }
        // directions the mechanism cannot move along get no force
        let impedance = admittance
            .clone_owned()
            .pseudo_inverse(ADMITTANCE_EPSILON)
            .map_err(|_| singular())?;
        let target = DVector::from_column_slice((self.error * (-self.erp / dt)).as_slice());
        let dforce = impedance * (target - vel);
        self.force += &dforce;
        Ok(dforce)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_core::{Body, SubFrame, World};
    use arbor_joints::{FreeJoint, RevoluteJoint};
    use arbor_spatial::mass::{sphere_mass, transport};
    use arbor_spatial::transform::transl;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rejects_bad_erp() {
        let ground = arbor_types::BodyId::GROUND;
        assert!(BallAndSocketConstraint::new(ground, ground)
            .with_erp(1.5)
            .unwrap_err()
            .is_config_error());
    }

    #[test]
    fn test_jacobian_maps_to_point_velocity() {
        let mut world = World::default();
        let body = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
        world
            .add_link(world.ground(), RevoluteJoint::rz(0.3, 2.0), body)
            .unwrap();
        let tip = world
            .add_subframe(SubFrame::new(body, transl(1.0, 0.0, 0.0)).unwrap())
            .unwrap();
        let mut ball = BallAndSocketConstraint::new(world.ground(), tip);
        world.init().unwrap();
        world.update_dynamic().unwrap();
        ball.init(world.multibody()).unwrap();
        ball.update(world.multibody(), 0.01).unwrap();

        // tip on a unit circle at angle 0.3 turning at 2 rad/s
        let vel = ball.jacobian() * world.gvel();
        assert_relative_eq!(vel[0], -2.0 * 0.3_f64.sin(), epsilon = 1e-12);
        assert_relative_eq!(vel[1], 2.0 * 0.3_f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(vel[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(ball.error().x, 0.3_f64.cos(), epsilon = 1e-12);
    }

    #[test]
    fn test_pins_free_body() {
        let mut world = World::default();
        let body = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
        let gvel = nalgebra::Vector6::new(0.0, 0.0, 1.0, 0.5, -0.2, 0.0);
        world
            .add_link(world.ground(), FreeJoint::new(transl(0.0, 0.0, 0.0), gvel).unwrap(), body)
            .unwrap();
        let id = world.add_constraint(BallAndSocketConstraint::new(world.ground(), body));
        let timeline: Vec<f64> = (0..=50).map(|i| f64::from(i) * 0.01).collect();
        arbor_core::simulate(&mut world, &timeline, &mut []).unwrap();

        let pose = world.frame_pose(body).unwrap();
        assert_relative_eq!(translation(&pose).norm(), 0.0, epsilon = 1e-9);
        // spin about the pinned point survives
        assert_relative_eq!(world.gvel()[2], 1.0, epsilon = 1e-9);
        assert!(world.is_constraint_enabled(id).unwrap());
    }

    fn unit_link(world: &mut World) -> arbor_types::BodyId {
        let mass = transport(&sphere_mass(0.05, 1.0), &transl(-0.5, 0.0, 0.0));
        world.add_body(Body::new(mass).unwrap())
    }

    #[test]
    fn test_closes_planar_loop() {
        // parallelogram: up, across, down, socketed back to the ground
        let mut world = World::default();
        let links = [unit_link(&mut world), unit_link(&mut world), unit_link(&mut world)];
        let angles = [FRAC_PI_2, -FRAC_PI_2, -FRAC_PI_2];
        let rates = [1.0, -1.0, 1.0];
        let mut parent: FrameId = world.ground().into();
        for ((link, q), dq) in links.iter().zip(angles).zip(rates) {
            world.add_link(parent, RevoluteJoint::rz(q, dq), *link).unwrap();
            parent = world
                .add_subframe(SubFrame::new(*link, transl(1.0, 0.0, 0.0)).unwrap())
                .unwrap()
                .into();
        }
        let anchor = world
            .add_subframe(SubFrame::new(world.ground(), transl(1.0, 0.0, 0.0)).unwrap())
            .unwrap();
        let id = world.add_constraint(BallAndSocketConstraint::new(anchor, parent));
        let timeline: Vec<f64> = (0..=100).map(|i| f64::from(i) * 0.01).collect();
        arbor_core::simulate(&mut world, &timeline, &mut []).unwrap();

        let gap = translation(&world.frame_pose(parent).unwrap())
            - translation(&world.frame_pose(anchor).unwrap());
        assert!(gap.norm() < 5e-3, "loop opened by {gap:?}");
        // out-of-plane axis carries no force
        assert_relative_eq!(world.constraint(id).unwrap().force()[2], 0.0, epsilon = 1e-9);
    }
}
