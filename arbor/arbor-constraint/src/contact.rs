//! Frictionless unilateral contact between two shapes.

use arbor_collision::collide;
use arbor_core::{Constraint, Multibody};
use arbor_spatial::transform::translation;
use arbor_types::{ArborError, ShapeId, Result};
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView, Vector3};
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ADMITTANCE_EPSILON, point_velocity_row};

/// Distance below which a [`PointContact`] becomes active, in meters.
pub const DEFAULT_PROXIMITY: f64 = 0.02;

/// Keeps two shapes from interpenetrating, pushing along the contact normal
/// only.
///
/// Active while the signed distance is below the proximity threshold. The
/// normal force `f ≥ 0` is projected so that the separation velocity reaches
/// at least `−d / dt`, which closes the gap in one step and pushes shapes
/// apart when they overlap.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointContact {
    shapes: [ShapeId; 2],
    proximity: f64,
    distance: f64,
    normal: Vector3<f64>,
    jacobian: DMatrix<f64>,
    force: DVector<f64>,
}

impl PointContact {
    /// Contact between `shape0` and `shape1`, with the normal pointing from
    /// the first toward the second.
    #[must_use]
    pub fn new(shape0: ShapeId, shape1: ShapeId) -> Self {
        Self {
            shapes: [shape0, shape1],
            proximity: DEFAULT_PROXIMITY,
            distance: f64::INFINITY,
            normal: Vector3::zeros(),
            jacobian: DMatrix::zeros(1, 0),
            force: DVector::zeros(1),
        }
    }

    /// Set the activation distance.
    pub fn with_proximity(mut self, proximity: f64) -> Result<Self> {
        if !proximity.is_finite() || proximity < 0.0 {
            return Err(ArborError::invalid_config(format!(
                "contact proximity must be finite and non-negative, got {proximity}"
            )));
        }
        self.proximity = proximity;
        Ok(self)
    }

    /// Shapes in contact.
    #[must_use]
    pub fn shapes(&self) -> [ShapeId; 2] {
        self.shapes
    }

    /// Signed distance at the last update.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Contact normal at the last update, from the first shape toward the
    /// second, in ground coordinates.
    #[must_use]
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }
}

impl Constraint for PointContact {
    fn ndol(&self) -> usize {
        1
    }

    fn init(&mut self, mb: &Multibody) -> Result<()> {
        for shape in self.shapes {
            mb.shape(shape)?;
        }
        self.jacobian = DMatrix::zeros(1, mb.ndof());
        self.force = DVector::zeros(1);
        self.distance = f64::INFINITY;
        Ok(())
    }

    fn update(&mut self, mb: &Multibody, _dt: f64) -> Result<()> {
        let [s0, s1] = self.shapes;
        let (shape0, shape1) = (mb.shape(s0)?, mb.shape(s1)?);
        let (pose0, pose1) = (mb.shape_pose(s0)?, mb.shape_pose(s1)?);
        let proximity = collide(&shape0.geometry, &pose0, &shape1.geometry, &pose1)?;

        let [first, second] = &proximity.frames;
        let (c0, c1, normal) = if proximity.swapped {
            (second, first, -proximity.normal())
        } else {
            (first, second, proximity.normal())
        };
        self.distance = proximity.distance;
        self.normal = normal;

        if !self.is_active() {
            self.force.fill(0.0);
            return Ok(());
        }
        let jac0 = mb.frame_jacobian(shape0.frame)?;
        let jac1 = mb.frame_jacobian(shape1.frame)?;
        let row = point_velocity_row(&pose1, &jac1, &translation(c1), &normal)
            - point_velocity_row(&pose0, &jac0, &translation(c0), &normal);
        self.jacobian = DMatrix::from_rows(&[row]);
        trace!(shapes = ?self.shapes, distance = self.distance, "contact active");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.distance < self.proximity
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
        let a = admittance[(0, 0)];
        if !a.is_finite() {
            return Err(ArborError::SingularAdmittance {
                constraint: format!("contact {} / {}", self.shapes[0], self.shapes[1]),
            });
        }
        if a.abs() < ADMITTANCE_EPSILON {
            // the normal is not a direction the mechanism can move along
            return Ok(DVector::zeros(1));
        }
        let previous = self.force[0];
        let force = (previous + (-self.distance / dt - vel[0]) / a).max(0.0);
        self.force[0] = force;
        Ok(DVector::from_element(1, force - previous))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_collision::{Geometry, Shape};
    use arbor_core::{Body, Controller, ControllerOutput, SubFrame, World, simulate};
    use arbor_joints::{PrismaticJoint, TranslationJoint};
    use arbor_spatial::mass::sphere_mass;
    use arbor_spatial::transform::transl;

    #[derive(Debug)]
    struct Push(f64);

    impl Controller for Push {
        fn update(&mut self, mb: &Multibody, _dt: f64) -> Result<ControllerOutput> {
            let mut output = ControllerOutput::zeros(mb.ndof());
            output.gforce[1] = self.0;
            Ok(output)
        }
    }

    fn ball_over_floor(height: f64, speed: f64) -> (World, ShapeId, ShapeId) {
        let mut world = World::default();
        let floor = world
            .add_shape(Shape::new(
                world.ground(),
                Geometry::plane([0.0, 1.0, 0.0, 0.0]).unwrap(),
            ))
            .unwrap();
        let ball = world.add_body(Body::new(sphere_mass(0.1, 2.0)).unwrap());
        world
            .add_link(
                world.ground(),
                TranslationJoint::new(Vector3::new(0.0, height, 0.0), Vector3::new(0.0, speed, 0.0)),
                ball,
            )
            .unwrap();
        let surface = world
            .add_shape(Shape::new(ball, Geometry::sphere(0.1).unwrap()))
            .unwrap();
        (world, floor, surface)
    }

    #[test]
    fn test_inactive_when_far() {
        let (mut world, floor, surface) = ball_over_floor(1.0, 0.0);
        let mut contact = PointContact::new(floor, surface);
        world.init().unwrap();
        world.update_dynamic().unwrap();
        contact.init(world.multibody()).unwrap();
        contact.update(world.multibody(), 0.01).unwrap();
        assert!(!contact.is_active());
        assert_relative_eq!(contact.distance(), 0.9, epsilon = 1e-12);
        assert_relative_eq!(*contact.normal(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_swapped_order_keeps_caller_normal() {
        let (mut world, floor, surface) = ball_over_floor(0.105, 0.0);
        let mut contact = PointContact::new(surface, floor);
        world.init().unwrap();
        world.update_dynamic().unwrap();
        contact.init(world.multibody()).unwrap();
        contact.update(world.multibody(), 0.01).unwrap();
        assert!(contact.is_active());
        assert_relative_eq!(*contact.normal(), -Vector3::y(), epsilon = 1e-12);
        // moving the ball up separates it from the floor
        assert_relative_eq!(contact.jacobian()[(0, 1)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ball_rests_on_floor() {
        let (mut world, floor, surface) = ball_over_floor(0.1, 0.0);
        world.add_controller(Push(-2.0 * 9.81));
        let id = world.add_constraint(PointContact::new(floor, surface));
        let timeline: Vec<f64> = (0..=200).map(|i| f64::from(i) * 0.005).collect();
        simulate(&mut world, &timeline, &mut []).unwrap();

        let height = world.frame_pose(world.multibody().shape(surface).unwrap().frame).unwrap()[(1, 3)];
        assert_relative_eq!(height, 0.1, epsilon = 1e-9);
        let force = world.constraint(id).unwrap().force()[0];
        assert_relative_eq!(force, 2.0 * 9.81, epsilon = 1e-6);
    }

    #[test]
    fn test_does_not_pull_separating_ball() {
        let (mut world, floor, surface) = ball_over_floor(0.1, 1.0);
        let id = world.add_constraint(PointContact::new(floor, surface));
        simulate(&mut world, &[0.0, 0.01], &mut []).unwrap();
        assert_relative_eq!(world.gvel()[1], 1.0, epsilon = 1e-12);
        assert_eq!(world.constraint(id).unwrap().force()[0], 0.0);
    }

    #[test]
    fn test_normal_outside_reachable_motion() {
        // the ball only slides along x, so the floor normal cannot act on it
        let mut world = World::default();
        let floor = world
            .add_shape(Shape::new(
                world.ground(),
                Geometry::plane([0.0, 1.0, 0.0, 0.0]).unwrap(),
            ))
            .unwrap();
        let ball = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
        let base = world
            .add_subframe(SubFrame::new(world.ground(), transl(0.0, 0.1, 0.0)).unwrap())
            .unwrap();
        world.add_link(base, PrismaticJoint::tx(0.0, 0.5), ball).unwrap();
        let surface = world
            .add_shape(Shape::new(ball, Geometry::sphere(0.1).unwrap()))
            .unwrap();
        let id = world.add_constraint(PointContact::new(floor, surface));
        simulate(&mut world, &[0.0, 0.01, 0.02], &mut []).unwrap();

        assert!(world.constraint(id).unwrap().is_active());
        assert_eq!(world.constraint(id).unwrap().force()[0], 0.0);
        assert_relative_eq!(world.gvel()[0], 0.5, epsilon = 1e-12);
    }
}
