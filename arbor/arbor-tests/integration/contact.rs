//! Unilateral contacts under gravity.

use approx::assert_relative_eq;
use arbor_collision::{Geometry, Shape};
use arbor_constraint::PointContact;
use arbor_control::WeightController;
use arbor_core::{Body, Observer, SubFrame, World, simulate};
use arbor_joints::FreeJoint;
use arbor_spatial::mass::{box_mass, sphere_mass};
use arbor_spatial::transform::{transl, translation};
use arbor_spatial::twist::Twist;
use arbor_types::{BodyId, ConstraintId, Result, SolverConfig, WorldConfig};
use nalgebra::Vector3;

const DT: f64 = 0.005;

fn timeline(steps: u32) -> Vec<f64> {
    (0..=steps).map(|i| f64::from(i) * DT).collect()
}

/// Height of one body at every step.
#[derive(Debug)]
struct HeightLog {
    body: BodyId,
    heights: Vec<f64>,
}

impl Observer for HeightLog {
    fn init(&mut self, _world: &World, _timeline: &[f64]) -> Result<()> {
        self.heights.clear();
        Ok(())
    }

    fn update(&mut self, world: &World, _dt: f64) -> Result<()> {
        self.heights.push(translation(&world.frame_pose(self.body)?).y);
        Ok(())
    }
}

fn falling_ball(world: &mut World, height: f64) -> (BodyId, arbor_types::ShapeId) {
    let ball = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
    world
        .add_link(
            world.ground(),
            FreeJoint::new(transl(0.0, height, 0.0), Twist::zeros()).unwrap(),
            ball,
        )
        .unwrap();
    let surface = world
        .add_shape(Shape::new(ball, Geometry::sphere(0.1).unwrap()))
        .unwrap();
    (ball, surface)
}

#[test]
fn ball_resting_on_plane_does_not_sink() {
    let mut world = World::default();
    let floor = world
        .add_shape(Shape::new(world.ground(), Geometry::plane([0.0, 1.0, 0.0, 0.0]).unwrap()))
        .unwrap();
    let (ball, surface) = falling_ball(&mut world, 0.1);
    world.add_controller(WeightController::default());
    let contact = world.add_constraint(PointContact::new(floor, surface));

    let mut log = HeightLog {
        body: ball,
        heights: Vec::new(),
    };
    simulate(&mut world, &timeline(400), &mut [&mut log]).unwrap();

    for height in &log.heights {
        assert_relative_eq!(*height, 0.1, epsilon = 1e-9);
    }
    let force = world.constraint(contact).unwrap().force()[0];
    assert_relative_eq!(force, 9.81, epsilon = 1e-6);
}

#[test]
fn dropped_ball_lands_without_sinking() {
    let mut world = World::default();
    let floor = world
        .add_shape(Shape::new(world.ground(), Geometry::plane([0.0, 1.0, 0.0, 0.0]).unwrap()))
        .unwrap();
    let (ball, surface) = falling_ball(&mut world, 0.3);
    world.add_controller(WeightController::default());
    world.add_constraint(PointContact::new(floor, surface));

    let mut log = HeightLog {
        body: ball,
        heights: Vec::new(),
    };
    simulate(&mut world, &timeline(200), &mut [&mut log]).unwrap();

    let lowest = log.heights.iter().copied().fold(f64::INFINITY, f64::min);
    assert!(lowest > 0.1 - 1e-9, "ball sank to {lowest}");
    let last = translation(&world.frame_pose(ball).unwrap()).y;
    assert_relative_eq!(last, 0.1, epsilon = 1e-9);
    assert_relative_eq!(world.gvel().norm(), 0.0, epsilon = 1e-9);
}

#[test]
fn ball_lands_on_table() {
    let mut world = World::default();
    let top = world
        .add_shape(Shape::new(
            world.ground(),
            Geometry::cuboid(Vector3::new(1.0, 0.5, 1.0)).unwrap(),
        ))
        .unwrap();
    let (ball, surface) = falling_ball(&mut world, 0.7);
    world.add_controller(WeightController::default());
    // table first: exercises the swapped dispatch
    world.add_constraint(PointContact::new(surface, top));
    simulate(&mut world, &timeline(200), &mut []).unwrap();

    let height = translation(&world.frame_pose(ball).unwrap()).y;
    assert_relative_eq!(height, 0.6, epsilon = 1e-9);
}

#[test]
fn block_on_four_corners() {
    let mut world = World::new(WorldConfig::default().solver(SolverConfig::high_accuracy())).unwrap();
    let floor = world
        .add_shape(Shape::new(world.ground(), Geometry::plane([0.0, 1.0, 0.0, 0.0]).unwrap()))
        .unwrap();
    let half = Vector3::new(0.3, 0.1, 0.2);
    let block = world.add_body(Body::new(box_mass(&half, 4.0)).unwrap());
    world
        .add_link(
            world.ground(),
            FreeJoint::new(transl(0.0, half.y, 0.0), Twist::zeros()).unwrap(),
            block,
        )
        .unwrap();
    let mut contacts: Vec<ConstraintId> = Vec::new();
    for (sx, sz) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
        let corner = world
            .add_subframe(SubFrame::new(block, transl(sx * half.x, -half.y, sz * half.z)).unwrap())
            .unwrap();
        let point = world.add_shape(Shape::new(corner, Geometry::Point)).unwrap();
        contacts.push(world.add_constraint(PointContact::new(floor, point)));
    }
    world.add_controller(WeightController::default());
    simulate(&mut world, &timeline(100), &mut []).unwrap();

    let pose = world.frame_pose(block).unwrap();
    assert_relative_eq!(translation(&pose).y, half.y, epsilon = 1e-6);
    let total: f64 = contacts
        .iter()
        .map(|id| world.constraint(*id).unwrap().force()[0])
        .sum();
    assert_relative_eq!(total, 4.0 * 9.81, max_relative = 1e-3);
}
