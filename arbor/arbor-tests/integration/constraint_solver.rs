//! Constraint solver behavior with nothing to solve.

use arbor_collision::{Geometry, Shape};
use arbor_constraint::{BallAndSocketConstraint, PointContact};
use arbor_control::WeightController;
use arbor_core::{World, simulate};
use arbor_tests::{ArmParams, SimpleArm, add_simple_arm};

fn arm_world() -> (World, SimpleArm) {
    let mut world = World::default();
    let arm = add_simple_arm(&mut world, "", &ArmParams::default()).unwrap();
    world.joint_mut(arm.elbow).unwrap().set_gvel(&[0.7]).unwrap();
    world.add_controller(WeightController::default());
    (world, arm)
}

/// Same arm, plus a contact far away and a disabled socket.
fn arm_world_with_idle_constraints() -> (World, SimpleArm) {
    let (mut world, arm) = arm_world();
    let floor = world
        .add_shape(Shape::new(
            world.ground(),
            Geometry::plane([0.0, 1.0, 0.0, -10.0]).unwrap(),
        ))
        .unwrap();
    let hand = world
        .add_shape(Shape::new(arm.end_effector, Geometry::sphere(0.05).unwrap()))
        .unwrap();
    world.add_constraint(PointContact::new(floor, hand));
    let socket = world.add_constraint(BallAndSocketConstraint::new(world.ground(), arm.end_effector));
    world.disable_constraint(socket).unwrap();
    (world, arm)
}

#[test]
fn idle_constraints_leave_gforce_unchanged() {
    let (mut plain, _) = arm_world();
    let (mut idle, _) = arm_world_with_idle_constraints();
    for world in [&mut plain, &mut idle] {
        world.init().unwrap();
        world.update_dynamic().unwrap();
        world.update_controllers(0.01).unwrap();
        world.update_constraints(0.01, 100, 1e-6).unwrap();
    }
    assert_eq!(plain.gforce(), idle.gforce());
    assert_eq!(plain.gvel(), idle.gvel());
}

#[test]
fn idle_constraints_leave_trajectory_unchanged() {
    let (mut plain, _) = arm_world();
    let (mut idle, _) = arm_world_with_idle_constraints();
    let timeline: Vec<f64> = (0..=100).map(|i| f64::from(i) * 0.01).collect();
    simulate(&mut plain, &timeline, &mut []).unwrap();
    simulate(&mut idle, &timeline, &mut []).unwrap();
    assert_eq!(plain.gvel(), idle.gvel());
}
