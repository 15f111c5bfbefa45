//! Bodies falling under their weight.

use approx::assert_relative_eq;
use arbor_control::WeightController;
use arbor_core::{Body, World, simulate};
use arbor_joints::{FreeJoint, PrismaticJoint, TranslationJoint};
use arbor_spatial::mass::{box_mass, sphere_mass};
use arbor_spatial::transform::{Transform, rotx, transl, translation};
use arbor_spatial::twist::Twist;
use arbor_types::WorldConfig;
use nalgebra::Vector3;

const DT: f64 = 0.01;

#[test]
fn translation_joint_one_step() {
    let mut world = World::default();
    let ball = world.add_body(Body::new(sphere_mass(0.1, 3.0)).unwrap());
    world
        .add_link(world.ground(), TranslationJoint::default(), ball)
        .unwrap();
    world.add_controller(WeightController::default());
    simulate(&mut world, &[0.0, DT], &mut []).unwrap();

    assert_relative_eq!(world.gvel()[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(world.gvel()[1], -9.81 * DT, epsilon = 1e-12);
    assert_relative_eq!(world.gvel()[2], 0.0, epsilon = 1e-12);
}

#[test]
fn prismatic_joint_along_z_up() {
    let mut world = World::new(WorldConfig::z_up()).unwrap();
    let ball = world.add_body(Body::new(sphere_mass(0.1, 0.5)).unwrap());
    world
        .add_link(world.ground(), PrismaticJoint::tz(2.0, 0.0), ball)
        .unwrap();
    world.add_controller(WeightController::default());
    let timeline: Vec<f64> = (0..=10).map(|i| f64::from(i) * DT).collect();
    simulate(&mut world, &timeline, &mut []).unwrap();

    assert_relative_eq!(world.gvel()[0], -9.81 * 10.0 * DT, epsilon = 1e-10);
    // symplectic Euler: z = z0 − g dt² n(n+1)/2
    let height = translation(&world.frame_pose(ball).unwrap()).z;
    assert_relative_eq!(height, 2.0 - 9.81 * DT * DT * 55.0, epsilon = 1e-10);
}

#[test]
fn tilted_free_body_falls_straight_down() {
    let mut world = World::default();
    let block = world
        .add_body(Body::new(box_mass(&Vector3::new(0.1, 0.2, 0.3), 2.0)).unwrap());
    let start: Transform = transl(1.0, 2.0, 3.0) * rotx(0.7);
    world
        .add_link(
            world.ground(),
            FreeJoint::new(start, Twist::zeros()).unwrap(),
            block,
        )
        .unwrap();
    world.add_controller(WeightController::default());
    let timeline: Vec<f64> = (0..=20).map(|i| f64::from(i) * DT).collect();
    simulate(&mut world, &timeline, &mut []).unwrap();

    let pose = world.frame_pose(block).unwrap();
    let drop = 9.81 * DT * DT * 210.0;
    assert_relative_eq!(translation(&pose), Vector3::new(1.0, 2.0 - drop, 3.0), epsilon = 1e-9);
    // no spin
    let twist = world.frame_twist(block).unwrap();
    assert_relative_eq!(twist.fixed_rows::<3>(0).norm(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(
        pose.fixed_view::<3, 3>(0, 0).into_owned(),
        start.fixed_view::<3, 3>(0, 0).into_owned(),
        epsilon = 1e-12
    );
}
