//! Point-mass pendulum against its closed forms.

use approx::assert_relative_eq;
use arbor_control::{EnergyMonitor, WeightController};
use arbor_core::{Body, World, simulate};
use arbor_joints::RevoluteJoint;
use arbor_spatial::mass::{point_mass, transport};
use arbor_spatial::transform::transl;
use arbor_types::JointId;

const MASS: f64 = 1.3;
const LENGTH: f64 = 0.7;
const GRAVITY: f64 = 9.81;

/// Bob hanging at `−LENGTH` along y when the hinge angle is zero.
fn pendulum(angle: f64, rate: f64) -> (World, JointId) {
    let mut world = World::default();
    let bob = world.add_body(
        Body::new(transport(&point_mass(MASS), &transl(0.0, LENGTH, 0.0))).unwrap(),
    );
    let hinge = world
        .add_link(world.ground(), RevoluteJoint::rz(angle, rate), bob)
        .unwrap();
    world.add_controller(WeightController::default());
    (world, hinge)
}

#[test]
fn mass_matrix_is_m_l_squared() {
    let (mut world, _) = pendulum(0.4, 0.0);
    world.init().unwrap();
    world.update_dynamic().unwrap();
    assert_eq!(world.mass().shape(), (1, 1));
    assert_relative_eq!(world.mass()[(0, 0)], MASS * LENGTH * LENGTH, epsilon = 1e-12);
}

#[test]
fn weight_torque_pulls_back_to_vertical() {
    for angle in [-1.0, -0.2, 0.0, 0.5, 2.0] {
        let (mut world, _) = pendulum(angle, 0.0);
        world.init().unwrap();
        world.update_dynamic().unwrap();
        world.update_controllers(0.01).unwrap();
        assert_relative_eq!(
            world.gforce()[0],
            -MASS * GRAVITY * LENGTH * f64::sin(angle),
            epsilon = 1e-12
        );
    }
}

#[test]
fn no_nonlinear_effects_on_single_hinge() {
    let (mut world, _) = pendulum(0.3, 4.0);
    world.init().unwrap();
    world.update_dynamic().unwrap();
    assert_relative_eq!(world.state().nleffects[(0, 0)], 0.0, epsilon = 1e-12);
}

#[test]
fn small_oscillation_period() {
    let (mut world, hinge) = pendulum(0.05, 0.0);
    let dt = 0.0005;
    let period = 2.0 * std::f64::consts::PI * (LENGTH / GRAVITY).sqrt();
    // half a period later the bob is on the other side
    let steps = (period / 2.0 / dt).round() as u32;
    let timeline: Vec<f64> = (0..=steps).map(|i| f64::from(i) * dt).collect();
    simulate(&mut world, &timeline, &mut []).unwrap();

    let angle = world.joint(hinge).unwrap().as_linear().unwrap().gpos()[0];
    assert_relative_eq!(angle, -0.05, epsilon = 2e-3);
}

#[test]
fn swing_keeps_energy() {
    let (mut world, _) = pendulum(1.0, 0.0);
    let timeline: Vec<f64> = (0..=2000).map(|i| f64::from(i) * 0.001).collect();
    let mut energy = EnergyMonitor::default();
    simulate(&mut world, &timeline, &mut [&mut energy]).unwrap();

    let start = energy.mechanical()[0];
    assert_relative_eq!(start, -MASS * GRAVITY * LENGTH * f64::cos(1.0), epsilon = 1e-12);
    // semi-implicit Euler: bounded drift, no blow-up
    assert!(energy.max_drift() < 0.05 * start.abs());
}
