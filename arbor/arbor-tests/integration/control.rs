//! Controllers and observers on the simple arm.

use approx::assert_relative_eq;
use arbor_control::{EnergyMonitor, PdController, PerfMonitor, WeightController};
use arbor_core::{World, simulate};
use arbor_tests::{ArmParams, add_simple_arm};
use nalgebra::{DMatrix, DVector};

fn gpos(world: &World, joint: arbor_types::JointId) -> f64 {
    world.joint(joint).unwrap().as_linear().unwrap().gpos()[0]
}

#[test]
fn pd_drives_arm_to_target() {
    let mut world = World::default();
    let arm = add_simple_arm(&mut world, "", &ArmParams::default()).unwrap();
    let target = DVector::from_vec(vec![0.4, -0.6, 0.3]);
    world.add_controller(
        PdController::new(
            vec![arm.shoulder, arm.elbow, arm.wrist],
            DMatrix::identity(3, 3) * 20.0,
            DMatrix::identity(3, 3) * 4.0,
        )
        .with_gpos_des(target.clone()),
    );
    let timeline: Vec<f64> = (0..=1000).map(|i| f64::from(i) * 0.005).collect();
    simulate(&mut world, &timeline, &mut []).unwrap();

    for (joint, expected) in [arm.shoulder, arm.elbow, arm.wrist].into_iter().zip(target.iter()) {
        assert_relative_eq!(gpos(&world, joint), *expected, epsilon = 1e-3);
    }
    assert!(world.gvel().norm() < 1e-3);
}

#[test]
fn pd_on_subset_of_joints() {
    let mut world = World::default();
    let arm = add_simple_arm(&mut world, "", &ArmParams::default()).unwrap();
    world.add_controller(
        PdController::new(
            vec![arm.wrist],
            DMatrix::from_element(1, 1, 5.0),
            DMatrix::from_element(1, 1, 1.0),
        )
        .with_gpos_des(DVector::from_element(1, 0.5)),
    );
    world.init().unwrap();
    world.update_dynamic().unwrap();
    world.update_controllers(0.01).unwrap();

    assert_eq!(world.gforce()[0], 0.0);
    assert_eq!(world.gforce()[1], 0.0);
    assert_relative_eq!(world.gforce()[2], 2.5, epsilon = 1e-12);
}

#[test]
fn toppling_arm_keeps_energy_bounded() {
    let mut world = World::default();
    let arm = add_simple_arm(&mut world, "", &ArmParams::default()).unwrap();
    // start just off the upright position
    world.joint_mut(arm.shoulder).unwrap().as_linear_mut().unwrap().set_gpos(&[0.1]).unwrap();
    world.add_controller(WeightController::default());

    let mut energy = EnergyMonitor::default();
    let mut perf = PerfMonitor::new(false);
    let timeline: Vec<f64> = (0..=500).map(|i| f64::from(i) * 0.002).collect();
    simulate(&mut world, &timeline, &mut [&mut energy, &mut perf]).unwrap();

    assert_eq!(energy.time().len(), 500);
    assert_eq!(perf.durations().len(), 500);
    assert!(energy.potential()[499] < energy.potential()[0]);
    let scale = energy.potential()[0].abs();
    assert!(energy.max_drift() < 0.05 * scale, "drift {}", energy.max_drift());
}
