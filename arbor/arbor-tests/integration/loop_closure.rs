//! Kinematic loops closed by ball-and-socket constraints.

use approx::assert_relative_eq;
use arbor_constraint::BallAndSocketConstraint;
use arbor_control::{EnergyMonitor, WeightController};
use arbor_core::{Body, Observer, SubFrame, World, simulate};
use arbor_joints::{FreeJoint, RevoluteJoint};
use arbor_spatial::transform::{rotx, rotz, transl, translation};
use arbor_spatial::twist::Twist;
use arbor_tests::link_mass;
use arbor_types::{BodyId, FrameId, Result, SubFrameId};

/// Largest distance seen between two frame origins.
#[derive(Debug)]
struct Gap {
    frames: [FrameId; 2],
    worst: f64,
}

impl Observer for Gap {
    fn init(&mut self, _world: &World, _timeline: &[f64]) -> Result<()> {
        self.worst = 0.0;
        Ok(())
    }

    fn update(&mut self, world: &World, _dt: f64) -> Result<()> {
        let p0 = translation(&world.frame_pose(self.frames[0])?);
        let p1 = translation(&world.frame_pose(self.frames[1])?);
        self.worst = self.worst.max((p1 - p0).norm());
        Ok(())
    }
}

/// Hinged arm whose tip carries a free link through a socket.
fn arm_with_hanging_link() -> (World, SubFrameId, BodyId) {
    let mut world = World::default();
    let arm = world.add_body(Body::new(link_mass(0.5, 1.0)).unwrap());
    world
        .add_link(world.ground(), RevoluteJoint::rz(0.5, 0.0), arm)
        .unwrap();
    let tip = world
        .add_subframe(SubFrame::new(arm, transl(0.0, 0.5, 0.0)).unwrap())
        .unwrap();

    let link = world.add_body(Body::new(link_mass(0.4, 0.5)).unwrap());
    let start = rotz(0.5) * transl(0.0, 0.5, 0.0) * rotx(0.3);
    world
        .add_link(world.ground(), FreeJoint::new(start, Twist::zeros()).unwrap(), link)
        .unwrap();
    (world, tip, link)
}

#[test]
fn socket_starts_closed() {
    let (mut world, tip, link) = arm_with_hanging_link();
    world.init().unwrap();
    world.update_geometric().unwrap();
    let gap = translation(&world.frame_pose(tip).unwrap())
        - translation(&world.frame_pose(link).unwrap());
    assert_relative_eq!(gap.norm(), 0.0, epsilon = 1e-12);
}

#[test]
fn socket_drift_stays_small() {
    let (mut world, tip, link) = arm_with_hanging_link();
    world.add_constraint(BallAndSocketConstraint::new(tip, link));
    world.add_controller(WeightController::default());

    let mut gap = Gap {
        frames: [tip.into(), link.into()],
        worst: f64::INFINITY,
    };
    let mut energy = EnergyMonitor::default();
    let timeline: Vec<f64> = (0..=1000).map(|i| f64::from(i) * 0.001).collect();
    simulate(&mut world, &timeline, &mut [&mut gap, &mut energy]).unwrap();

    assert!(gap.worst < 1e-3, "socket opened by {}", gap.worst);
    // the loop moved and did not gain energy
    assert!(energy.kinetic().iter().any(|k| *k > 1e-3));
    let first = energy.mechanical()[0];
    assert!(energy.mechanical().iter().all(|e| e.is_finite() && *e < first + 1e-2));
}

#[test]
fn unconstrained_link_falls_away() {
    let (mut world, tip, link) = arm_with_hanging_link();
    let socket = world.add_constraint(BallAndSocketConstraint::new(tip, link));
    world.disable_constraint(socket).unwrap();
    world.add_controller(WeightController::default());

    let mut gap = Gap {
        frames: [tip.into(), link.into()],
        worst: 0.0,
    };
    let timeline: Vec<f64> = (0..=200).map(|i| f64::from(i) * 0.001).collect();
    simulate(&mut world, &timeline, &mut [&mut gap]).unwrap();
    assert!(gap.worst > 1e-2);
}
