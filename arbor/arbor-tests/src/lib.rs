//! Robot fixtures shared by the arbor integration tests.
//!
//! - [`add_simple_arm`]: planar 3-R arm hanging from the ground
//! - [`add_snake`]: planar chain of hinged links, optionally on a free base

#![doc(html_root_url = "https://docs.rs/arbor-tests/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

use arbor_core::{Body, SubFrame, World};
use arbor_joints::{FreeJoint, RevoluteJoint};
use arbor_spatial::mass::{MassMatrix, box_mass, transport};
use arbor_spatial::transform::transl;
use arbor_types::{ArborError, BodyId, Entity, FrameId, JointId, Result, SubFrameId};
use nalgebra::Vector3;

/// Mass matrix of a slender box of length `length` along y, expressed at its
/// base.
#[must_use]
pub fn link_mass(length: f64, mass: f64) -> MassMatrix {
    let half_extents = Vector3::new(length / 20.0, length / 2.0, length / 20.0);
    transport(&box_mass(&half_extents, mass), &transl(0.0, -length / 2.0, 0.0))
}

/// Dimensions of [`add_simple_arm`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArmParams {
    /// Arm, forearm and hand lengths.
    pub lengths: [f64; 3],
    /// Arm, forearm and hand masses.
    pub masses: [f64; 3],
}

impl Default for ArmParams {
    fn default() -> Self {
        Self {
            lengths: [0.5, 0.4, 0.2],
            masses: [1.0, 0.8, 0.2],
        }
    }
}

/// Handles of a simple arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleArm {
    /// Ground to arm.
    pub shoulder: JointId,
    /// Arm to forearm.
    pub elbow: JointId,
    /// Forearm to hand.
    pub wrist: JointId,
    /// Links, from the shoulder out.
    pub bodies: [BodyId; 3],
    /// Tip of the hand.
    pub end_effector: SubFrameId,
}

/// Add a planar arm of three hinges about z, every link along y. Entities
/// are named after their role, prefixed by `prefix`.
pub fn add_simple_arm(world: &mut World, prefix: &str, params: &ArmParams) -> Result<SimpleArm> {
    let [l0, l1, l2] = params.lengths;
    let mut bodies = [BodyId::GROUND; 3];
    for (slot, (length, mass)) in bodies.iter_mut().zip(params.lengths.iter().zip(&params.masses)) {
        *slot = world.add_body(Body::new(link_mass(*length, *mass))?);
    }
    let [arm, forearm, hand] = bodies;

    let shoulder = world.add_link(world.ground(), RevoluteJoint::rz(0.0, 0.0), arm)?;
    let elbow_base = world.add_subframe(SubFrame::new(arm, transl(0.0, l0, 0.0))?)?;
    let elbow = world.add_link(elbow_base, RevoluteJoint::rz(0.0, 0.0), forearm)?;
    let wrist_base = world.add_subframe(SubFrame::new(forearm, transl(0.0, l1, 0.0))?)?;
    let wrist = world.add_link(wrist_base, RevoluteJoint::rz(0.0, 0.0), hand)?;
    let end_effector = world.add_subframe(SubFrame::new(hand, transl(0.0, l2, 0.0))?)?;

    let names: [(Entity, &str); 9] = [
        (Entity::Body(arm), "Arm"),
        (Entity::Body(forearm), "Forearm"),
        (Entity::Body(hand), "Hand"),
        (Entity::Joint(shoulder), "Shoulder"),
        (Entity::Joint(elbow), "Elbow"),
        (Entity::Joint(wrist), "Wrist"),
        (Entity::SubFrame(elbow_base), "ElbowBaseFrame"),
        (Entity::SubFrame(wrist_base), "WristBaseFrame"),
        (Entity::SubFrame(end_effector), "EndEffector"),
    ];
    for (entity, name) in names {
        world.set_name(entity, format!("{prefix}{name}"))?;
    }

    Ok(SimpleArm {
        shoulder,
        elbow,
        wrist,
        bodies,
        end_effector,
    })
}

/// Handles of a snake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    /// Free joint under the base, when the snake is not fixed.
    pub base: Option<(JointId, BodyId)>,
    /// Hinges, from the root out.
    pub joints: Vec<JointId>,
    /// Links, from the root out.
    pub bodies: Vec<BodyId>,
    /// Tip of the last link.
    pub tip: SubFrameId,
}

/// Add a planar snake of `gpos.len()` links of length 0.5 and mass 2,
/// hinged about z. Without `fixed`, the first hinge sits on a cubic base
/// attached to the ground by a free joint.
pub fn add_snake(world: &mut World, gpos: &[f64], gvel: &[f64], fixed: bool) -> Result<Snake> {
    const LENGTH: f64 = 0.5;
    const MASS: f64 = 2.0;
    if gpos.len() != gvel.len() {
        return Err(ArborError::dimension_mismatch("snake gvel", gpos.len(), gvel.len()));
    }
    if gpos.is_empty() {
        return Err(ArborError::invalid_config("snake needs at least one link"));
    }

    let (mut frame, base): (FrameId, _) = if fixed {
        (world.ground().into(), None)
    } else {
        let half = LENGTH / 2.0;
        let body = world.add_body(Body::new(box_mass(&Vector3::new(half, half, half), MASS))?);
        let joint = world.add_link(world.ground(), FreeJoint::identity(), body)?;
        (body.into(), Some((joint, body)))
    };

    let mut joints = Vec::with_capacity(gpos.len());
    let mut bodies = Vec::with_capacity(gpos.len());
    let mut tip = None;
    for (q, dq) in gpos.iter().zip(gvel) {
        let body = world.add_body(Body::new(link_mass(LENGTH, MASS))?);
        joints.push(world.add_link(frame, RevoluteJoint::rz(*q, *dq), body)?);
        bodies.push(body);
        let end = world.add_subframe(SubFrame::new(body, transl(0.0, LENGTH, 0.0))?)?;
        frame = end.into();
        tip = Some(end);
    }
    let tip = tip.ok_or_else(|| ArborError::invalid_config("snake has no links"))?;

    Ok(Snake {
        base,
        joints,
        bodies,
        tip,
    })
}
