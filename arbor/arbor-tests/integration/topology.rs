//! Tree editing, traversal and naming on the simple arm.

use approx::assert_relative_eq;
use arbor_control::WeightController;
use arbor_core::{Body, Link, ParseTarget, World};
use arbor_joints::{RevoluteJoint, SphericalJoint};
use arbor_spatial::transform::translation;
use arbor_tests::{ArmParams, SimpleArm, add_simple_arm, link_mass};
use arbor_types::{ArborError, BodyId, Entity, FrameId, JointId};
use nalgebra::Vector3;

fn arm() -> (World, SimpleArm) {
    let mut world = World::default();
    let arm = add_simple_arm(&mut world, "", &ArmParams::default()).unwrap();
    (world, arm)
}

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    Init(BodyId),
    Link(FrameId, JointId, FrameId),
    Register(Entity),
}

impl ParseTarget for Recorder {
    fn init_parse(&mut self, ground: BodyId, _up: &Vector3<f64>, _current_time: f64) {
        self.events.push(Event::Init(ground));
    }

    fn add_link(&mut self, frame0: FrameId, joint: JointId, frame1: FrameId) {
        self.events.push(Event::Link(frame0, joint, frame1));
    }

    fn register(&mut self, entity: Entity) {
        self.events.push(Event::Register(entity));
    }
}

fn describe(world: &World, event: Event) -> String {
    let name = |entity: Entity| {
        world
            .name(entity)
            .map_or_else(|| entity.to_string(), str::to_string)
    };
    match event {
        Event::Init(ground) => format!("init {}", name(Entity::Body(ground))),
        Event::Link(f0, joint, f1) => format!(
            "{} -{}-> {}",
            name(f0.into()),
            name(Entity::Joint(joint)),
            name(f1.into())
        ),
        Event::Register(entity) => name(entity),
    }
}

#[test]
fn parse_walks_arm_in_order() {
    let (mut world, _) = arm();
    world.add_controller(WeightController::default());
    let mut recorder = Recorder::default();
    world.parse(&mut recorder).unwrap();

    let described: Vec<String> = recorder
        .events
        .iter()
        .map(|event| describe(&world, *event))
        .collect();
    assert_eq!(
        described,
        vec![
            "init ground",
            "ground",
            "ground -Shoulder-> Arm",
            "Arm",
            "ElbowBaseFrame",
            "ElbowBaseFrame -Elbow-> Forearm",
            "Forearm",
            "WristBaseFrame",
            "WristBaseFrame -Wrist-> Hand",
            "Hand",
            "EndEffector",
            "Controller(0)",
        ]
    );
}

#[test]
fn dofs_follow_depth_first_order() {
    let (mut world, arm) = arm();
    world.init().unwrap();
    assert_eq!(world.ndof(), 3);
    assert_eq!(world.joints(), vec![arm.shoulder, arm.elbow, arm.wrist]);
    assert_eq!(world.joint_dofs(arm.shoulder).unwrap(), 0..1);
    assert_eq!(world.joint_dofs(arm.elbow).unwrap(), 1..2);
    assert_eq!(world.joint_dofs(arm.wrist).unwrap(), 2..3);
    assert_eq!(
        world.ancestor_joints(arm.bodies[2]).unwrap(),
        vec![arm.wrist, arm.elbow, arm.shoulder]
    );
}

#[test]
fn end_effector_at_full_reach() {
    let (mut world, arm) = arm();
    world.init().unwrap();
    world.update_geometric().unwrap();
    let tip = translation(&world.frame_pose(arm.end_effector).unwrap());
    assert_relative_eq!(tip, Vector3::new(0.0, 1.1, 0.0), epsilon = 1e-12);
}

#[test]
fn replace_joint_keeps_child_and_reassigns_dofs() {
    let (mut world, arm) = arm();
    world.init().unwrap();
    world
        .replace_joint(arm.elbow, SphericalJoint::new(Vector3::new(0.2, 0.0, 0.0), Vector3::zeros()))
        .unwrap();

    assert_eq!(world.ndof(), 5);
    assert_eq!(world.joints(), vec![arm.shoulder, arm.elbow, arm.wrist]);
    assert_eq!(world.joint_dofs(arm.elbow).unwrap(), 1..4);
    assert_eq!(world.joint_dofs(arm.wrist).unwrap(), 4..5);
    assert_eq!(world.joint(arm.elbow).unwrap().ndof(), 3);
    assert_eq!(world.name(Entity::Joint(arm.elbow)), Some("Elbow"));
}

#[test]
fn replace_joint_by_chain() {
    let (mut world, arm) = arm();
    world.init().unwrap();
    let [_, forearm, _] = arm.bodies;
    let elbow_base = world.first_named("ElbowBaseFrame").unwrap();
    let Entity::SubFrame(elbow_base) = elbow_base else {
        panic!("ElbowBaseFrame is not a subframe: {elbow_base:?}");
    };

    let knuckle = world.add_body(Body::new(link_mass(0.05, 0.01)).unwrap());
    let chain = world
        .replace_joint_chain(
            arm.elbow,
            vec![
                Link::new(elbow_base, RevoluteJoint::rz(0.0, 0.0), knuckle),
                Link::new(knuckle, RevoluteJoint::rx(0.0, 0.0), forearm),
            ],
        )
        .unwrap();

    assert_eq!(chain.len(), 2);
    assert_eq!(world.ndof(), 4);
    assert_eq!(world.joints(), vec![arm.shoulder, chain[0], chain[1], arm.wrist]);
    assert!(world.find("Elbow").is_empty());
    assert!(matches!(
        world.joint(arm.elbow),
        Err(ArborError::UnknownEntity { .. })
    ));
}

#[test]
fn chain_must_end_on_old_child() {
    let (mut world, arm) = arm();
    let knuckle = world.add_body(Body::new(link_mass(0.05, 0.01)).unwrap());
    let err = world
        .replace_joint_chain(
            arm.elbow,
            vec![Link::new(arm.bodies[0], RevoluteJoint::rz(0.0, 0.0), knuckle)],
        )
        .unwrap_err();
    assert!(matches!(err, ArborError::InvalidLink { .. }));
    // untouched
    world.init().unwrap();
    assert_eq!(world.joints(), vec![arm.shoulder, arm.elbow, arm.wrist]);
}

#[test]
fn duplicate_arm_names_are_reported() {
    let (mut world, _) = arm();
    add_simple_arm(&mut world, "", &ArmParams::default()).unwrap();
    let err = world.name_all_elements(true).unwrap_err();
    let ArborError::DuplicateNames { names } = err else {
        panic!("unexpected error {err:?}");
    };
    assert!(names.contains(&"Arm".to_string()));
    assert!(names.contains(&"EndEffector".to_string()));
    assert!(names.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn prefixed_arms_have_unique_names() {
    let (mut world, _) = arm();
    let left = add_simple_arm(&mut world, "Left", &ArmParams::default()).unwrap();
    world.name_all_elements(true).unwrap();
    assert_eq!(
        world.first_named("LeftElbow").unwrap(),
        Entity::Joint(left.elbow)
    );
    assert_eq!(world.name(Entity::Body(BodyId::GROUND)), Some("ground"));
}
