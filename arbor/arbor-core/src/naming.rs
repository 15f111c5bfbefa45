//! Entity names.
//!
//! Names are optional labels stored by the world. They are not required to
//! be unique unless [`World::name_all_elements`] is asked to check.

use arbor_types::{
    ArborError, BodyId, ConstraintId, ControllerId, Entity, JointId, Result, ShapeId, SubFrameId,
};
use hashbrown::HashMap;

use crate::world::World;

/// Names must be unique within a group, not across groups.
fn unicity_group(entity: Entity) -> &'static str {
    match entity {
        Entity::Body(_) | Entity::SubFrame(_) => "frame",
        Entity::Joint(_) => "joint",
        Entity::Shape(_) => "shape",
        Entity::Constraint(_) => "constraint",
        Entity::Controller(_) => "controller",
    }
}

impl World {
    /// Label an entity, replacing any previous name.
    pub fn set_name(&mut self, entity: Entity, name: impl Into<String>) -> Result<()> {
        self.ensure_exists(entity)?;
        self.mb.names.insert(entity, name.into());
        Ok(())
    }

    /// Name of an entity, if it has one.
    #[must_use]
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.mb.names.get(&entity).map(String::as_str)
    }

    /// Every entity carrying `name`, in [`World::entities`] order.
    #[must_use]
    pub fn find(&self, name: &str) -> Vec<Entity> {
        self.entities()
            .into_iter()
            .filter(|entity| self.name(*entity) == Some(name))
            .collect()
    }

    /// First entity carrying `name`.
    pub fn first_named(&self, name: &str) -> Result<Entity> {
        self.find(name)
            .into_iter()
            .next()
            .ok_or_else(|| ArborError::NameNotFound { name: name.into() })
    }

    /// All entities: bodies, joints, subframes, shapes, constraints and
    /// controllers, each kind in handle order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        let mb = &self.mb;
        let bodies = (0..mb.bodies.len()).map(|i| Entity::Body(BodyId(i)));
        let joints = mb
            .joints
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| Entity::Joint(JointId(i)));
        let subframes = (0..mb.subframes.len()).map(|i| Entity::SubFrame(SubFrameId(i)));
        let shapes = (0..mb.shapes.len()).map(|i| Entity::Shape(ShapeId(i)));
        let constraints = (0..self.constraints.len()).map(|i| Entity::Constraint(ConstraintId(i)));
        let controllers = (0..self.controllers.len()).map(|i| Entity::Controller(ControllerId(i)));
        bodies
            .chain(joints)
            .chain(subframes)
            .chain(shapes)
            .chain(constraints)
            .chain(controllers)
            .collect()
    }

    /// Give every unnamed entity a default name (`body3`, `joint0`, ...).
    ///
    /// With `check_unicity`, fails with [`ArborError::DuplicateNames`]
    /// listing every name used more than once within a group: joints,
    /// frames (bodies and subframes), shapes, constraints or controllers.
    /// Default names are assigned either way.
    pub fn name_all_elements(&mut self, check_unicity: bool) -> Result<()> {
        for entity in self.entities() {
            self.mb
                .names
                .entry(entity)
                .or_insert_with(|| format!("{}{}", entity.kind(), entity.index()));
        }
        if !check_unicity {
            return Ok(());
        }

        let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
        for (entity, name) in &self.mb.names {
            *counts.entry((unicity_group(*entity), name.as_str())).or_default() += 1;
        }
        let mut names: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((_, name), _)| name.to_string())
            .collect();
        if names.is_empty() {
            return Ok(());
        }
        names.sort();
        names.dedup();
        Err(ArborError::DuplicateNames { names })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::frame::SubFrame;
    use crate::testing::TestHinge;
    use arbor_spatial::mass::point_mass;
    use arbor_spatial::transform::transl;

    fn two_links() -> (World, BodyId, BodyId, JointId) {
        let mut world = World::default();
        let a = world.add_body(Body::new(point_mass(1.0)).unwrap());
        let b = world.add_body(Body::new(point_mass(1.0)).unwrap());
        let j = world
            .add_link(world.ground(), TestHinge::new(0.0, 0.0), a)
            .unwrap();
        world.add_link(a, TestHinge::new(0.0, 0.0), b).unwrap();
        (world, a, b, j)
    }

    #[test]
    fn test_set_and_find() {
        let (mut world, a, b, j) = two_links();
        assert_eq!(world.name(Entity::Body(BodyId::GROUND)), Some("ground"));
        world.set_name(Entity::Body(a), "link").unwrap();
        world.set_name(Entity::Joint(j), "link").unwrap();

        assert_eq!(world.find("link"), vec![Entity::Body(a), Entity::Joint(j)]);
        assert_eq!(world.first_named("link").unwrap(), Entity::Body(a));
        assert_eq!(
            world.first_named("nope"),
            Err(ArborError::NameNotFound {
                name: "nope".into()
            })
        );
        assert!(world.name(Entity::Body(b)).is_none());
        assert!(matches!(
            world.set_name(Entity::Body(BodyId(9)), "x"),
            Err(ArborError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_name_all_elements_defaults() {
        let (mut world, a, _, j) = two_links();
        world.name_all_elements(true).unwrap();
        assert_eq!(world.name(Entity::Body(a)), Some("body1"));
        assert_eq!(world.name(Entity::Joint(j)), Some("joint0"));
        assert_eq!(world.name(Entity::Joint(JointId(1))), Some("joint1"));
    }

    #[test]
    fn test_name_all_elements_reports_duplicates() {
        let (mut world, a, b, j) = two_links();
        world.set_name(Entity::Body(a), "arm").unwrap();
        world.set_name(Entity::Body(b), "arm").unwrap();
        world.set_name(Entity::Joint(j), "body2").unwrap();

        let err = world.name_all_elements(true).unwrap_err();
        assert_eq!(
            err,
            ArborError::DuplicateNames {
                names: vec!["arm".into()]
            }
        );
        assert!(world.name_all_elements(false).is_ok());
    }

    #[test]
    fn test_name_all_elements_groups() {
        let (mut world, a, _, j) = two_links();
        world.set_name(Entity::Body(a), "arm").unwrap();
        world.set_name(Entity::Joint(j), "arm").unwrap();
        world.name_all_elements(true).unwrap();

        // bodies and subframes share the frame group
        let tip = world
            .add_subframe(SubFrame::new(a, transl(1.0, 0.0, 0.0)).unwrap())
            .unwrap();
        world.set_name(Entity::SubFrame(tip), "arm").unwrap();
        assert_eq!(
            world.name_all_elements(true),
            Err(ArborError::DuplicateNames {
                names: vec!["arm".into()]
            })
        );
    }
}
