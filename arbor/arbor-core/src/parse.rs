//! Depth-first walk over the world structure.
//!
//! Exporters and visualizers implement [`ParseTarget`] and receive the tree
//! in a fixed order: the ground frame with its subframes and shapes, then
//! every joint depth-first followed by its child body's frames and shapes,
//! then constraints, then controllers. A subframe's shapes come right after
//! the subframe; a body's own shapes come after all of its subframes.

use arbor_types::{BodyId, Entity, FrameId, JointId, Result};
use hashbrown::HashSet;
use nalgebra::Vector3;

use crate::frame::Frame;
use crate::world::World;

/// Receiver of [`World::parse`] callbacks.
pub trait ParseTarget {
    /// First call, before anything is registered.
    fn init_parse(&mut self, ground: BodyId, up: &Vector3<f64>, current_time: f64);

    /// One tree edge.
    fn add_link(&mut self, frame0: FrameId, joint: JointId, frame1: FrameId);

    /// A frame, shape, constraint or controller.
    fn register(&mut self, entity: Entity);
}

impl World {
    /// Walk the world and report it to `target`. Each frame is registered
    /// exactly once.
    pub fn parse(&self, target: &mut dyn ParseTarget) -> Result<()> {
        let mb = &self.mb;
        target.init_parse(BodyId::GROUND, mb.up(), mb.current_time());

        let mut registered = HashSet::new();
        self.register_frame(FrameId::Body(BodyId::GROUND), target, &mut registered)?;
        for joint in mb.joints() {
            let [frame0, frame1] = mb.joint_frames(joint)?;
            target.add_link(frame0, joint, frame1);
            let child = FrameId::Body(mb.frame_body(frame1)?);
            self.register_frame(child, target, &mut registered)?;
        }

        for id in self.constraint_ids() {
            target.register(Entity::Constraint(id));
        }
        for id in self.controller_ids() {
            target.register(Entity::Controller(id));
        }
        Ok(())
    }

    /// Register `frame`, then (for a body) each of its subframes followed by
    /// that subframe's shapes, then the shapes attached to `frame` itself.
    fn register_frame(
        &self,
        frame: FrameId,
        target: &mut dyn ParseTarget,
        registered: &mut HashSet<FrameId>,
    ) -> Result<()> {
        let mb = &self.mb;
        if !registered.insert(frame) {
            return Ok(());
        }
        target.register(frame.into());
        if let FrameId::Body(body) = frame {
            for id in mb.subframe_ids() {
                if mb.subframe(id)?.body() == body {
                    self.register_frame(FrameId::SubFrame(id), target, registered)?;
                }
            }
        }
        for id in mb.shape_ids() {
            if mb.shape(id)?.frame == frame {
                target.register(Entity::Shape(id));
            }
        }
        Ok(())
    }
}
