//! The world: registration, assembly and the step pipeline.

use std::ops::Range;

use arbor_collision::Shape;
use arbor_spatial::transform::Transform;
use arbor_types::{
    ArborError, BodyId, ConstraintId, ControllerId, Entity, FrameId, JointId, Result, ShapeId,
    SubFrameId, WorldConfig,
};
use nalgebra::{DMatrix, DVector, DVectorView, Matrix6xX, Vector3};
use tracing::{debug, trace};

use crate::body::Body;
use crate::constraint::Constraint;
use crate::controller::Controller;
use crate::frame::{Frame, SubFrame};
use crate::joint::Joint;
use crate::multibody::{JointSlot, Multibody, StepState};

/// One edge of a sub-chain passed to [`World::replace_joint_chain`].
#[derive(Debug)]
pub struct Link {
    /// Parent-side frame.
    pub frame0: FrameId,
    /// The joint.
    pub joint: Box<dyn Joint>,
    /// Child-side frame.
    pub frame1: FrameId,
}

impl Link {
    /// Create a link.
    pub fn new(
        frame0: impl Into<FrameId>,
        joint: impl Joint + 'static,
        frame1: impl Into<FrameId>,
    ) -> Self {
        Self {
            frame0: frame0.into(),
            joint: Box::new(joint),
            frame1: frame1.into(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ConstraintSlot {
    pub(crate) constraint: Box<dyn Constraint>,
    pub(crate) enabled: bool,
}

/// A tree of rigid bodies with its constraints and controllers.
///
/// Typical use:
///
/// 1. add bodies, then link them top-down with [`World::add_link`]
/// 2. add subframes, shapes, constraints and controllers
/// 3. [`World::init`]
/// 4. step with [`simulate`](crate::simulate), or by hand:
///    `update_dynamic`, `update_controllers`, `update_constraints`,
///    `integrate`
#[derive(Debug)]
pub struct World {
    pub(crate) mb: Multibody,
    pub(crate) constraints: Vec<ConstraintSlot>,
    pub(crate) controllers: Vec<Box<dyn Controller>>,
    config: WorldConfig,
}

impl Default for World {
    fn default() -> Self {
        let config = WorldConfig::default();
        Self {
            mb: Multibody::new(config.up),
            constraints: Vec::new(),
            controllers: Vec::new(),
            config,
        }
    }
}

impl World {
    /// Create an empty world holding only the ground.
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mb: Multibody::new(config.up),
            constraints: Vec::new(),
            controllers: Vec::new(),
            config,
        })
    }

    /// World configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Tree, frames and step state.
    #[must_use]
    pub fn multibody(&self) -> &Multibody {
        &self.mb
    }

    /// Handle on the ground body.
    #[must_use]
    pub fn ground(&self) -> BodyId {
        BodyId::GROUND
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Add a free-floating body. It joins the tree through [`World::add_link`].
    pub fn add_body(&mut self, mut body: Body) -> BodyId {
        let id = BodyId(self.mb.bodies.len());
        body.set_id(id);
        self.mb.bodies.push(body);
        id
    }

    /// Attach a new subframe to an existing body.
    pub fn add_subframe(&mut self, subframe: SubFrame) -> Result<SubFrameId> {
        self.mb.body(subframe.body())?;
        let id = SubFrameId(self.mb.subframes.len());
        self.mb.subframes.push(subframe);
        Ok(id)
    }

    /// Attach a shape to an existing frame.
    pub fn add_shape(&mut self, shape: Shape) -> Result<ShapeId> {
        self.mb.frame(shape.frame)?;
        let id = ShapeId(self.mb.shapes.len());
        self.mb.shapes.push(shape);
        Ok(id)
    }

    /// Register a constraint, enabled.
    pub fn add_constraint(&mut self, constraint: impl Constraint + 'static) -> ConstraintId {
        let id = ConstraintId(self.constraints.len());
        self.constraints.push(ConstraintSlot {
            constraint: Box::new(constraint),
            enabled: true,
        });
        id
    }

    /// Register a controller.
    pub fn add_controller(&mut self, controller: impl Controller + 'static) -> ControllerId {
        let id = ControllerId(self.controllers.len());
        self.controllers.push(Box::new(controller));
        id
    }

    /// Connect `frame0` (already in the tree) to `frame1`, whose body must not
    /// have a parent yet.
    ///
    /// Kinematic loops cannot be built this way; close them with a
    /// constraint instead.
    pub fn add_link(
        &mut self,
        frame0: impl Into<FrameId>,
        joint: impl Joint + 'static,
        frame1: impl Into<FrameId>,
    ) -> Result<JointId> {
        self.insert_link(frame0.into(), Box::new(joint), frame1.into())
    }

    fn insert_link(
        &mut self,
        frame0: FrameId,
        joint: Box<dyn Joint>,
        frame1: FrameId,
    ) -> Result<JointId> {
        let parent = self.mb.frame_body(frame0)?;
        let child = self.mb.frame_body(frame1)?;
        if child.is_ground() {
            return Err(ArborError::invalid_link("the ground cannot be a child"));
        }
        if child == parent {
            return Err(ArborError::invalid_link(format!(
                "{frame0} and {frame1} are on the same body"
            )));
        }
        if self.mb.body(child)?.parent.is_some() {
            return Err(ArborError::AlreadyHasParent { body: child });
        }
        if !self.mb.is_attached(parent)? {
            return Err(ArborError::DetachedFrame { frame: frame0 });
        }

        let id = JointId(self.mb.joints.len());
        self.mb.joints.push(Some(JointSlot {
            joint,
            frames: [frame0, frame1],
            dofs: None,
        }));
        self.mb.body_mut(child)?.parent = Some(id);
        self.mb.body_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Remove a joint from the tree and return the position it held among
    /// its parent's children.
    fn detach_link(&mut self, id: JointId) -> Result<usize> {
        let [frame0, frame1] = self.mb.joint_frames(id)?;
        let parent = self.mb.frame_body(frame0)?;
        let child = self.mb.frame_body(frame1)?;
        let siblings = &mut self.mb.body_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|j| *j == id)
            .ok_or_else(|| ArborError::invalid_link(format!("{id} is not a child of {parent}")))?;
        siblings.remove(position);
        self.mb.body_mut(child)?.parent = None;
        Ok(position)
    }

    /// Check that an entity exists. Re-registering is a no-op; joints only
    /// enter through [`World::add_link`].
    pub fn register(&mut self, entity: Entity) -> Result<()> {
        match entity {
            Entity::Joint(joint) => Err(ArborError::JointRegistration { joint }),
            other => self.ensure_exists(other),
        }
    }

    pub(crate) fn ensure_exists(&self, entity: Entity) -> Result<()> {
        let exists = match entity {
            Entity::Body(id) => id.0 < self.mb.bodies.len(),
            Entity::Joint(id) => self.mb.joint_slot(id).is_ok(),
            Entity::SubFrame(id) => id.0 < self.mb.subframes.len(),
            Entity::Shape(id) => id.0 < self.mb.shapes.len(),
            Entity::Constraint(id) => id.0 < self.constraints.len(),
            Entity::Controller(id) => id.0 < self.controllers.len(),
        };
        if exists {
            Ok(())
        } else {
            Err(ArborError::UnknownEntity { entity })
        }
    }

    /// Swap the joint of an edge, keeping its frames, then re-run
    /// [`World::init`].
    pub fn replace_joint(&mut self, old: JointId, joint: impl Joint + 'static) -> Result<()> {
        let slot = self.mb.joint_slot_mut(old)?;
        slot.joint = Box::new(joint);
        slot.dofs = None;
        self.init()
    }

    /// Replace an edge by a chain of links. The first link must start on the
    /// old parent body and the last one must end on the old child body.
    /// The chain takes the old joint's place among its parent's children.
    ///
    /// On error the world is left as it was.
    pub fn replace_joint_chain(&mut self, old: JointId, links: Vec<Link>) -> Result<Vec<JointId>> {
        let [frame0, frame1] = self.mb.joint_frames(old)?;
        let (Some(first), Some(last)) = (links.first(), links.last()) else {
            return Err(ArborError::invalid_link("empty replacement chain"));
        };
        if self.mb.frame_body(first.frame0)? != self.mb.frame_body(frame0)? {
            return Err(ArborError::invalid_link(format!(
                "chain must start on the body of {frame0}"
            )));
        }
        if self.mb.frame_body(last.frame1)? != self.mb.frame_body(frame1)? {
            return Err(ArborError::invalid_link(format!(
                "chain must end on the body of {frame1}"
            )));
        }

        let parent = self.mb.frame_body(frame0)?;
        let position = self.detach_link(old)?;
        let slot = self.mb.joints[old.0].take();

        let mut added = Vec::with_capacity(links.len());
        for link in links {
            match self.insert_link(link.frame0, link.joint, link.frame1) {
                Ok(id) => added.push(id),
                Err(err) => {
                    self.rollback_chain(old, slot, position, &added)?;
                    return Err(err);
                }
            }
        }

        // The chain head was appended; move it to the old position.
        if let Some(head) = added.first() {
            let siblings = &mut self.mb.body_mut(parent)?.children;
            siblings.retain(|j| j != head);
            siblings.insert(position, *head);
        }
        self.mb.names.remove(&Entity::Joint(old));
        self.init()?;
        Ok(added)
    }

    fn rollback_chain(
        &mut self,
        old: JointId,
        slot: Option<JointSlot>,
        position: usize,
        added: &[JointId],
    ) -> Result<()> {
        for id in added.iter().rev() {
            self.detach_link(*id)?;
            self.mb.joints[id.0] = None;
        }
        while self.mb.joints.len() > old.0 + 1 && self.mb.joints.last().is_some_and(Option::is_none) {
            self.mb.joints.pop();
        }
        let Some(slot) = slot else {
            return Ok(());
        };
        let parent = self.mb.frame_body(slot.frames[0])?;
        let child = self.mb.frame_body(slot.frames[1])?;
        self.mb.joints[old.0] = Some(slot);
        self.mb.body_mut(child)?.parent = Some(old);
        self.mb.body_mut(parent)?.children.insert(position, old);
        Ok(())
    }

    /// Change the offset of a moving subframe.
    pub fn set_subframe_bpose(&mut self, id: SubFrameId, bpose: Transform) -> Result<()> {
        let subframe = self
            .mb
            .subframes
            .get_mut(id.0)
            .ok_or(ArborError::UnknownEntity {
                entity: Entity::SubFrame(id),
            })?;
        if !subframe.is_moving() {
            return Err(ArborError::ImmutableSubFrame { subframe: id });
        }
        subframe.set_bpose(bpose)
    }

    /// Mutable access to a joint, e.g. to set its position before `init`.
    ///
    /// Velocities set on the joint directly only reach the world at the next
    /// [`World::init`]; use [`World::set_joint_gvel`] afterwards.
    pub fn joint_mut(&mut self, id: JointId) -> Result<&mut dyn Joint> {
        Ok(self.mb.joint_slot_mut(id)?.joint.as_mut())
    }

    /// Write a joint's slice of the generalized velocity.
    pub fn set_joint_gvel(&mut self, id: JointId, gvel: &[f64]) -> Result<()> {
        let dofs = self.mb.joint_dofs(id)?;
        if gvel.len() != dofs.len() {
            return Err(ArborError::dimension_mismatch(
                format!("gvel of {id}"),
                dofs.len(),
                gvel.len(),
            ));
        }
        self.mb.joint_slot_mut(id)?.joint.set_gvel(gvel)?;
        self.mb
            .state
            .gvel
            .rows_mut(dofs.start, dofs.len())
            .copy_from_slice(gvel);
        Ok(())
    }

    /// Set the simulation time.
    pub fn set_current_time(&mut self, time: f64) {
        self.mb.current_time = time;
    }

    // ========================================================================
    // Constraints and controllers
    // ========================================================================

    /// Constraint by handle.
    pub fn constraint(&self, id: ConstraintId) -> Result<&dyn Constraint> {
        self.constraint_slot(id).map(|slot| slot.constraint.as_ref())
    }

    fn constraint_slot(&self, id: ConstraintId) -> Result<&ConstraintSlot> {
        self.constraints.get(id.0).ok_or(ArborError::UnknownEntity {
            entity: Entity::Constraint(id),
        })
    }

    fn constraint_slot_mut(&mut self, id: ConstraintId) -> Result<&mut ConstraintSlot> {
        self.constraints.get_mut(id.0).ok_or(ArborError::UnknownEntity {
            entity: Entity::Constraint(id),
        })
    }

    /// Controller by handle.
    pub fn controller(&self, id: ControllerId) -> Result<&dyn Controller> {
        self.controllers
            .get(id.0)
            .map(AsRef::as_ref)
            .ok_or(ArborError::UnknownEntity {
                entity: Entity::Controller(id),
            })
    }

    /// Handles of all constraints, in registration order.
    pub fn constraint_ids(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        (0..self.constraints.len()).map(ConstraintId)
    }

    /// Handles of all controllers, in registration order.
    pub fn controller_ids(&self) -> impl Iterator<Item = ControllerId> + '_ {
        (0..self.controllers.len()).map(ControllerId)
    }

    /// Let a constraint take part in the solve.
    pub fn enable_constraint(&mut self, id: ConstraintId) -> Result<()> {
        self.constraint_slot_mut(id)?.enabled = true;
        Ok(())
    }

    /// Skip a constraint, including its `update`.
    pub fn disable_constraint(&mut self, id: ConstraintId) -> Result<()> {
        self.constraint_slot_mut(id)?.enabled = false;
        Ok(())
    }

    /// Whether a constraint is enabled.
    pub fn is_constraint_enabled(&self, id: ConstraintId) -> Result<bool> {
        Ok(self.constraint_slot(id)?.enabled)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of degrees of freedom, as of the last `init`.
    #[must_use]
    pub fn ndof(&self) -> usize {
        self.mb.ndof()
    }

    /// Simulation time.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.mb.current_time()
    }

    /// Unit vector pointing up.
    #[must_use]
    pub fn up(&self) -> &Vector3<f64> {
        self.mb.up()
    }

    /// System matrices and vectors.
    #[must_use]
    pub fn state(&self) -> &StepState {
        self.mb.state()
    }

    /// Generalized velocity.
    #[must_use]
    pub fn gvel(&self) -> &DVector<f64> {
        self.mb.gvel()
    }

    /// Generalized force of the current step.
    #[must_use]
    pub fn gforce(&self) -> &DVector<f64> {
        &self.mb.state.gforce
    }

    /// Generalized mass matrix.
    #[must_use]
    pub fn mass(&self) -> &DMatrix<f64> {
        self.mb.mass()
    }

    /// Body by handle.
    pub fn body(&self, id: BodyId) -> Result<&Body> {
        self.mb.body(id)
    }

    /// Joint by handle.
    pub fn joint(&self, id: JointId) -> Result<&dyn Joint> {
        self.mb.joint(id)
    }

    /// Slice of the generalized velocity owned by a joint.
    pub fn joint_dofs(&self, id: JointId) -> Result<Range<usize>> {
        self.mb.joint_dofs(id)
    }

    /// Current generalized velocity of a joint.
    pub fn joint_gvel(&self, id: JointId) -> Result<DVectorView<'_, f64>> {
        self.mb.joint_gvel(id)
    }

    /// Bodies of the tree, depth-first from the ground.
    #[must_use]
    pub fn bodies(&self) -> Vec<BodyId> {
        self.mb.bodies()
    }

    /// Joints of the tree, depth-first.
    #[must_use]
    pub fn joints(&self) -> Vec<JointId> {
        self.mb.joints()
    }

    /// Bodies below `id`, depth-first.
    pub fn descendant_bodies(&self, id: BodyId) -> Result<Vec<BodyId>> {
        self.mb.descendant_bodies(id)
    }

    /// Joints from `id` up to the ground.
    pub fn ancestor_joints(&self, id: BodyId) -> Result<Vec<JointId>> {
        self.mb.ancestor_joints(id)
    }

    /// Subframe by handle.
    pub fn subframe(&self, id: SubFrameId) -> Result<&SubFrame> {
        self.mb.subframe(id)
    }

    /// Shape by handle.
    pub fn shape(&self, id: ShapeId) -> Result<&Shape> {
        self.mb.shape(id)
    }

    /// Pose of a frame relative to the ground.
    pub fn frame_pose(&self, id: impl Into<FrameId>) -> Result<Transform> {
        self.mb.frame_pose(id.into())
    }

    /// Twist of a frame, expressed in the frame.
    pub fn frame_twist(&self, id: impl Into<FrameId>) -> Result<arbor_spatial::Twist> {
        self.mb.frame_twist(id.into())
    }

    /// Jacobian of a frame.
    pub fn frame_jacobian(&self, id: impl Into<FrameId>) -> Result<Matrix6xX<f64>> {
        self.mb.frame_jacobian(id.into())
    }

    /// Time derivative of the jacobian of a frame.
    pub fn frame_djacobian(&self, id: impl Into<FrameId>) -> Result<Matrix6xX<f64>> {
        self.mb.frame_djacobian(id.into())
    }

    /// Pose of a shape.
    pub fn shape_pose(&self, id: ShapeId) -> Result<Transform> {
        self.mb.shape_pose(id)
    }

    // ========================================================================
    // Step pipeline
    // ========================================================================

    /// Assign dofs depth-first, reset the step state, load joint velocities,
    /// clear body state and initialize constraints and controllers.
    pub fn init(&mut self) -> Result<()> {
        let ndof = self.mb.assign_dofs()?;
        for slot in &mut self.constraints {
            slot.constraint.init(&self.mb)?;
        }
        for controller in &mut self.controllers {
            controller.init(&self.mb)?;
        }
        debug!(
            ndof,
            bodies = self.mb.bodies.len(),
            constraints = self.constraints.len(),
            controllers = self.controllers.len(),
            "world initialized"
        );
        Ok(())
    }

    /// Recompute body poses.
    pub fn update_geometric(&mut self) -> Result<()> {
        self.mb.update_geometric()
    }

    /// Recompute body poses, twists and jacobians, then assemble the mass,
    /// viscosity and nonlinear-effects matrices.
    pub fn update_dynamic(&mut self) -> Result<()> {
        self.mb.update_dynamic()
    }

    /// Collect controller forces and form impedance and admittance.
    pub fn update_controllers(&mut self, dt: f64) -> Result<()> {
        check_timestep(dt)?;
        let ndof = self.mb.ndof;
        let state = &self.mb.state;
        let mut impedance = &state.mass / dt + &state.viscosity + &state.nleffects;
        let mut gforce = DVector::zeros(ndof);

        for (index, controller) in self.controllers.iter_mut().enumerate() {
            let output = controller.update(&self.mb, dt)?;
            if output.gforce.len() != ndof {
                return Err(ArborError::dimension_mismatch(
                    format!("gforce of {}", ControllerId(index)),
                    ndof,
                    output.gforce.len(),
                ));
            }
            if output.impedance.shape() != (ndof, ndof) {
                return Err(ArborError::dimension_mismatch(
                    format!("impedance of {}", ControllerId(index)),
                    ndof * ndof,
                    output.impedance.len(),
                ));
            }
            impedance -= &output.impedance;
            gforce += &output.gforce;
        }

        let admittance = impedance
            .clone()
            .try_inverse()
            .ok_or(ArborError::SingularImpedance)?;
        self.mb.state.impedance = impedance;
        self.mb.state.admittance = admittance;
        self.mb.state.gforce = gforce;
        Ok(())
    }

    /// Solve the active constraints by blocked Gauss-Seidel and add their
    /// generalized forces to the step's generalized force.
    ///
    /// Constraints are visited in registration order every round. Stops when
    /// the constraint velocity changes by less than `tolerance` between two
    /// rounds, or after `max_iterations` rounds.
    pub fn update_constraints(
        &mut self,
        dt: f64,
        max_iterations: usize,
        tolerance: f64,
    ) -> Result<()> {
        check_timestep(dt)?;
        let ndof = self.mb.ndof;

        let mut active: Vec<(usize, Range<usize>)> = Vec::new();
        let mut ndol = 0;
        for (index, slot) in self.constraints.iter_mut().enumerate() {
            if !slot.enabled {
                continue;
            }
            slot.constraint.update(&self.mb, dt)?;
            if !slot.constraint.is_active() {
                continue;
            }
            let rows = slot.constraint.ndol();
            let jacobian = slot.constraint.jacobian();
            if jacobian.shape() != (rows, ndof) {
                return Err(ArborError::dimension_mismatch(
                    format!("jacobian of {}", ConstraintId(index)),
                    rows * ndof,
                    jacobian.len(),
                ));
            }
            active.push((index, ndol..ndol + rows));
            ndol += rows;
        }
        if active.is_empty() {
            return Ok(());
        }

        let mut jacobian = DMatrix::zeros(ndol, ndof);
        let mut gforce = self.mb.state.gforce.clone();
        for (index, rows) in &active {
            let constraint = &self.constraints[*index].constraint;
            jacobian
                .rows_mut(rows.start, rows.len())
                .copy_from(constraint.jacobian());
            gforce += constraint.gforce();
        }

        let state = &self.mb.state;
        let mut vel =
            &jacobian * (&state.admittance * (&state.mass * &state.gvel / dt + &gforce));
        let admittance = &jacobian * &state.admittance * jacobian.transpose();

        let mut rounds = 0;
        let mut change = f64::INFINITY;
        while rounds < max_iterations {
            let previous = vel.clone();
            for (index, rows) in &active {
                let dforce = self.constraints[*index].constraint.solve(
                    vel.rows(rows.start, rows.len()),
                    admittance.view((rows.start, rows.start), (rows.len(), rows.len())),
                    dt,
                )?;
                if dforce.len() != rows.len() {
                    return Err(ArborError::dimension_mismatch(
                        format!("force change of {}", ConstraintId(*index)),
                        rows.len(),
                        dforce.len(),
                    ));
                }
                vel += admittance.columns(rows.start, rows.len()) * dforce;
            }
            rounds += 1;
            change = (&vel - &previous).norm();
            if rounds > 1 && change < tolerance {
                break;
            }
        }
        trace!(
            active = active.len(),
            ndol,
            rounds,
            change,
            converged = change < tolerance,
            "constraint solve"
        );

        for (index, _) in &active {
            let constraint_gforce = self.constraints[*index].constraint.gforce();
            self.mb.state.gforce += constraint_gforce;
        }
        Ok(())
    }

    /// Compute the new generalized velocity, integrate every joint and
    /// advance time.
    pub fn integrate(&mut self, dt: f64) -> Result<()> {
        check_timestep(dt)?;
        let state = &mut self.mb.state;
        state.gvel = &state.admittance * (&state.mass * &state.gvel / dt + &state.gforce);
        self.mb.integrate_joints(dt)?;
        self.mb.current_time += dt;
        Ok(())
    }
}

fn check_timestep(dt: f64) -> Result<()> {
    if dt <= 0.0 || !dt.is_finite() {
        return Err(ArborError::InvalidTimestep(dt));
    }
    Ok(())
}
