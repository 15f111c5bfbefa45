//! Body/joint tree, frame queries and the kinematic passes.
//!
//! [`Multibody`] is the part of a [`World`](crate::World) that constraints
//! and controllers read while the world holds them mutably.

use std::ops::Range;

use arbor_collision::Shape;
use arbor_spatial::transform::{Transform, adjoint, iadjoint, inv};
use arbor_spatial::twist::Twist;
use arbor_types::{ArborError, BodyId, Entity, FrameId, JointId, Result, ShapeId, SubFrameId};
use hashbrown::HashMap;
use nalgebra::{DMatrix, DVector, DVectorView, Matrix6xX, Vector3};

use crate::body::Body;
use crate::frame::{Frame, SubFrame};
use crate::joint::Joint;

/// A joint with its attachment frames and its slice of the generalized
/// velocity vector.
#[derive(Debug)]
pub(crate) struct JointSlot {
    pub(crate) joint: Box<dyn Joint>,
    pub(crate) frames: [FrameId; 2],
    pub(crate) dofs: Option<Range<usize>>,
}

/// System-wide matrices and vectors, overwritten by each pass.
///
/// All matrices are ndof×ndof and all vectors have length ndof once
/// [`World::init`](crate::World::init) has run.
#[derive(Debug, Clone, PartialEq)]
pub struct StepState {
    /// Generalized mass matrix `M`.
    pub mass: DMatrix<f64>,
    /// Generalized viscosity matrix `B`.
    pub viscosity: DMatrix<f64>,
    /// Nonlinear effects matrix `N`.
    pub nleffects: DMatrix<f64>,
    /// Impedance `Z = M/dt + B + N − Σ Z_controller`.
    pub impedance: DMatrix<f64>,
    /// Admittance `Y = Z⁻¹`.
    pub admittance: DMatrix<f64>,
    /// Generalized force applied during the current step.
    pub gforce: DVector<f64>,
    /// Generalized velocity.
    pub gvel: DVector<f64>,
}

impl StepState {
    /// All-zero state of dimension `ndof`.
    #[must_use]
    pub fn zeros(ndof: usize) -> Self {
        Self {
            mass: DMatrix::zeros(ndof, ndof),
            viscosity: DMatrix::zeros(ndof, ndof),
            nleffects: DMatrix::zeros(ndof, ndof),
            impedance: DMatrix::zeros(ndof, ndof),
            admittance: DMatrix::zeros(ndof, ndof),
            gforce: DVector::zeros(ndof),
            gvel: DVector::zeros(ndof),
        }
    }
}

/// Bodies, joints, subframes and shapes of a world, with its step state.
#[derive(Debug)]
pub struct Multibody {
    pub(crate) bodies: Vec<Body>,
    pub(crate) joints: Vec<Option<JointSlot>>,
    pub(crate) subframes: Vec<SubFrame>,
    pub(crate) shapes: Vec<Shape>,
    pub(crate) names: HashMap<Entity, String>,
    pub(crate) up: Vector3<f64>,
    pub(crate) current_time: f64,
    pub(crate) ndof: usize,
    pub(crate) state: StepState,
}

impl Multibody {
    pub(crate) fn new(up: Vector3<f64>) -> Self {
        let mut ground = Body::massless();
        ground.set_id(BodyId::GROUND);
        let mut names = HashMap::new();
        names.insert(Entity::Body(BodyId::GROUND), "ground".to_string());
        Self {
            bodies: vec![ground],
            joints: Vec::new(),
            subframes: Vec::new(),
            shapes: Vec::new(),
            names,
            up,
            current_time: 0.0,
            ndof: 0,
            state: StepState::zeros(0),
        }
    }

    // ========================================================================
    // System state
    // ========================================================================

    /// Number of degrees of freedom, as of the last `init`.
    #[must_use]
    pub fn ndof(&self) -> usize {
        self.ndof
    }

    /// Unit vector pointing up, in ground coordinates.
    #[must_use]
    pub fn up(&self) -> &Vector3<f64> {
        &self.up
    }

    /// Simulation time.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// System matrices and vectors.
    #[must_use]
    pub fn state(&self) -> &StepState {
        &self.state
    }

    /// Generalized velocity.
    #[must_use]
    pub fn gvel(&self) -> &DVector<f64> {
        &self.state.gvel
    }

    /// Generalized mass matrix.
    #[must_use]
    pub fn mass(&self) -> &DMatrix<f64> {
        &self.state.mass
    }

    // ========================================================================
    // Arena access
    // ========================================================================

    /// Body by handle.
    pub fn body(&self, id: BodyId) -> Result<&Body> {
        self.bodies.get(id.0).ok_or(ArborError::UnknownEntity {
            entity: Entity::Body(id),
        })
    }

    pub(crate) fn body_mut(&mut self, id: BodyId) -> Result<&mut Body> {
        self.bodies.get_mut(id.0).ok_or(ArborError::UnknownEntity {
            entity: Entity::Body(id),
        })
    }

    pub(crate) fn joint_slot(&self, id: JointId) -> Result<&JointSlot> {
        self.joints
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(ArborError::UnknownEntity {
                entity: Entity::Joint(id),
            })
    }

    pub(crate) fn joint_slot_mut(&mut self, id: JointId) -> Result<&mut JointSlot> {
        self.joints
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(ArborError::UnknownEntity {
                entity: Entity::Joint(id),
            })
    }

    /// Joint by handle.
    pub fn joint(&self, id: JointId) -> Result<&dyn Joint> {
        Ok(self.joint_slot(id)?.joint.as_ref())
    }

    /// Frames `[frame0, frame1]` a joint connects.
    pub fn joint_frames(&self, id: JointId) -> Result<[FrameId; 2]> {
        Ok(self.joint_slot(id)?.frames)
    }

    /// Slice of the generalized velocity owned by a joint.
    pub fn joint_dofs(&self, id: JointId) -> Result<Range<usize>> {
        self.joint_slot(id)?
            .dofs
            .clone()
            .ok_or_else(|| ArborError::not_initialized(format!("dofs of {id}")))
    }

    /// Current generalized velocity of a joint.
    pub fn joint_gvel(&self, id: JointId) -> Result<DVectorView<'_, f64>> {
        let dofs = self.joint_dofs(id)?;
        Ok(self.state.gvel.rows(dofs.start, dofs.len()))
    }

    /// Subframe by handle.
    pub fn subframe(&self, id: SubFrameId) -> Result<&SubFrame> {
        self.subframes.get(id.0).ok_or(ArborError::UnknownEntity {
            entity: Entity::SubFrame(id),
        })
    }

    /// Shape by handle.
    pub fn shape(&self, id: ShapeId) -> Result<&Shape> {
        self.shapes.get(id.0).ok_or(ArborError::UnknownEntity {
            entity: Entity::Shape(id),
        })
    }

    /// Handles of all subframes, in creation order.
    pub fn subframe_ids(&self) -> impl Iterator<Item = SubFrameId> + '_ {
        (0..self.subframes.len()).map(SubFrameId)
    }

    /// Handles of all shapes, in creation order.
    pub fn shape_ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        (0..self.shapes.len()).map(ShapeId)
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Bodies of the tree, depth-first from the ground (included).
    #[must_use]
    pub fn bodies(&self) -> Vec<BodyId> {
        let mut out = vec![BodyId::GROUND];
        self.collect_descendants(BodyId::GROUND, &mut out);
        out
    }

    /// Bodies below `id`, depth-first, `id` excluded.
    pub fn descendant_bodies(&self, id: BodyId) -> Result<Vec<BodyId>> {
        self.body(id)?;
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        Ok(out)
    }

    fn collect_descendants(&self, id: BodyId, out: &mut Vec<BodyId>) {
        let Some(body) = self.bodies.get(id.0) else {
            return;
        };
        for joint in &body.children {
            if let Some(child) = self.child_body(*joint) {
                out.push(child);
                self.collect_descendants(child, out);
            }
        }
    }

    fn child_body(&self, joint: JointId) -> Option<BodyId> {
        let slot = self.joints.get(joint.0)?.as_ref()?;
        self.frame_body(slot.frames[1]).ok()
    }

    /// Joints of the tree, depth-first from the ground. This is the order in
    /// which degrees of freedom are assigned.
    #[must_use]
    pub fn joints(&self) -> Vec<JointId> {
        let mut out = Vec::new();
        self.collect_joints(BodyId::GROUND, &mut out);
        out
    }

    fn collect_joints(&self, id: BodyId, out: &mut Vec<JointId>) {
        let Some(body) = self.bodies.get(id.0) else {
            return;
        };
        for joint in &body.children {
            out.push(*joint);
            if let Some(child) = self.child_body(*joint) {
                self.collect_joints(child, out);
            }
        }
    }

    /// Joints from `id` up to the ground, nearest first.
    pub fn ancestor_joints(&self, id: BodyId) -> Result<Vec<JointId>> {
        let mut out = Vec::new();
        let mut current = self.body(id)?;
        while let Some(joint) = current.parent {
            out.push(joint);
            let parent = self.frame_body(self.joint_slot(joint)?.frames[0])?;
            current = self.body(parent)?;
        }
        Ok(out)
    }

    /// Whether `id` is connected to the ground through parent joints.
    pub fn is_attached(&self, id: BodyId) -> Result<bool> {
        let mut current = id;
        loop {
            if current.is_ground() {
                return Ok(true);
            }
            match self.body(current)?.parent {
                Some(joint) => current = self.frame_body(self.joint_slot(joint)?.frames[0])?,
                None => return Ok(false),
            }
        }
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Resolve a frame handle.
    pub fn frame(&self, id: FrameId) -> Result<&dyn Frame> {
        match id {
            FrameId::Body(body) => Ok(self.body(body)?),
            FrameId::SubFrame(sub) => Ok(self.subframe(sub)?),
        }
    }

    /// Body a frame is attached to.
    pub fn frame_body(&self, id: FrameId) -> Result<BodyId> {
        Ok(self.frame(id)?.body())
    }

    /// Pose of a frame relative to its body.
    pub fn frame_bpose(&self, id: FrameId) -> Result<Transform> {
        Ok(self.frame(id)?.bpose())
    }

    /// Pose of a frame relative to the ground.
    pub fn frame_pose(&self, id: FrameId) -> Result<Transform> {
        let frame = self.frame(id)?;
        Ok(self.body(frame.body())?.pose()? * frame.bpose())
    }

    /// Twist of a frame relative to the ground, expressed in the frame.
    pub fn frame_twist(&self, id: FrameId) -> Result<Twist> {
        let frame = self.frame(id)?;
        Ok(iadjoint(&frame.bpose()) * self.body(frame.body())?.twist()?)
    }

    /// Jacobian of a frame (6×ndof).
    pub fn frame_jacobian(&self, id: FrameId) -> Result<Matrix6xX<f64>> {
        let frame = self.frame(id)?;
        Ok(iadjoint(&frame.bpose()) * self.body(frame.body())?.jacobian()?)
    }

    /// Time derivative of the jacobian of a frame.
    pub fn frame_djacobian(&self, id: FrameId) -> Result<Matrix6xX<f64>> {
        let frame = self.frame(id)?;
        Ok(iadjoint(&frame.bpose()) * self.body(frame.body())?.djacobian()?)
    }

    /// Pose of a shape, i.e. of its frame.
    pub fn shape_pose(&self, id: ShapeId) -> Result<Transform> {
        self.frame_pose(self.shape(id)?.frame)
    }

    // ========================================================================
    // Passes
    // ========================================================================

    /// Assign dof slices depth-first, reset the step state and load joint
    /// velocities. Returns the number of degrees of freedom.
    pub(crate) fn assign_dofs(&mut self) -> Result<usize> {
        for slot in self.joints.iter_mut().flatten() {
            slot.dofs = None;
        }

        let mut next = 0;
        let mut velocities = Vec::new();
        for id in self.joints() {
            let slot = self.joint_slot_mut(id)?;
            let ndof = slot.joint.ndof();
            let gvel = slot.joint.gvel();
            if gvel.len() != ndof {
                return Err(ArborError::dimension_mismatch(
                    format!("gvel of {id}"),
                    ndof,
                    gvel.len(),
                ));
            }
            slot.dofs = Some(next..next + ndof);
            velocities.push((next, gvel));
            next += ndof;
        }

        self.ndof = next;
        self.state = StepState::zeros(next);
        for (start, gvel) in velocities {
            self.state.gvel.rows_mut(start, gvel.len()).copy_from(&gvel);
        }
        for body in &mut self.bodies {
            body.clear_state();
        }
        Ok(next)
    }

    pub(crate) fn update_geometric(&mut self) -> Result<()> {
        self.propagate_pose(BodyId::GROUND, Transform::identity())
    }

    fn propagate_pose(&mut self, id: BodyId, pose: Transform) -> Result<()> {
        let children = {
            let body = self.body_mut(id)?;
            body.set_pose(pose);
            body.children.clone()
        };
        for joint in children {
            let slot = self.joint_slot(joint)?;
            let [frame0, frame1] = slot.frames;
            let h_pc = self.frame_bpose(frame0)? * slot.joint.pose() * inv(&self.frame_bpose(frame1)?);
            let child = self.frame_body(frame1)?;
            self.propagate_pose(child, pose * h_pc)?;
        }
        Ok(())
    }

    pub(crate) fn update_dynamic(&mut self) -> Result<()> {
        let ndof = self.ndof;
        if self.state.gvel.len() != ndof {
            return Err(ArborError::not_initialized("generalized velocity"));
        }

        self.propagate_dynamic(
            BodyId::GROUND,
            Transform::identity(),
            Matrix6xX::zeros(ndof),
            Matrix6xX::zeros(ndof),
            Twist::zeros(),
        )?;

        let mut mass = DMatrix::zeros(ndof, ndof);
        let mut viscosity = DMatrix::zeros(ndof, ndof);
        let mut nleffects = DMatrix::zeros(ndof, ndof);
        for id in self.descendant_bodies(BodyId::GROUND)? {
            let body = self.body(id)?;
            let dynamics = body.dynamics()?;
            let jt = dynamics.jacobian.transpose();
            mass += &jt * body.mass() * &dynamics.jacobian;
            viscosity += &jt * body.viscosity() * &dynamics.jacobian;
            nleffects += &jt
                * (body.mass() * &dynamics.djacobian + dynamics.nleffects * &dynamics.jacobian);
        }
        self.state.mass = mass;
        self.state.viscosity = viscosity;
        self.state.nleffects = nleffects;
        Ok(())
    }

    fn propagate_dynamic(
        &mut self,
        id: BodyId,
        pose: Transform,
        jacobian: Matrix6xX<f64>,
        djacobian: Matrix6xX<f64>,
        twist: Twist,
    ) -> Result<()> {
        let children = self.body(id)?.children.clone();
        let mut next = Vec::with_capacity(children.len());
        for joint in children {
            let slot = self.joint_slot(joint)?;
            let dofs = slot
                .dofs
                .clone()
                .ok_or_else(|| ArborError::not_initialized(format!("dofs of {joint}")))?;
            let gvel = self.state.gvel.rows(dofs.start, dofs.len());
            let [frame0, frame1] = slot.frames;
            let h_pr = self.frame_bpose(frame0)?;
            let h_cn = self.frame_bpose(frame1)?;
            let h_pc = h_pr * slot.joint.pose() * inv(&h_cn);

            let ad_cp = iadjoint(&h_pc);
            let ad_cn = adjoint(&h_cn);
            let ad_rp = adjoint(&inv(&h_pr));
            let dad_cp = ad_cn * slot.joint.idadjoint(gvel) * ad_rp;

            let child_twist = ad_cp * twist + ad_cn * slot.joint.twist(gvel);
            let mut child_jac = ad_cp * &jacobian;
            let mut child_djac = dad_cp * &jacobian + ad_cp * &djacobian;
            {
                let mut cols = child_jac.columns_mut(dofs.start, dofs.len());
                cols += ad_cn * slot.joint.jacobian();
            }
            {
                let mut cols = child_djac.columns_mut(dofs.start, dofs.len());
                cols += ad_cn * slot.joint.djacobian(gvel);
            }
            next.push((
                self.frame_body(frame1)?,
                pose * h_pc,
                child_jac,
                child_djac,
                child_twist,
            ));
        }

        self.body_mut(id)?.set_dynamics(pose, jacobian, djacobian, twist);
        for (child, child_pose, child_jac, child_djac, child_twist) in next {
            self.propagate_dynamic(child, child_pose, child_jac, child_djac, child_twist)?;
        }
        Ok(())
    }

    pub(crate) fn integrate_joints(&mut self, dt: f64) -> Result<()> {
        for (index, slot) in self.joints.iter_mut().enumerate() {
            let Some(slot) = slot else {
                continue;
            };
            let dofs = slot
                .dofs
                .clone()
                .ok_or_else(|| ArborError::not_initialized(format!("dofs of {}", JointId(index))))?;
            slot.joint
                .integrate(self.state.gvel.rows(dofs.start, dofs.len()), dt);
        }
        Ok(())
    }
}
