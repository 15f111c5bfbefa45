//! Rigid bodies.

use arbor_spatial::mass::{MassMatrix, ensure_mass_matrix};
use arbor_spatial::transform::Transform;
use arbor_spatial::twist::{Twist, angular, skew};
use arbor_types::{ArborError, BodyId, JointId, Result};
use nalgebra::{Matrix3, Matrix6, Matrix6xX};

use crate::frame::Frame;

/// Below this total mass the center-of-mass offset is taken as zero when
/// computing nonlinear effects.
const MASSLESS_THRESHOLD: f64 = 1e-10;

/// Velocity-level state of a body, recomputed by every dynamic pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDynamics {
    /// Body jacobian, 6×ndof: maps the generalized velocity to the body twist.
    pub jacobian: Matrix6xX<f64>,
    /// Time derivative of the jacobian.
    pub djacobian: Matrix6xX<f64>,
    /// Twist of the body relative to the ground, expressed in the body frame.
    pub twist: Twist,
    /// Gyroscopic/Coriolis matrix `N` such that the body wrench contains `N T`.
    pub nleffects: Matrix6<f64>,
}

/// A rigid body of the tree.
///
/// The mass and viscosity are constant. The parent/child links are handles
/// into the world's joint arena. Transient state is cleared by
/// [`World::init`](crate::World::init) and filled by the geometric and
/// dynamic passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    id: BodyId,
    mass: MassMatrix,
    viscosity: Matrix6<f64>,
    pub(crate) parent: Option<JointId>,
    pub(crate) children: Vec<JointId>,
    pose: Option<Transform>,
    dynamics: Option<BodyDynamics>,
}

impl Body {
    /// Body with the given mass matrix and no viscosity.
    ///
    /// Fails unless `mass` is symmetric positive semi-definite.
    pub fn new(mass: MassMatrix) -> Result<Self> {
        Self::with_viscosity(mass, Matrix6::zeros())
    }

    /// Body with the given mass and viscosity matrices.
    pub fn with_viscosity(mass: MassMatrix, viscosity: Matrix6<f64>) -> Result<Self> {
        ensure_mass_matrix(&mass)?;
        Ok(Self {
            id: BodyId::GROUND,
            mass,
            viscosity,
            parent: None,
            children: Vec::new(),
            pose: None,
            dynamics: None,
        })
    }

    /// Body without mass, like the ground.
    #[must_use]
    pub fn massless() -> Self {
        Self {
            id: BodyId::GROUND,
            mass: Matrix6::zeros(),
            viscosity: Matrix6::zeros(),
            parent: None,
            children: Vec::new(),
            pose: None,
            dynamics: None,
        }
    }

    pub(crate) fn set_id(&mut self, id: BodyId) {
        self.id = id;
    }

    /// Handle of this body in its world.
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Mass matrix, in the body frame.
    #[must_use]
    pub fn mass(&self) -> &MassMatrix {
        &self.mass
    }

    /// Viscosity matrix, in the body frame.
    #[must_use]
    pub fn viscosity(&self) -> &Matrix6<f64> {
        &self.viscosity
    }

    /// Joint connecting this body to its parent.
    #[must_use]
    pub fn parent_joint(&self) -> Option<JointId> {
        self.parent
    }

    /// Joints connecting this body to its children, in insertion order.
    #[must_use]
    pub fn child_joints(&self) -> &[JointId] {
        &self.children
    }

    /// Pose relative to the ground.
    pub fn pose(&self) -> Result<Transform> {
        self.pose
            .ok_or_else(|| ArborError::not_updated(format!("pose of {}", self.id)))
    }

    /// Velocity-level state.
    pub fn dynamics(&self) -> Result<&BodyDynamics> {
        self.dynamics
            .as_ref()
            .ok_or_else(|| ArborError::not_updated(format!("dynamics of {}", self.id)))
    }

    /// Twist relative to the ground, in the body frame.
    pub fn twist(&self) -> Result<Twist> {
        Ok(self.dynamics()?.twist)
    }

    /// Body jacobian.
    pub fn jacobian(&self) -> Result<&Matrix6xX<f64>> {
        Ok(&self.dynamics()?.jacobian)
    }

    /// Time derivative of the body jacobian.
    pub fn djacobian(&self) -> Result<&Matrix6xX<f64>> {
        Ok(&self.dynamics()?.djacobian)
    }

    /// Nonlinear effects matrix.
    pub fn nleffects(&self) -> Result<&Matrix6<f64>> {
        Ok(&self.dynamics()?.nleffects)
    }

    pub(crate) fn clear_state(&mut self) {
        self.pose = None;
        self.dynamics = None;
    }

    pub(crate) fn set_pose(&mut self, pose: Transform) {
        self.pose = Some(pose);
        self.dynamics = None;
    }

    pub(crate) fn set_dynamics(
        &mut self,
        pose: Transform,
        jacobian: Matrix6xX<f64>,
        djacobian: Matrix6xX<f64>,
        twist: Twist,
    ) {
        let nleffects = nonlinear_effects(&self.mass, &twist);
        self.pose = Some(pose);
        self.dynamics = Some(BodyDynamics {
            jacobian,
            djacobian,
            twist,
            nleffects,
        });
    }
}

impl Frame for Body {
    fn body(&self) -> BodyId {
        self.id
    }

    fn bpose(&self) -> Transform {
        Transform::identity()
    }
}

/// `N = [[ω̂, r̂ω̂ − ω̂r̂], [0, ω̂]] · M`, with `r̂` the cross-product matrix of
/// the center-of-mass offset read from the mass matrix.
fn nonlinear_effects(mass: &MassMatrix, twist: &Twist) -> Matrix6<f64> {
    let wx = skew(&angular(twist));
    let total = mass[(5, 5)];
    let rx = if total > MASSLESS_THRESHOLD {
        mass.fixed_view::<3, 3>(0, 3) / total
    } else {
        Matrix3::zeros()
    };
    let mut n = Matrix6::zeros();
    n.fixed_view_mut::<3, 3>(0, 0).copy_from(&wx);
    n.fixed_view_mut::<3, 3>(3, 3).copy_from(&wx);
    n.fixed_view_mut::<3, 3>(0, 3)
        .copy_from(&(rx * wx - wx * rx));
    n * mass
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_spatial::mass::{box_mass, point_mass, transport};
    use arbor_spatial::transform::transl;
    use nalgebra::Vector3;

    #[test]
    fn test_rejects_invalid_mass() {
        let mut mass = box_mass(&Vector3::new(0.1, 0.2, 0.3), 1.0);
        mass[(0, 5)] = 4.0;
        assert!(matches!(
            Body::new(mass),
            Err(ArborError::InvalidMassMatrix { .. })
        ));
    }

    #[test]
    fn test_state_before_update() {
        let body = Body::new(point_mass(1.0)).unwrap();
        assert!(matches!(body.pose(), Err(ArborError::NotUpdated { .. })));
        assert!(body.jacobian().unwrap_err().is_stale_state());
        assert_eq!(body.bpose(), Transform::identity());
    }

    #[test]
    fn test_nleffects_at_rest() {
        let mass = transport(&point_mass(2.0), &transl(0.0, -1.0, 0.0));
        let n = nonlinear_effects(&mass, &Twist::zeros());
        assert_eq!(n, Matrix6::zeros());
    }

    #[test]
    fn test_nleffects_centered_spin() {
        // body spinning about its center of mass: N T is the gyroscopic torque ω × Iω
        let mass = box_mass(&Vector3::new(0.1, 0.2, 0.3), 3.0);
        let twist = Twist::new(0.3, -0.5, 1.2, 0.0, 0.0, 0.0);
        let n = nonlinear_effects(&mass, &twist);
        let wrench = n * twist;
        let w = angular(&twist);
        let inertia = mass.fixed_view::<3, 3>(0, 0).into_owned();
        let expected = w.cross(&(inertia * w));
        assert_relative_eq!(
            wrench.fixed_rows::<3>(0).into_owned(),
            expected,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            wrench.fixed_rows::<3>(3).into_owned(),
            Vector3::zeros(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_nleffects_massless() {
        let n = nonlinear_effects(&Matrix6::zeros(), &Twist::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        assert_eq!(n, Matrix6::zeros());
    }
}
