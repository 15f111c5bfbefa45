//! Gravity.

use arbor_core::{Controller, ControllerOutput, Multibody};
use arbor_spatial::transform::iadjoint;
use arbor_spatial::twist::from_angular_linear;
use arbor_types::{BodyId, Result};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard gravity, in m/s².
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Applies the weight of every body below the ground.
///
/// Gravity is the acceleration `gravity · up` in ground coordinates, so the
/// default `gravity = −9.81` pulls down. Each body contributes
/// `Jᵀ M Ad_bg g` to the generalized force; the impedance is zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightController {
    gravity: f64,
}

impl Default for WeightController {
    fn default() -> Self {
        Self {
            gravity: -STANDARD_GRAVITY,
        }
    }
}

impl WeightController {
    /// Gravity of signed magnitude `gravity` along the world up axis.
    #[must_use]
    pub fn new(gravity: f64) -> Self {
        Self { gravity }
    }

    /// Signed gravity magnitude along the up axis.
    #[must_use]
    pub fn gravity(&self) -> f64 {
        self.gravity
    }
}

impl Controller for WeightController {
    fn update(&mut self, mb: &Multibody, _dt: f64) -> Result<ControllerOutput> {
        let mut output = ControllerOutput::zeros(mb.ndof());
        let acceleration = from_angular_linear(&Vector3::zeros(), &(mb.up() * self.gravity));
        for id in mb.descendant_bodies(BodyId::GROUND)? {
            let body = mb.body(id)?;
            let wrench = body.mass() * (iadjoint(&body.pose()?) * acceleration);
            output.gforce += body.jacobian()?.tr_mul(&wrench);
        }
        Ok(output)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_core::{Body, World};
    use arbor_joints::{PrismaticJoint, RevoluteJoint};
    use arbor_spatial::mass::{point_mass, transport};
    use arbor_spatial::transform::transl;
    use arbor_types::WorldConfig;

    #[test]
    fn test_pendulum_torque() {
        let (m, l, q) = (1.5, 0.8, 0.6);
        let mut world = World::default();
        // bob hanging at -l along y when q = 0
        let bob = world.add_body(Body::new(transport(&point_mass(m), &transl(0.0, l, 0.0))).unwrap());
        world
            .add_link(world.ground(), RevoluteJoint::rz(q, 0.0), bob)
            .unwrap();
        world.init().unwrap();
        world.update_dynamic().unwrap();

        let output = WeightController::default().update(world.multibody(), 0.01).unwrap();
        assert_relative_eq!(
            output.gforce[0],
            -m * STANDARD_GRAVITY * l * q.sin(),
            epsilon = 1e-12
        );
        assert_eq!(output.impedance, nalgebra::DMatrix::zeros(1, 1));
    }

    #[test]
    fn test_follows_up_axis() {
        let mut world = World::new(WorldConfig::z_up()).unwrap();
        let body = world.add_body(Body::new(point_mass(2.0)).unwrap());
        world
            .add_link(world.ground(), PrismaticJoint::tz(0.0, 0.0), body)
            .unwrap();
        world.init().unwrap();
        world.update_dynamic().unwrap();

        let mut weight = WeightController::new(-10.0);
        let output = weight.update(world.multibody(), 0.01).unwrap();
        assert_relative_eq!(output.gforce[0], -20.0, epsilon = 1e-12);
        assert_eq!(weight.gravity(), -10.0);
    }
}
