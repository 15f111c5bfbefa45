//! Energy traces.

use arbor_core::{Observer, World};
use arbor_spatial::mass::{center_of_mass, total_mass};
use arbor_spatial::transform::pdot;
use arbor_types::{BodyId, Result};

use crate::weight::STANDARD_GRAVITY;

/// Records kinetic, potential and mechanical energy at every step.
///
/// Kinetic energy is `½ νᵀ M ν`. Potential energy is `g Σ mᵢ (cᵢ · up)`,
/// where `cᵢ` is the center of mass of body `i` in ground coordinates.
/// Samples are taken when observers run, before integration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMonitor {
    gravity: f64,
    time: Vec<f64>,
    kinetic: Vec<f64>,
    potential: Vec<f64>,
    mechanical: Vec<f64>,
}

impl Default for EnergyMonitor {
    fn default() -> Self {
        Self::new(STANDARD_GRAVITY)
    }
}

impl EnergyMonitor {
    /// Monitor using gravity magnitude `gravity` for the potential term.
    #[must_use]
    pub fn new(gravity: f64) -> Self {
        Self {
            gravity,
            time: Vec::new(),
            kinetic: Vec::new(),
            potential: Vec::new(),
            mechanical: Vec::new(),
        }
    }

    /// Sample times.
    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Kinetic energy per sample.
    #[must_use]
    pub fn kinetic(&self) -> &[f64] {
        &self.kinetic
    }

    /// Potential energy per sample.
    #[must_use]
    pub fn potential(&self) -> &[f64] {
        &self.potential
    }

    /// Kinetic plus potential energy per sample.
    #[must_use]
    pub fn mechanical(&self) -> &[f64] {
        &self.mechanical
    }

    /// Largest deviation of the mechanical energy from its first sample.
    #[must_use]
    pub fn max_drift(&self) -> f64 {
        let Some(&first) = self.mechanical.first() else {
            return 0.0;
        };
        self.mechanical
            .iter()
            .map(|e| (e - first).abs())
            .fold(0.0, f64::max)
    }

    fn potential_energy(&self, world: &World) -> Result<f64> {
        let mut energy = 0.0;
        for id in world.descendant_bodies(BodyId::GROUND)? {
            let body = world.body(id)?;
            let Some(com) = center_of_mass(body.mass()) else {
                continue;
            };
            let height = pdot(&body.pose()?, &com).dot(world.up());
            energy += self.gravity * total_mass(body.mass()) * height;
        }
        Ok(energy)
    }
}

impl Observer for EnergyMonitor {
    fn init(&mut self, _world: &World, timeline: &[f64]) -> Result<()> {
        for trace in [
            &mut self.time,
            &mut self.kinetic,
            &mut self.potential,
            &mut self.mechanical,
        ] {
            trace.clear();
            trace.reserve(timeline.len().saturating_sub(1));
        }
        Ok(())
    }

    fn update(&mut self, world: &World, _dt: f64) -> Result<()> {
        let gvel = world.gvel();
        let kinetic = 0.5 * gvel.dot(&(world.mass() * gvel));
        let potential = self.potential_energy(world)?;
        self.time.push(world.current_time());
        self.kinetic.push(kinetic);
        self.potential.push(potential);
        self.mechanical.push(kinetic + potential);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::WeightController;
    use approx::assert_relative_eq;
    use arbor_core::{Body, simulate};
    use arbor_joints::{PrismaticJoint, RevoluteJoint};
    use arbor_spatial::mass::{point_mass, transport};
    use arbor_spatial::transform::transl;

    #[test]
    fn test_energies_of_moving_slider() {
        let mut world = World::default();
        let body = world.add_body(Body::new(point_mass(2.0)).unwrap());
        world
            .add_link(world.ground(), PrismaticJoint::ty(1.5, 3.0), body)
            .unwrap();
        let mut energy = EnergyMonitor::default();
        simulate(&mut world, &[0.0, 0.1], &mut [&mut energy]).unwrap();

        assert_eq!(energy.time(), &[0.0]);
        assert_relative_eq!(energy.kinetic()[0], 0.5 * 2.0 * 9.0, epsilon = 1e-12);
        assert_relative_eq!(energy.potential()[0], 9.81 * 2.0 * 1.5, epsilon = 1e-12);
        assert_relative_eq!(
            energy.mechanical()[0],
            energy.kinetic()[0] + energy.potential()[0],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_pendulum_energy_bounded() {
        let mut world = World::default();
        let bob = world.add_body(
            Body::new(transport(&point_mass(1.0), &transl(-1.0, 0.0, 0.0))).unwrap(),
        );
        world
            .add_link(world.ground(), RevoluteJoint::rz(0.0, 0.0), bob)
            .unwrap();
        world.add_controller(WeightController::default());

        let timeline: Vec<f64> = (0..=300).map(|i| f64::from(i) * 0.001).collect();
        let mut energy = EnergyMonitor::default();
        simulate(&mut world, &timeline, &mut [&mut energy]).unwrap();

        assert_eq!(energy.mechanical().len(), 300);
        assert_relative_eq!(energy.mechanical()[0], 0.0, epsilon = 1e-12);
        // the bob swings down and picks up speed
        assert!(energy.potential()[299] < -1.0);
        assert!(energy.kinetic()[299] > 1.0);
        assert!(energy.max_drift() < 0.1);
    }

    #[test]
    fn test_init_clears_previous_run() {
        let mut world = World::default();
        let body = world.add_body(Body::new(point_mass(1.0)).unwrap());
        world
            .add_link(world.ground(), PrismaticJoint::tx(0.0, 1.0), body)
            .unwrap();
        let mut energy = EnergyMonitor::default();
        simulate(&mut world, &[0.0, 0.1, 0.2], &mut [&mut energy]).unwrap();
        simulate(&mut world, &[0.2, 0.3], &mut [&mut energy]).unwrap();
        assert_eq!(energy.time().len(), 1);
        assert_relative_eq!(energy.time()[0], 0.2);
    }
}
