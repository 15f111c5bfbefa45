//! Observer contract.

use arbor_types::Result;

use crate::world::World;

/// Passive probe driven by [`simulate`](crate::simulate).
///
/// Observers see the world after the constraints have been solved and
/// before integration, and cannot modify it.
pub trait Observer {
    /// Called once after `World::init`, with the whole timeline.
    fn init(&mut self, world: &World, timeline: &[f64]) -> Result<()>;

    /// Called every step, before integration.
    fn update(&mut self, world: &World, dt: f64) -> Result<()>;

    /// Called once after the last step.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
