//! Outer simulation loop.

use arbor_types::{ArborError, Result};
use tracing::warn;

use crate::observer::Observer;
use crate::world::World;

/// Run `world` along `timeline`.
///
/// The world time is set to `timeline[0]` (with a warning when it differed)
/// and the world is initialized. Each following entry is one step:
/// `update_dynamic`, `update_controllers`, `update_constraints` with the
/// world's solver settings, observer updates, then `integrate`.
pub fn simulate(
    world: &mut World,
    timeline: &[f64],
    observers: &mut [&mut dyn Observer],
) -> Result<()> {
    let Some((&start, steps)) = timeline.split_first() else {
        return Err(ArborError::invalid_config("timeline is empty"));
    };
    if world.current_time() != start {
        warn!(
            world_time = world.current_time(),
            timeline_start = start,
            "world time does not match the start of the timeline"
        );
    }
    world.set_current_time(start);
    world.init()?;
    for observer in observers.iter_mut() {
        observer.init(world, timeline)?;
    }

    let solver = world.config().solver.clone();
    for &next in steps {
        let dt = next - world.current_time();
        world.update_dynamic()?;
        world.update_controllers(dt)?;
        world.update_constraints(dt, solver.max_iterations, solver.tolerance)?;
        for observer in observers.iter_mut() {
            observer.update(world, dt)?;
        }
        world.integrate(dt)?;
    }

    for observer in observers.iter_mut() {
        observer.finish()?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::testing::{TestDamper, TestHinge};
    use approx::assert_relative_eq;
    use arbor_spatial::mass::point_mass;

    #[derive(Debug, Default)]
    struct Log {
        events: Vec<String>,
        times: Vec<f64>,
    }

    impl Observer for Log {
        fn init(&mut self, world: &World, timeline: &[f64]) -> Result<()> {
            self.events.push(format!("init {}", timeline.len()));
            self.times.push(world.current_time());
            Ok(())
        }

        fn update(&mut self, world: &World, dt: f64) -> Result<()> {
            self.events.push(format!("update {dt:.2}"));
            self.times.push(world.current_time());
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.events.push("finish".into());
            Ok(())
        }
    }

    fn world() -> World {
        let mut world = World::default();
        let body = world.add_body(Body::new(point_mass(1.0)).unwrap());
        world
            .add_link(world.ground(), TestHinge::new(0.0, 0.0), body)
            .unwrap();
        // a point mass on its own hinge axis has no inertia about it
        world.add_controller(TestDamper {
            gforce: 1.0,
            damping: 1.0,
        });
        world
    }

    #[test]
    fn test_simulate_call_order() {
        let mut world = world();
        let mut log = Log::default();
        simulate(&mut world, &[1.0, 1.25, 1.5], &mut [&mut log]).unwrap();

        assert_eq!(log.events, vec!["init 3", "update 0.25", "update 0.25", "finish"]);
        assert_eq!(log.times, vec![1.0, 1.0, 1.25]);
        assert_relative_eq!(world.current_time(), 1.5);
    }

    #[test]
    fn test_simulate_empty_timeline() {
        let mut world = world();
        let err = simulate(&mut world, &[], &mut []).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_simulate_rejects_non_increasing_timeline() {
        let mut world = world();
        let err = simulate(&mut world, &[0.0, 0.1, 0.1], &mut []).unwrap_err();
        assert!(matches!(err, ArborError::InvalidTimestep(_)));
    }
}
