//! Wall-clock step timing.

use std::time::{Duration, Instant};

use arbor_core::{Observer, World};
use arbor_types::Result;
use tracing::{debug, info};

/// Aggregate step timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSummary {
    /// Number of timed steps.
    pub steps: usize,
    /// Sum of all step durations.
    pub total: Duration,
    /// Fastest step.
    pub min: Duration,
    /// Mean step duration.
    pub mean: Duration,
    /// Slowest step.
    pub max: Duration,
}

/// Measures the wall-clock time elapsed between observer updates.
///
/// With logging enabled, the current simulation time is emitted at `debug`
/// level on every step and the summary at `info` level when the run ends.
#[derive(Debug, Clone, Default)]
pub struct PerfMonitor {
    log: bool,
    last: Option<Instant>,
    durations: Vec<Duration>,
}

impl PerfMonitor {
    /// Monitor that logs progress when `log` is set.
    #[must_use]
    pub fn new(log: bool) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Per-step durations recorded so far.
    #[must_use]
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    /// Total, min, mean and max of the recorded durations, or `None` before
    /// any step ran.
    #[must_use]
    pub fn summary(&self) -> Option<PerfSummary> {
        let min = *self.durations.iter().min()?;
        let max = *self.durations.iter().max()?;
        let total: Duration = self.durations.iter().sum();
        let steps = self.durations.len();
        let mean = total / u32::try_from(steps).unwrap_or(u32::MAX);
        Some(PerfSummary {
            steps,
            total,
            min,
            mean,
            max,
        })
    }
}

impl Observer for PerfMonitor {
    fn init(&mut self, _world: &World, timeline: &[f64]) -> Result<()> {
        self.durations.clear();
        self.durations.reserve(timeline.len().saturating_sub(1));
        self.last = Some(Instant::now());
        Ok(())
    }

    fn update(&mut self, world: &World, _dt: f64) -> Result<()> {
        let now = Instant::now();
        if let Some(last) = self.last.replace(now) {
            self.durations.push(now - last);
        }
        if self.log {
            debug!(time = world.current_time(), "step");
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.log {
            if let Some(summary) = self.summary() {
                info!(
                    steps = summary.steps,
                    total = ?summary.total,
                    min = ?summary.min,
                    mean = ?summary.mean,
                    max = ?summary.max,
                    "simulation timing"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use arbor_core::{Body, simulate};
    use arbor_joints::PrismaticJoint;
    use arbor_spatial::mass::point_mass;

    #[test]
    fn test_summary_empty() {
        assert!(PerfMonitor::default().summary().is_none());
    }

    #[test]
    fn test_one_duration_per_step() {
        let mut world = World::default();
        let body = world.add_body(Body::new(point_mass(1.0)).unwrap());
        world
            .add_link(world.ground(), PrismaticJoint::tx(0.0, 1.0), body)
            .unwrap();
        let mut perf = PerfMonitor::new(true);
        simulate(&mut world, &[0.0, 0.1, 0.2, 0.3], &mut [&mut perf]).unwrap();

        assert_eq!(perf.durations().len(), 3);
        let summary = perf.summary().unwrap();
        assert_eq!(summary.steps, 3);
        assert!(summary.min <= summary.mean && summary.mean <= summary.max);
        assert_eq!(summary.total, perf.durations().iter().sum::<Duration>());
    }
}
