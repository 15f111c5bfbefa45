//! Free snake with no weight: a pure test of the integrator.

use approx::assert_relative_eq;
use arbor_control::EnergyMonitor;
use arbor_core::{World, simulate};
use arbor_tests::add_snake;

const DT: f64 = 0.005;

fn run(steps: u32) -> (World, EnergyMonitor) {
    let mut world = World::default();
    let gpos = [0.1, -0.2, 0.3, 0.0, 0.4, -0.1, 0.2, -0.3, 0.1];
    let gvel = [0.5, -0.4, 0.3, 0.2, -0.5, 0.1, 0.3, -0.2, 0.4];
    add_snake(&mut world, &gpos, &gvel, false).unwrap();
    let timeline: Vec<f64> = (0..=steps).map(|i| f64::from(i) * DT).collect();
    let mut energy = EnergyMonitor::default();
    simulate(&mut world, &timeline, &mut [&mut energy]).unwrap();
    (world, energy)
}

#[test]
fn snake_has_fifteen_dofs() {
    let (world, _) = run(1);
    assert_eq!(world.ndof(), 6 + 9);
}

/// Kinetic energy captured at steps 0, 99, 199 and 399.
const REFERENCE_TRACE: [(usize, f64); 4] = [
    (0, 7.018_649_035_465_017),
    (99, 7.015_852_510_317_737),
    (199, 7.014_991_672_974_383),
    (399, 7.010_665_223_771_975),
];

#[test]
fn kinetic_energy_matches_reference_trace() {
    let (_, energy) = run(400);
    let kinetic = energy.kinetic();
    assert_eq!(kinetic.len(), 400);
    assert!(kinetic.iter().all(|k| k.is_finite()));

    for (step, expected) in REFERENCE_TRACE {
        assert_relative_eq!(kinetic[step], expected, max_relative = 1e-9);
    }

    let first = kinetic[0];
    let worst = kinetic
        .iter()
        .map(|k| ((k - first) / first).abs())
        .fold(0.0, f64::max);
    assert!(worst < 2e-3, "kinetic energy drifted by {worst} (relative)");
}

#[test]
fn runs_are_bitwise_reproducible() {
    let (world_a, energy_a) = run(100);
    let (world_b, energy_b) = run(100);
    assert_eq!(energy_a.kinetic(), energy_b.kinetic());
    assert_eq!(world_a.gvel(), world_b.gvel());
}
