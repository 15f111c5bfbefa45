//! Controllers and observers.
//!
//! Controllers feed generalized forces into the step, linearized around the
//! next velocity (see [`ControllerOutput`](arbor_core::ControllerOutput)):
//!
//! - [`WeightController`] - gravity along the world up axis
//! - [`PdController`] - proportional-derivative tracking on linear joints
//!
//! Observers watch a [`simulate`](arbor_core::simulate) run:
//!
//! - [`EnergyMonitor`] - kinetic, potential and mechanical energy traces
//! - [`PerfMonitor`] - wall-clock time per step
//!
//! # Example
//!
//! ```
//! use arbor_control::{EnergyMonitor, WeightController};
//! use arbor_core::{Body, World, simulate};
//! use arbor_joints::RevoluteJoint;
//! use arbor_spatial::mass::{point_mass, transport};
//! use arbor_spatial::transform::transl;
//!
//! let mut world = World::default();
//! let bob = world.add_body(Body::new(transport(&point_mass(1.0), &transl(-1.0, 0.0, 0.0))).unwrap());
//! world.add_link(world.ground(), RevoluteJoint::rz(0.0, 0.0), bob).unwrap();
//! world.add_controller(WeightController::default());
//!
//! let mut energy = EnergyMonitor::default();
//! simulate(&mut world, &[0.0, 0.01, 0.02], &mut [&mut energy]).unwrap();
//! assert_eq!(energy.kinetic().len(), 2);
//! ```

#![doc(html_root_url = "https://docs.rs/arbor-control/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,   // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod energy;
mod pd;
mod perf;
mod weight;

pub use energy::EnergyMonitor;
pub use pd::PdController;
pub use perf::{PerfMonitor, PerfSummary};
pub use weight::{STANDARD_GRAVITY, WeightController};
