//! Articulated rigid-body tree and time stepping.
//!
//! This crate owns the multibody model and the per-step pipeline:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              World                               │
//! │  ┌──────────────────────────────┐  ┌───────────────────────────┐ │
//! │  │          Multibody           │  │ constraints / controllers │ │
//! │  │ bodies ── joints ── frames   │  │  (trait objects, read the │ │
//! │  │ shapes    names    StepState │◀─┤   Multibody each step)    │ │
//! │  └──────────────────────────────┘  └───────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//!
//!  update_dynamic ─▶ update_controllers ─▶ update_constraints ─▶ integrate
//!   (J, M, B, N)        (gforce, Z, Y)       (Gauss-Seidel)       (ν, q, t)
//! ```
//!
//! Bodies and joints live in arenas addressed by [`BodyId`] and [`JointId`].
//! Each joint owns a contiguous slice of the generalized velocity vector,
//! assigned depth-first by [`World::init`].
//!
//! # Extension points
//!
//! - [`Joint`] - relative motion between two frames
//! - [`Constraint`] - bilateral or unilateral constraint solved by projection
//! - [`Controller`] - generalized force with its impedance linearization
//! - [`Observer`] - passive probe called by [`simulate`]
//! - [`ParseTarget`] - visitor over the world structure
//!
//! Concrete implementations live in `arbor-joints`, `arbor-control` and
//! `arbor-constraint`.

#![doc(html_root_url = "https://docs.rs/arbor-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,   // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod body;
mod constraint;
mod controller;
mod frame;
mod joint;
mod multibody;
mod naming;
mod observer;
mod parse;
mod simulate;
#[cfg(test)]
mod testing;
mod world;

pub use body::{Body, BodyDynamics};
pub use constraint::Constraint;
pub use controller::{Controller, ControllerOutput};
pub use frame::{Frame, SubFrame};
pub use joint::{Joint, LinearJoint};
pub use multibody::{Multibody, StepState};
pub use observer::Observer;
pub use parse::ParseTarget;
pub use simulate::simulate;
pub use world::{Link, World};

pub use arbor_types::{
    ArborError, BodyId, ConstraintId, ControllerId, Entity, FrameId, JointId, Result, ShapeId,
    SolverConfig, SubFrameId, WorldConfig,
};
