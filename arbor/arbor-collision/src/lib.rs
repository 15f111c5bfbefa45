//! Shapes and proximity solvers.
//!
//! A [`Shape`] is a primitive geometry attached to a frame. The proximity
//! solvers compute, for a pair of posed shapes, the signed distance between
//! them and one witness frame on each shape:
//!
//! ```text
//!            shape 0                      shape 1
//!         ┌───────────┐                 .-~~~~-.
//!         │           │   z      z     (         )
//!         │        H_gc0 ──▶ ... ──▶ H_gc1        )
//!         │           │   distance      `-.__.-'
//!         └───────────┘
//! ```
//!
//! Both frames share the same z axis, the contact normal pointing from
//! shape 0 toward shape 1. A negative distance means interpenetration.
//!
//! [`choose_solver`] maps a pair of [`ShapeKind`]s to a [`PairSolver`] and
//! the argument order it expects; [`collide`] runs the whole dispatch.
//!
//! # Example
//!
//! ```
//! use arbor_collision::{Geometry, collide};
//! use arbor_spatial::transform::transl;
//! use approx::assert_relative_eq;
//!
//! let a = Geometry::sphere(1.1).unwrap();
//! let b = Geometry::sphere(1.2).unwrap();
//! let p = collide(&a, &nalgebra::Matrix4::identity(), &b, &transl(2.0, 2.0, 1.0)).unwrap();
//! assert_relative_eq!(p.distance, 0.7, epsilon = 1e-12);
//! assert!(!p.swapped);
//! ```

#![doc(html_root_url = "https://docs.rs/arbor-collision/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,   // Error docs added where non-obvious
)]

mod dispatch;
pub mod proximity;
mod shape;

pub use dispatch::{PairSolver, SolverChoice, choose_solver, collide, solve};
pub use proximity::Proximity;
pub use shape::{GEOM_EPSILON, Geometry, Shape, ShapeKind};
