//! Shared types for the arbor multibody engine.
//!
//! This crate holds the vocabulary every other `arbor-*` crate speaks:
//!
//! - [`BodyId`], [`JointId`], [`SubFrameId`], [`ShapeId`], [`ConstraintId`],
//!   [`ControllerId`] - arena handles into a world
//! - [`FrameId`] - a handle on anything that behaves as a frame
//! - [`Entity`] - a tagged handle used for registration, naming and traversal
//! - [`ArborError`] / [`Result`] - the single error type
//! - [`WorldConfig`] / [`SolverConfig`] - up vector and constraint solver settings
//!
//! # Design Philosophy
//!
//! Handles are plain indices. They carry no borrow and no behavior, so
//! constraints and controllers can hold them across steps while the world
//! owns every body, joint and frame.
//!
//! # Example
//!
//! ```
//! use arbor_types::{BodyId, FrameId, WorldConfig};
//!
//! let ground = FrameId::Body(BodyId::GROUND);
//! assert_eq!(ground.body_hint(), Some(BodyId::GROUND));
//!
//! let config = WorldConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.solver.max_iterations, 1000);
//! ```

#![doc(html_root_url = "https://docs.rs/arbor-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,   // Error docs added where non-obvious
)]

mod config;
mod error;
mod ids;

pub use config::{SolverConfig, WorldConfig};
pub use error::ArborError;
pub use ids::{BodyId, ConstraintId, ControllerId, Entity, FrameId, JointId, ShapeId, SubFrameId};

/// Result type for arbor operations.
pub type Result<T> = std::result::Result<T, ArborError>;
