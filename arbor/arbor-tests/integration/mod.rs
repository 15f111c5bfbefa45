//! Integration tests for the arbor-* crates.
//!
//! These tests drive whole worlds through `simulate`:
//! - pendulum and free-fall dynamics against closed forms
//! - contacts and loop closures through the constraint solver
//! - energy behavior of a free snake
//! - tree editing, traversal and naming on robot fixtures

pub mod constraint_solver;
pub mod contact;
pub mod control;
pub mod free_fall;
pub mod loop_closure;
pub mod pendulum;
pub mod snake_energy;
pub mod topology;
