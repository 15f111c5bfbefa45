//! Spatial algebra for rigid multibody systems.
//!
//! Everything here is pure math on `nalgebra` fixed-size matrices:
//!
//! - [`transform`] - 4×4 homogeneous transforms, their inverse, adjoint and
//!   inverse adjoint, elementary rotations and the z-aligned contact frame
//! - [`twist`] - 6D twists `[ω, v]`, their adjacency (`ad`) operator and
//!   exponential map
//! - [`mass`] - 6×6 generalized mass matrices of elementary solids and their
//!   transport between frames
//!
//! # Conventions
//!
//! ```text
//!   H_ab  = [ R  p ]      pose of frame b expressed in frame a
//!           [ 0  1 ]
//!
//!   T     = [ ω ]         twist: angular part first, linear part second
//!           [ v ]
//!
//!   Ad_ab = [ R     0 ]   maps twists expressed in b to twists expressed in a
//!           [ p̂R    R ]
//! ```
//!
//! # Example
//!
//! ```
//! use arbor_spatial::transform::{adjoint, iadjoint, inv, rotzyx, transl};
//! use approx::assert_relative_eq;
//!
//! let h = transl(1.0, 2.0, 3.0) * rotzyx(0.3, -0.2, 1.1);
//! assert_relative_eq!(h * inv(&h), nalgebra::Matrix4::identity(), epsilon = 1e-12);
//! assert_relative_eq!(adjoint(&inv(&h)), iadjoint(&h), epsilon = 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/arbor-spatial/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::many_single_char_names, // Math notation
)]

pub mod mass;
pub mod transform;
pub mod twist;

pub use mass::MassMatrix;
pub use transform::Transform;
pub use twist::Twist;

/// 6×6 adjoint matrix mapping twists between frames.
pub type Adjoint = nalgebra::Matrix6<f64>;
