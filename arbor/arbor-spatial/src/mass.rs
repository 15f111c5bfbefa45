//! Generalized (6×6) mass matrices.
//!
//! A mass matrix `M` expressed in frame `b` relates a twist of `b` to the
//! momentum wrench: `W = M T`. With the twist convention `[ω, v]`:
//!
//! ```text
//! M = [ I_b        m ĉ ]
//!     [ m ĉᵀ       m 1 ]
//! ```
//!
//! where `c` is the center of mass expressed in `b`.

use arbor_types::{ArborError, Result};
use nalgebra::{Matrix6, SymmetricEigen, Vector3};

use crate::transform::{Transform, adjoint};
use crate::twist::unskew;

/// 6×6 generalized mass matrix.
pub type MassMatrix = Matrix6<f64>;

/// Tolerance for the symmetry and eigenvalue checks of [`is_mass_matrix`].
pub const MASS_TOLERANCE: f64 = 1e-10;

/// Whether `m` is symmetric and positive definite (or semi-definite when
/// `semi` is set).
#[must_use]
pub fn is_mass_matrix(m: &MassMatrix, semi: bool) -> bool {
    if !m.iter().all(|v| v.is_finite()) {
        return false;
    }
    if (m - m.transpose()).amax() > MASS_TOLERANCE {
        return false;
    }
    let eigen = SymmetricEigen::new(*m);
    let min = eigen.eigenvalues.min();
    if semi {
        min >= -MASS_TOLERANCE
    } else {
        min > MASS_TOLERANCE
    }
}

/// Fail with [`ArborError::InvalidMassMatrix`] unless `m` is symmetric
/// positive semi-definite.
pub fn ensure_mass_matrix(m: &MassMatrix) -> Result<()> {
    if is_mass_matrix(m, true) {
        Ok(())
    } else {
        Err(ArborError::invalid_mass(
            "must be finite, symmetric and positive semi-definite",
        ))
    }
}

/// Mass matrix of a point mass located at the frame origin.
#[must_use]
pub fn point_mass(mass: f64) -> MassMatrix {
    MassMatrix::from_diagonal(&nalgebra::Vector6::new(0.0, 0.0, 0.0, mass, mass, mass))
}

/// Mass matrix of a homogeneous box, in its center frame.
#[must_use]
pub fn box_mass(half_extents: &Vector3<f64>, mass: f64) -> MassMatrix {
    let (a2, b2, c2) = (
        half_extents.x * half_extents.x,
        half_extents.y * half_extents.y,
        half_extents.z * half_extents.z,
    );
    MassMatrix::from_diagonal(&nalgebra::Vector6::new(
        mass * (b2 + c2) / 3.0,
        mass * (a2 + c2) / 3.0,
        mass * (a2 + b2) / 3.0,
        mass,
        mass,
        mass,
    ))
}

/// Mass matrix of a homogeneous cylinder whose axis is z, in its center frame.
#[must_use]
pub fn cylinder_mass(length: f64, radius: f64, mass: f64) -> MassMatrix {
    let d = (3.0 * radius * radius + length * length) / 12.0;
    MassMatrix::from_diagonal(&nalgebra::Vector6::new(
        mass * d,
        mass * d,
        mass * radius * radius / 2.0,
        mass,
        mass,
        mass,
    ))
}

/// Mass matrix of a homogeneous ball, in its center frame.
#[must_use]
pub fn sphere_mass(radius: f64, mass: f64) -> MassMatrix {
    let i = 2.0 / 5.0 * mass * radius * radius;
    MassMatrix::from_diagonal(&nalgebra::Vector6::new(i, i, i, mass, mass, mass))
}

/// Express `m_a` (given in frame `a`) in frame `b`, where `h_ab` is the pose
/// of `b` in `a`.
#[must_use]
pub fn transport(m_a: &MassMatrix, h_ab: &Transform) -> MassMatrix {
    let ad = adjoint(h_ab);
    ad.transpose() * m_a * ad
}

/// Total mass carried by `m`.
#[must_use]
pub fn total_mass(m: &MassMatrix) -> f64 {
    m[(5, 5)]
}

/// Center of mass expressed in the frame of `m`, or `None` for a massless
/// matrix.
#[must_use]
pub fn center_of_mass(m: &MassMatrix) -> Option<Vector3<f64>> {
    let mass = total_mass(m);
    if mass <= MASS_TOLERANCE {
        return None;
    }
    let upper_right = m.fixed_view::<3, 3>(0, 3).into_owned();
    Some(unskew(&upper_right) / mass)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::transform::{rotzyx, transl};
    use approx::assert_relative_eq;

    #[test]
    fn test_elementary_solids_are_mass_matrices() {
        assert!(is_mass_matrix(&box_mass(&Vector3::new(0.5, 1.0, 1.5), 2.0), false));
        assert!(is_mass_matrix(&cylinder_mass(1.0, 0.1, 3.0), false));
        assert!(is_mass_matrix(&sphere_mass(0.3, 1.0), false));
        assert!(!is_mass_matrix(&point_mass(1.0), false));
        assert!(is_mass_matrix(&point_mass(1.0), true));
    }

    #[test]
    fn test_box_inertia() {
        let m = box_mass(&Vector3::new(0.5, 1.0, 1.5), 3.0);
        assert_relative_eq!(m[(0, 0)], 3.0 * (1.0 + 2.25) / 3.0, epsilon = 1e-15);
        assert_relative_eq!(m[(1, 1)], 3.0 * (0.25 + 2.25) / 3.0, epsilon = 1e-15);
        assert_relative_eq!(m[(2, 2)], 3.0 * (0.25 + 1.0) / 3.0, epsilon = 1e-15);
        assert_eq!(total_mass(&m), 3.0);
    }

    #[test]
    fn test_rejects_invalid() {
        let mut m = sphere_mass(1.0, 1.0);
        m[(0, 1)] = 0.5;
        assert!(!is_mass_matrix(&m, true));
        assert!(ensure_mass_matrix(&m).is_err());

        let negative = -sphere_mass(1.0, 1.0);
        assert!(matches!(
            ensure_mass_matrix(&negative),
            Err(ArborError::InvalidMassMatrix { .. })
        ));
    }

    #[test]
    fn test_transport_point_mass() {
        // point mass 2 at (0, 3, 0) seen from the origin
        let m = transport(&point_mass(2.0), &transl(0.0, -3.0, 0.0));
        assert!(is_mass_matrix(&m, true));
        assert_relative_eq!(m[(0, 0)], 2.0 * 9.0, epsilon = 1e-12);
        assert_relative_eq!(m[(2, 2)], 2.0 * 9.0, epsilon = 1e-12);
        assert_relative_eq!(m[(1, 1)], 0.0, epsilon = 1e-12);
        assert_relative_eq!(
            center_of_mass(&m).unwrap(),
            Vector3::new(0.0, 3.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_transport_keeps_mass_and_symmetry() {
        let m = transport(
            &box_mass(&Vector3::new(0.2, 0.3, 0.4), 5.0),
            &(transl(0.3, -0.1, 0.7) * rotzyx(0.2, 0.4, -1.0)),
        );
        assert!(is_mass_matrix(&m, false));
        assert_relative_eq!(total_mass(&m), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_center_of_mass_massless() {
        assert!(center_of_mass(&MassMatrix::zeros()).is_none());
    }
}
