//! Homogeneous transforms.
//!
//! A [`Transform`] `H_ab` is the pose of frame `b` relative to frame `a`.
//! Composition is plain matrix product: `H_ac = H_ab * H_bc`.

use arbor_types::{ArborError, Result};
use nalgebra::{Matrix3, Matrix4, Matrix6, Vector3};

use crate::twist::{Twist, adjacency, skew};
use crate::Adjoint;

/// 4×4 homogeneous matrix of a rigid motion.
pub type Transform = Matrix4<f64>;

/// Tolerance used when checking that a matrix is a rigid transform.
pub const HOMOGENEOUS_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Construction
// ============================================================================

/// Build a transform from a rotation block and a translation.
#[must_use]
pub fn from_parts(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Transform {
    let mut h = Transform::identity();
    h.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    h.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    h
}

/// Pure translation.
#[must_use]
pub fn transl(x: f64, y: f64, z: f64) -> Transform {
    from_parts(&Matrix3::identity(), &Vector3::new(x, y, z))
}

/// Rotation about the x axis.
#[must_use]
pub fn rotx(angle: f64) -> Transform {
    let (s, c) = angle.sin_cos();
    from_parts(
        &Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c),
        &Vector3::zeros(),
    )
}

/// Rotation about the y axis.
#[must_use]
pub fn roty(angle: f64) -> Transform {
    let (s, c) = angle.sin_cos();
    from_parts(
        &Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c),
        &Vector3::zeros(),
    )
}

/// Rotation about the z axis.
#[must_use]
pub fn rotz(angle: f64) -> Transform {
    let (s, c) = angle.sin_cos();
    from_parts(
        &Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
        &Vector3::zeros(),
    )
}

/// `rotz(az) * roty(ay) * rotx(ax)`.
#[must_use]
pub fn rotzyx(az: f64, ay: f64, ax: f64) -> Transform {
    rotz(az) * roty(ay) * rotx(ax)
}

/// `rotz(az) * roty(ay)`.
#[must_use]
pub fn rotzy(az: f64, ay: f64) -> Transform {
    rotz(az) * roty(ay)
}

/// `rotz(az) * rotx(ax)`.
#[must_use]
pub fn rotzx(az: f64, ax: f64) -> Transform {
    rotz(az) * rotx(ax)
}

/// `roty(ay) * rotx(ax)`.
#[must_use]
pub fn rotyx(ay: f64, ax: f64) -> Transform {
    roty(ay) * rotx(ax)
}

/// Frame whose z axis is the unit vector `normal`.
///
/// The x axis is orthogonal to `normal` and lies in the plane of its two
/// largest components; y completes a right-handed frame. The origin is left
/// at zero. Fails with [`ArborError::DegenerateNormal`] when `normal` is not
/// a unit vector within `1e-9` (this includes `NaN` input).
pub fn z_aligned(normal: &Vector3<f64>) -> Result<Transform> {
    let norm = normal.norm();
    if norm.is_nan() || (norm - 1.0).abs() >= 1e-9 {
        return Err(ArborError::DegenerateNormal { norm });
    }

    let z = *normal;
    let mut idx = [0_usize, 1, 2];
    // stable: ties keep axis order
    idx.sort_by(|&a, &b| z[a].abs().total_cmp(&z[b].abs()));

    let mut x = Vector3::zeros();
    x[idx[0]] = 0.0;
    x[idx[1]] = z[idx[2]];
    x[idx[2]] = -z[idx[1]];
    x /= x.norm();
    let y = z.cross(&x);

    let mut h = Transform::identity();
    h.fixed_view_mut::<3, 1>(0, 0).copy_from(&x);
    h.fixed_view_mut::<3, 1>(0, 1).copy_from(&y);
    h.fixed_view_mut::<3, 1>(0, 2).copy_from(&z);
    Ok(h)
}

// ============================================================================
// Queries
// ============================================================================

/// Rotation block.
#[must_use]
pub fn rotation(h: &Transform) -> Matrix3<f64> {
    h.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Translation column.
#[must_use]
pub fn translation(h: &Transform) -> Vector3<f64> {
    h.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Whether `h` is a rigid homogeneous transform.
///
/// The rotation block must be orthonormal with determinant 1 within `tol`
/// and the bottom row must be exactly `[0, 0, 0, 1]`.
#[must_use]
pub fn is_homogeneous_matrix(h: &Transform, tol: f64) -> bool {
    let r = rotation(h);
    let bottom_ok = h[(3, 0)] == 0.0 && h[(3, 1)] == 0.0 && h[(3, 2)] == 0.0 && h[(3, 3)] == 1.0;
    let det_ok = (r.determinant() - 1.0).abs() <= tol;
    let ortho_ok = (r.transpose() * r - Matrix3::identity()).amax() <= tol;
    bottom_ok && det_ok && ortho_ok && translation(h).iter().all(|v| v.is_finite())
}

/// Fail with [`ArborError::InvalidTransform`] unless `h` is a rigid transform.
pub fn ensure_homogeneous(h: &Transform) -> Result<()> {
    if is_homogeneous_matrix(h, HOMOGENEOUS_TOLERANCE) {
        Ok(())
    } else {
        Err(ArborError::invalid_transform(format!(
            "rotation block must be orthonormal with determinant 1 and bottom row [0 0 0 1], got {h}"
        )))
    }
}

/// Roll-pitch-yaw angles `(az, ay, ax)` such that the rotation of `h` is
/// `rotz(az) * roty(ay) * rotx(ax)`.
#[must_use]
pub fn rotzyx_angles(h: &Transform) -> (f64, f64, f64) {
    if h[(0, 0)].abs() < HOMOGENEOUS_TOLERANCE && h[(1, 0)].abs() < HOMOGENEOUS_TOLERANCE {
        // gimbal lock, yaw is arbitrary
        let ay = (-h[(2, 0)]).atan2(h[(0, 0)]);
        let ax = (-h[(1, 2)]).atan2(h[(1, 1)]);
        (0.0, ay, ax)
    } else {
        let az = h[(1, 0)].atan2(h[(0, 0)]);
        let (sz, cz) = az.sin_cos();
        let ay = (-h[(2, 0)]).atan2(cz * h[(0, 0)] + sz * h[(1, 0)]);
        let ax = (sz * h[(0, 2)] - cz * h[(1, 2)]).atan2(cz * h[(1, 1)] - sz * h[(0, 1)]);
        (az, ay, ax)
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Inverse of a rigid transform, in closed form.
#[must_use]
pub fn inv(h: &Transform) -> Transform {
    let rt = rotation(h).transpose();
    from_parts(&rt, &(-rt * translation(h)))
}

/// Apply `h` to a point.
#[must_use]
pub fn pdot(h: &Transform, point: &Vector3<f64>) -> Vector3<f64> {
    rotation(h) * point + translation(h)
}

/// Apply the rotation of `h` to a free vector.
#[must_use]
pub fn vdot(h: &Transform, vector: &Vector3<f64>) -> Vector3<f64> {
    rotation(h) * vector
}

/// Adjoint of `h`: `[[R, 0], [p̂R, R]]`.
#[must_use]
pub fn adjoint(h: &Transform) -> Adjoint {
    let r = rotation(h);
    let pr = skew(&translation(h)) * r;
    let mut ad = Matrix6::zeros();
    ad.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
    ad.fixed_view_mut::<3, 3>(3, 0).copy_from(&pr);
    ad.fixed_view_mut::<3, 3>(3, 3).copy_from(&r);
    ad
}

/// Adjoint of the inverse transform: `[[Rᵀ, 0], [-Rᵀp̂, Rᵀ]]`.
#[must_use]
pub fn iadjoint(h: &Transform) -> Adjoint {
    let rt = rotation(h).transpose();
    let rtp = -rt * skew(&translation(h));
    let mut ad = Matrix6::zeros();
    ad.fixed_view_mut::<3, 3>(0, 0).copy_from(&rt);
    ad.fixed_view_mut::<3, 3>(3, 0).copy_from(&rtp);
    ad.fixed_view_mut::<3, 3>(3, 3).copy_from(&rt);
    ad
}

/// Whether `ad` has the structure of an adjoint `[[R, 0], [p̂R, R]]`.
///
/// `R` must be a rotation within `tol`, the two diagonal blocks equal, the
/// upper-right block zero and the lower-left block times `Rᵀ` skew-symmetric.
#[must_use]
pub fn is_adjoint_matrix(ad: &Adjoint, tol: f64) -> bool {
    let r = ad.fixed_view::<3, 3>(0, 0).into_owned();
    let det_ok = (r.determinant() - 1.0).abs() <= tol;
    let ortho_ok = (r.transpose() * r - Matrix3::identity()).amax() <= tol;
    let diagonal_ok = (ad.fixed_view::<3, 3>(3, 3) - r).amax() <= tol;
    let upper_ok = ad.fixed_view::<3, 3>(0, 3).amax() <= tol;
    let p_hat = ad.fixed_view::<3, 3>(3, 0) * r.transpose();
    let skew_ok = (p_hat + p_hat.transpose()).amax() <= tol;
    det_ok && ortho_ok && diagonal_ok && upper_ok && skew_ok
}

/// Inverse of an adjoint matrix, from its blocks: `[[Rᵀ, 0], [(p̂R)ᵀ, Rᵀ]]`.
///
/// Equals `iadjoint(h)` when `ad = adjoint(h)`.
#[must_use]
pub fn adjoint_inv(ad: &Adjoint) -> Adjoint {
    let rt = ad.fixed_view::<3, 3>(0, 0).transpose();
    let prt = ad.fixed_view::<3, 3>(3, 0).transpose();
    let mut inv = Matrix6::zeros();
    inv.fixed_view_mut::<3, 3>(0, 0).copy_from(&rt);
    inv.fixed_view_mut::<3, 3>(3, 0).copy_from(&prt);
    inv.fixed_view_mut::<3, 3>(3, 3).copy_from(&rt);
    inv
}

/// Time derivative of an adjoint: `Ad · ad(T)`, where `T` is the twist of
/// the moving frame expressed in itself.
#[must_use]
pub fn dadjoint(ad: &Adjoint, twist: &Twist) -> Adjoint {
    ad * adjacency(twist)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::approx_constant
)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> Transform {
        transl(0.4, -1.3, 2.2) * rotzyx(0.7, -0.4, 1.9)
    }

    #[test]
    fn test_elementary_rotations() {
        let h = rotz(FRAC_PI_2);
        assert_relative_eq!(pdot(&h, &Vector3::x()), Vector3::y(), epsilon = 1e-15);
        let h = rotx(FRAC_PI_2);
        assert_relative_eq!(pdot(&h, &Vector3::y()), Vector3::z(), epsilon = 1e-15);
        let h = roty(FRAC_PI_2);
        assert_relative_eq!(pdot(&h, &Vector3::z()), Vector3::x(), epsilon = 1e-15);
    }

    #[test]
    fn test_compound_rotations() {
        assert_relative_eq!(rotzy(0.3, 0.2), rotzyx(0.3, 0.2, 0.0), epsilon = 1e-15);
        assert_relative_eq!(rotzx(0.3, 0.2), rotzyx(0.3, 0.0, 0.2), epsilon = 1e-15);
        assert_relative_eq!(rotyx(0.3, 0.2), rotzyx(0.0, 0.3, 0.2), epsilon = 1e-15);
    }

    #[test]
    fn test_pdot_vdot() {
        let h = transl(1.0, 2.0, 3.0) * rotz(FRAC_PI_2);
        assert_relative_eq!(
            pdot(&h, &Vector3::new(1.0, 0.0, 0.0)),
            Vector3::new(1.0, 3.0, 3.0),
            epsilon = 1e-15
        );
        assert_relative_eq!(
            vdot(&h, &Vector3::new(1.0, 0.0, 0.0)),
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_inverse() {
        let h = sample();
        assert_relative_eq!(h * inv(&h), Transform::identity(), epsilon = 1e-12);
        assert_relative_eq!(inv(&inv(&h)), h, epsilon = 1e-12);
    }

    #[test]
    fn test_adjoint_of_inverse() {
        let h = sample();
        assert_relative_eq!(adjoint(&inv(&h)), iadjoint(&h), epsilon = 1e-12);
        assert_relative_eq!(adjoint(&h) * iadjoint(&h), Matrix6::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_adjoint_composition() {
        let a = sample();
        let b = transl(-0.5, 0.1, 0.0) * rotx(0.3);
        assert_relative_eq!(adjoint(&(a * b)), adjoint(&a) * adjoint(&b), epsilon = 1e-12);
    }

    #[test]
    fn test_is_adjoint_matrix() {
        assert!(is_adjoint_matrix(&adjoint(&sample()), HOMOGENEOUS_TOLERANCE));
        assert!(is_adjoint_matrix(&Matrix6::identity(), HOMOGENEOUS_TOLERANCE));

        let mut coupled = adjoint(&sample());
        coupled[(0, 4)] = 0.1;
        assert!(!is_adjoint_matrix(&coupled, HOMOGENEOUS_TOLERANCE));

        // lower-left block of a pure scaling is not a cross product
        let mut sheared = Matrix6::identity();
        sheared[(3, 0)] = 1.0;
        assert!(!is_adjoint_matrix(&sheared, HOMOGENEOUS_TOLERANCE));

        assert!(!is_adjoint_matrix(&(Matrix6::identity() * 2.0), HOMOGENEOUS_TOLERANCE));
    }

    #[test]
    fn test_adjoint_inv() {
        let h = sample();
        assert_relative_eq!(adjoint_inv(&adjoint(&h)), iadjoint(&h), epsilon = 1e-12);
        assert_relative_eq!(
            adjoint_inv(&adjoint(&h)) * adjoint(&h),
            Matrix6::identity(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_is_homogeneous_matrix() {
        assert!(is_homogeneous_matrix(&sample(), HOMOGENEOUS_TOLERANCE));
        assert!(ensure_homogeneous(&sample()).is_ok());

        let mut bad = sample();
        bad[(3, 0)] = 1e-12;
        assert!(!is_homogeneous_matrix(&bad, HOMOGENEOUS_TOLERANCE));

        let mut scaled = sample();
        scaled[(0, 0)] *= 2.0;
        assert!(matches!(
            ensure_homogeneous(&scaled),
            Err(ArborError::InvalidTransform { .. })
        ));

        // det 1 but not orthonormal
        let mut shear = Transform::identity();
        shear[(0, 1)] = 0.5;
        assert!(!is_homogeneous_matrix(&shear, HOMOGENEOUS_TOLERANCE));
    }

    #[test]
    fn test_z_aligned_x_axis() {
        let h = z_aligned(&Vector3::x()).unwrap();
        let expected = Matrix4::new(
            0.0, 0.0, 1.0, 0.0, //
            0.0, -1.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        assert_relative_eq!(h, expected, epsilon = 1e-15);
    }

    #[test]
    fn test_z_aligned_y_axis() {
        let h = z_aligned(&Vector3::y()).unwrap();
        let expected = Matrix4::new(
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        assert_relative_eq!(h, expected, epsilon = 1e-15);
    }

    #[test]
    fn test_z_aligned_is_rigid() {
        let n = Vector3::new(2.0, 2.0, 1.0) / 3.0;
        let h = z_aligned(&n).unwrap();
        assert!(is_homogeneous_matrix(&h, HOMOGENEOUS_TOLERANCE));
        assert_relative_eq!(h.fixed_view::<3, 1>(0, 2).into_owned(), n, epsilon = 1e-15);
    }

    #[test]
    fn test_z_aligned_rejects_non_unit() {
        assert!(matches!(
            z_aligned(&Vector3::new(0.0, 0.0, 2.0)),
            Err(ArborError::DegenerateNormal { .. })
        ));
        assert!(z_aligned(&Vector3::new(f64::NAN, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_rotzyx_angles() {
        let (az, ay, ax) = (3.14 / 3.0, 3.14 / 6.0, 1.0);
        let (bz, by, bx) = rotzyx_angles(&rotzyx(az, ay, ax));
        assert_relative_eq!(bz, az, epsilon = 1e-12);
        assert_relative_eq!(by, ay, epsilon = 1e-12);
        assert_relative_eq!(bx, ax, epsilon = 1e-12);
    }

    #[test]
    fn test_rotzyx_angles_gimbal_lock() {
        let h = rotzyx(0.0, FRAC_PI_2, 0.4);
        let (az, ay, ax) = rotzyx_angles(&h);
        assert_relative_eq!(rotzyx(az, ay, ax), h, epsilon = 1e-9);
    }
}
