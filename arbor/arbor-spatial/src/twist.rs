//! Twists: `[ω, v]` velocity of a frame.

use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};

use crate::transform::{Transform, from_parts};

/// 6D twist: [angular (3), linear (3)].
pub type Twist = Vector6<f64>;

/// Angular part of a twist.
#[must_use]
pub fn angular(twist: &Twist) -> Vector3<f64> {
    twist.fixed_rows::<3>(0).into_owned()
}

/// Linear part of a twist.
#[must_use]
pub fn linear(twist: &Twist) -> Vector3<f64> {
    twist.fixed_rows::<3>(3).into_owned()
}

/// Twist from its angular and linear parts.
#[must_use]
pub fn from_angular_linear(angular: &Vector3<f64>, linear: &Vector3<f64>) -> Twist {
    Twist::new(angular.x, angular.y, angular.z, linear.x, linear.y, linear.z)
}

/// Cross-product matrix: `skew(a) * b == a × b`.
#[must_use]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Inverse of [`skew`] on the antisymmetric part of `m`.
#[must_use]
pub fn unskew(m: &Matrix3<f64>) -> Vector3<f64> {
    Vector3::new(m[(2, 1)], m[(0, 2)], m[(1, 0)])
}

/// Adjacency (`ad`) operator: `[[ω̂, 0], [v̂, ω̂]]`.
///
/// `adjacency(a) * b` is the spatial cross product of motion vectors.
#[must_use]
pub fn adjacency(twist: &Twist) -> Matrix6<f64> {
    let wx = skew(&angular(twist));
    let vx = skew(&linear(twist));
    let mut ad = Matrix6::zeros();
    ad.fixed_view_mut::<3, 3>(0, 0).copy_from(&wx);
    ad.fixed_view_mut::<3, 3>(3, 0).copy_from(&vx);
    ad.fixed_view_mut::<3, 3>(3, 3).copy_from(&wx);
    ad
}

/// Exponential map: the transform reached by following `twist` for unit time.
///
/// Below a rotation angle of `1e-3` the series expansions of the
/// trigonometric ratios are used.
#[must_use]
pub fn exp(twist: &Twist) -> Transform {
    let w = angular(twist);
    let v = linear(twist);
    let t = w.norm();
    let (cc, sc, dsc) = if t >= 1e-3 {
        let t2 = t * t;
        ((1.0 - t.cos()) / t2, t.sin() / t, (t - t.sin()) / (t2 * t))
    } else {
        (0.5, 1.0 - t * t / 6.0, 1.0 / 6.0)
    };
    let wx = skew(&w);
    let wx2 = wx * wx;
    let r = Matrix3::identity() + wx * sc + wx2 * cc;
    let p = (Matrix3::identity() * sc + wx * cc + w * w.transpose() * dsc) * v;
    from_parts(&r, &p)
}
