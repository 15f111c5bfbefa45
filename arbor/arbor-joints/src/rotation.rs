//! Joints made of successive rotations.
//!
//! For rotations `R(a_0, q_0) ⋯ R(a_k, q_k)` the jacobian column of `q_i`,
//! expressed in the last frame, is `a_i` rotated back through every later
//! rotation. Its derivative is `−Ω_i × J_i`, where `Ω_i` is the angular
//! velocity contributed by the later rotations.

use arbor_core::{Joint, LinearJoint};
use arbor_spatial::transform::Transform;
use arbor_types::{ArborError, Result};
use nalgebra::{DVector, DVectorView, Matrix6xX, Rotation3, Unit, Vector2, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::assign;

fn chain_pose(axes: &[Unit<Vector3<f64>>], gpos: &[f64]) -> Transform {
    axes.iter()
        .zip(gpos)
        .fold(Rotation3::identity(), |r, (axis, q)| {
            r * Rotation3::from_axis_angle(axis, *q)
        })
        .to_homogeneous()
}

fn chain_jacobian(axes: &[Unit<Vector3<f64>>], gpos: &[f64]) -> Matrix6xX<f64> {
    let mut jacobian = Matrix6xX::zeros(axes.len());
    let mut tail = Rotation3::identity();
    for (i, (axis, q)) in axes.iter().zip(gpos).enumerate().rev() {
        let column = tail.inverse() * axis.as_ref();
        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&column);
        tail = Rotation3::from_axis_angle(axis, *q) * tail;
    }
    jacobian
}

fn chain_djacobian(jacobian: &Matrix6xX<f64>, gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
    let mut djacobian = Matrix6xX::zeros(jacobian.ncols());
    let mut omega = Vector3::zeros();
    for i in (0..jacobian.ncols()).rev() {
        let column: Vector3<f64> = jacobian.fixed_view::<3, 1>(0, i).into_owned();
        djacobian
            .fixed_view_mut::<3, 1>(0, i)
            .copy_from(&(-omega.cross(&column)));
        omega += column * gvel[i];
    }
    djacobian
}

/// Two successive rotations about axes of the parent-side frame, the second
/// axis moving with the first rotation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UniversalJoint {
    axes: [Unit<Vector3<f64>>; 2],
    gpos: Vector2<f64>,
    gvel: Vector2<f64>,
}

impl UniversalJoint {
    /// Rotations about `first` then `second` (both normalized).
    pub fn new(
        first: Vector3<f64>,
        second: Vector3<f64>,
        gpos: Vector2<f64>,
        gvel: Vector2<f64>,
    ) -> Result<Self> {
        let unit = |v: Vector3<f64>| {
            Unit::try_new(v, 1e-12).ok_or_else(|| {
                ArborError::invalid_config(format!("joint axis must be non-zero, got {v:?}"))
            })
        };
        Ok(Self {
            axes: [unit(first)?, unit(second)?],
            gpos,
            gvel,
        })
    }

    /// `Rz(q0) Ry(q1)`.
    #[must_use]
    pub fn rzry(gpos: Vector2<f64>, gvel: Vector2<f64>) -> Self {
        Self::preset(Vector3::z_axis(), Vector3::y_axis(), gpos, gvel)
    }

    /// `Rz(q0) Rx(q1)`.
    #[must_use]
    pub fn rzrx(gpos: Vector2<f64>, gvel: Vector2<f64>) -> Self {
        Self::preset(Vector3::z_axis(), Vector3::x_axis(), gpos, gvel)
    }

    /// `Ry(q0) Rx(q1)`.
    #[must_use]
    pub fn ryrx(gpos: Vector2<f64>, gvel: Vector2<f64>) -> Self {
        Self::preset(Vector3::y_axis(), Vector3::x_axis(), gpos, gvel)
    }

    fn preset(
        first: Unit<Vector3<f64>>,
        second: Unit<Vector3<f64>>,
        gpos: Vector2<f64>,
        gvel: Vector2<f64>,
    ) -> Self {
        Self {
            axes: [first, second],
            gpos,
            gvel,
        }
    }
}

impl Joint for UniversalJoint {
    fn ndof(&self) -> usize {
        2
    }

    fn pose(&self) -> Transform {
        chain_pose(&self.axes, self.gpos.as_slice())
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        chain_jacobian(&self.axes, self.gpos.as_slice())
    }

    fn djacobian(&self, gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        chain_djacobian(&self.jacobian(), gvel)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::from_column_slice(self.gvel.as_slice())
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        assign("universal gvel", &mut self.gvel, gvel)
    }

    fn integrate(&mut self, gvel: DVectorView<'_, f64>, dt: f64) {
        self.gvel = Vector2::new(gvel[0], gvel[1]);
        self.gpos += self.gvel * dt;
    }

    fn as_linear(&self) -> Option<&dyn LinearJoint> {
        Some(self)
    }

    fn as_linear_mut(&mut self) -> Option<&mut dyn LinearJoint> {
        Some(self)
    }
}

impl LinearJoint for UniversalJoint {
    fn gpos(&self) -> DVector<f64> {
        DVector::from_column_slice(self.gpos.as_slice())
    }

    fn set_gpos(&mut self, gpos: &[f64]) -> Result<()> {
        assign("universal gpos", &mut self.gpos, gpos)
    }
}

fn zyx() -> [Unit<Vector3<f64>>; 3] {
    [Vector3::z_axis(), Vector3::y_axis(), Vector3::x_axis()]
}

/// Ball joint parametrized by `Rz(q0) Ry(q1) Rx(q2)`.
///
/// Singular when `q1 = ±π/2`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SphericalJoint {
    gpos: Vector3<f64>,
    gvel: Vector3<f64>,
}

impl SphericalJoint {
    /// Spherical joint at angles `gpos` moving at rates `gvel`.
    #[must_use]
    pub fn new(gpos: Vector3<f64>, gvel: Vector3<f64>) -> Self {
        Self { gpos, gvel }
    }
}

impl Joint for SphericalJoint {
    fn ndof(&self) -> usize {
        3
    }

    fn pose(&self) -> Transform {
        chain_pose(&zyx(), self.gpos.as_slice())
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        chain_jacobian(&zyx(), self.gpos.as_slice())
    }

    fn djacobian(&self, gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        chain_djacobian(&self.jacobian(), gvel)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::from_column_slice(self.gvel.as_slice())
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        assign("spherical gvel", &mut self.gvel, gvel)
    }

    fn integrate(&mut self, gvel: DVectorView<'_, f64>, dt: f64) {
        self.gvel = Vector3::new(gvel[0], gvel[1], gvel[2]);
        self.gpos += self.gvel * dt;
    }

    fn as_linear(&self) -> Option<&dyn LinearJoint> {
        Some(self)
    }

    fn as_linear_mut(&mut self) -> Option<&mut dyn LinearJoint> {
        Some(self)
    }
}

impl LinearJoint for SphericalJoint {
    fn gpos(&self) -> DVector<f64> {
        DVector::from_column_slice(self.gpos.as_slice())
    }

    fn set_gpos(&mut self, gpos: &[f64]) -> Result<()> {
        assign("spherical gpos", &mut self.gpos, gpos)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::check::assert_consistent;
    use approx::assert_relative_eq;
    use arbor_spatial::transform::{rotzy, rotzyx};

    #[test]
    fn test_rzry_pose() {
        let joint = UniversalJoint::rzry(Vector2::new(0.3, -1.1), Vector2::zeros());
        assert_relative_eq!(joint.pose(), rotzy(0.3, -1.1), epsilon = 1e-14);
    }

    #[test]
    fn test_spherical_pose() {
        let joint = SphericalJoint::new(Vector3::new(0.3, -0.4, 1.2), Vector3::zeros());
        assert_relative_eq!(joint.pose(), rotzyx(0.3, -0.4, 1.2), epsilon = 1e-14);
    }

    #[test]
    fn test_universal_consistent() {
        let mut joint = UniversalJoint::ryrx(Vector2::zeros(), Vector2::zeros());
        assert_consistent(&mut joint, &[0.7, -0.2], &[1.5, -2.0]);

        let mut skewed = UniversalJoint::new(
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 0.3, 1.0),
            Vector2::zeros(),
            Vector2::zeros(),
        )
        .unwrap();
        assert_consistent(&mut skewed, &[0.4, 0.9], &[-0.5, 0.8]);
    }

    #[test]
    fn test_universal_rejects_zero_axis() {
        let err = UniversalJoint::new(
            Vector3::zeros(),
            Vector3::x(),
            Vector2::zeros(),
            Vector2::zeros(),
        )
        .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_spherical_consistent() {
        let mut joint = SphericalJoint::default();
        assert_consistent(&mut joint, &[0.3, -0.4, 1.2], &[0.5, 1.0, -0.7]);
    }
}
