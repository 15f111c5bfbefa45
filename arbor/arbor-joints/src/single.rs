//! One-dof joints along a fixed axis.

use arbor_core::{Joint, LinearJoint};
use arbor_spatial::transform::{Transform, from_parts};
use arbor_types::{ArborError, Result};
use nalgebra::{DVector, DVectorView, Matrix6xX, Rotation3, Unit, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn scalar(what: &str, target: &mut f64, values: &[f64]) -> Result<()> {
    match values {
        [value] => {
            *target = *value;
            Ok(())
        }
        _ => Err(ArborError::dimension_mismatch(what, 1, values.len())),
    }
}

fn unit_axis(axis: Vector3<f64>) -> Result<Unit<Vector3<f64>>> {
    let norm = axis.norm();
    if !norm.is_finite() || norm < 1e-12 {
        return Err(ArborError::invalid_config(format!(
            "joint axis must be non-zero and finite (norm is {norm})"
        )));
    }
    Ok(Unit::new_normalize(axis))
}

/// Hinge about a unit axis of the parent-side frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RevoluteJoint {
    axis: Unit<Vector3<f64>>,
    gpos: f64,
    gvel: f64,
}

impl RevoluteJoint {
    /// Hinge about `axis` (normalized) at angle `gpos` and rate `gvel`.
    pub fn new(axis: Vector3<f64>, gpos: f64, gvel: f64) -> Result<Self> {
        Ok(Self {
            axis: unit_axis(axis)?,
            gpos,
            gvel,
        })
    }

    /// Hinge about x.
    #[must_use]
    pub fn rx(gpos: f64, gvel: f64) -> Self {
        Self {
            axis: Vector3::x_axis(),
            gpos,
            gvel,
        }
    }

    /// Hinge about y.
    #[must_use]
    pub fn ry(gpos: f64, gvel: f64) -> Self {
        Self {
            axis: Vector3::y_axis(),
            gpos,
            gvel,
        }
    }

    /// Hinge about z.
    #[must_use]
    pub fn rz(gpos: f64, gvel: f64) -> Self {
        Self {
            axis: Vector3::z_axis(),
            gpos,
            gvel,
        }
    }

    /// Rotation axis.
    #[must_use]
    pub fn axis(&self) -> &Unit<Vector3<f64>> {
        &self.axis
    }

    /// Angle.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.gpos
    }
}

impl Joint for RevoluteJoint {
    fn ndof(&self) -> usize {
        1
    }

    fn pose(&self) -> Transform {
        Rotation3::from_axis_angle(&self.axis, self.gpos).to_homogeneous()
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        let a = self.axis.as_ref();
        Matrix6xX::from_column_slice(&[a.x, a.y, a.z, 0.0, 0.0, 0.0])
    }

    fn djacobian(&self, _gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        Matrix6xX::zeros(1)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::from_element(1, self.gvel)
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        scalar("revolute gvel", &mut self.gvel, gvel)
    }

    fn integrate(&mut self, gvel: DVectorView<'_, f64>, dt: f64) {
        self.gvel = gvel[0];
        self.gpos += dt * self.gvel;
    }

    fn as_linear(&self) -> Option<&dyn LinearJoint> {
        Some(self)
    }

    fn as_linear_mut(&mut self) -> Option<&mut dyn LinearJoint> {
        Some(self)
    }
}

impl LinearJoint for RevoluteJoint {
    fn gpos(&self) -> DVector<f64> {
        DVector::from_element(1, self.gpos)
    }

    fn set_gpos(&mut self, gpos: &[f64]) -> Result<()> {
        scalar("revolute gpos", &mut self.gpos, gpos)
    }
}

/// Slider along a unit axis of the parent-side frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrismaticJoint {
    axis: Unit<Vector3<f64>>,
    gpos: f64,
    gvel: f64,
}

impl PrismaticJoint {
    /// Slider along `axis` (normalized).
    pub fn new(axis: Vector3<f64>, gpos: f64, gvel: f64) -> Result<Self> {
        Ok(Self {
            axis: unit_axis(axis)?,
            gpos,
            gvel,
        })
    }

    /// Slider along x.
    #[must_use]
    pub fn tx(gpos: f64, gvel: f64) -> Self {
        Self {
            axis: Vector3::x_axis(),
            gpos,
            gvel,
        }
    }

    /// Slider along y.
    #[must_use]
    pub fn ty(gpos: f64, gvel: f64) -> Self {
        Self {
            axis: Vector3::y_axis(),
            gpos,
            gvel,
        }
    }

    /// Slider along z.
    #[must_use]
    pub fn tz(gpos: f64, gvel: f64) -> Self {
        Self {
            axis: Vector3::z_axis(),
            gpos,
            gvel,
        }
    }

    /// Sliding axis.
    #[must_use]
    pub fn axis(&self) -> &Unit<Vector3<f64>> {
        &self.axis
    }
}

impl Joint for PrismaticJoint {
    fn ndof(&self) -> usize {
        1
    }

    fn pose(&self) -> Transform {
        from_parts(&nalgebra::Matrix3::identity(), &(self.axis.as_ref() * self.gpos))
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        let a = self.axis.as_ref();
        Matrix6xX::from_column_slice(&[0.0, 0.0, 0.0, a.x, a.y, a.z])
    }

    fn djacobian(&self, _gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        Matrix6xX::zeros(1)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::from_element(1, self.gvel)
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        scalar("prismatic gvel", &mut self.gvel, gvel)
    }

    fn integrate(&mut self, gvel: DVectorView<'_, f64>, dt: f64) {
        self.gvel = gvel[0];
        self.gpos += dt * self.gvel;
    }

    fn as_linear(&self) -> Option<&dyn LinearJoint> {
        Some(self)
    }

    fn as_linear_mut(&mut self) -> Option<&mut dyn LinearJoint> {
        Some(self)
    }
}

impl LinearJoint for PrismaticJoint {
    fn gpos(&self) -> DVector<f64> {
        DVector::from_element(1, self.gpos)
    }

    fn set_gpos(&mut self, gpos: &[f64]) -> Result<()> {
        scalar("prismatic gpos", &mut self.gpos, gpos)
    }
}
