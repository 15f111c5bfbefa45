//! Three-dof translation.

use arbor_core::{Joint, LinearJoint};
use arbor_spatial::transform::{Transform, transl};
use arbor_types::Result;
use nalgebra::{DVector, DVectorView, Matrix6xX, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::assign;

/// Pure translation `T(q0, q1, q2)` along the parent-side axes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TranslationJoint {
    gpos: Vector3<f64>,
    gvel: Vector3<f64>,
}

impl TranslationJoint {
    /// Translation joint at offset `gpos` moving at `gvel`.
    #[must_use]
    pub fn new(gpos: Vector3<f64>, gvel: Vector3<f64>) -> Self {
        Self { gpos, gvel }
    }
}

impl Default for TranslationJoint {
    fn default() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }
}

impl Joint for TranslationJoint {
    fn ndof(&self) -> usize {
        3
    }

    fn pose(&self) -> Transform {
        transl(self.gpos.x, self.gpos.y, self.gpos.z)
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        let mut jacobian = Matrix6xX::zeros(3);
        jacobian.fixed_view_mut::<3, 3>(3, 0).fill_with_identity();
        jacobian
    }

    fn djacobian(&self, _gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        Matrix6xX::zeros(3)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::from_column_slice(self.gvel.as_slice())
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        assign("translation gvel", &mut self.gvel, gvel)
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

impl LinearJoint for TranslationJoint {
    fn gpos(&self) -> DVector<f64> {
        DVector::from_column_slice(self.gpos.as_slice())
    }

    fn set_gpos(&mut self, gpos: &[f64]) -> Result<()> {
        assign("translation gpos", &mut self.gpos, gpos)
    }
}
