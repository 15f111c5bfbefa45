//! Minimal joints for unit tests.

use arbor_spatial::transform::{Transform, rotz};
use arbor_spatial::twist::{Twist, exp};
use arbor_types::{ArborError, Result};
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView, Matrix6xX};

use crate::constraint::Constraint;
use crate::controller::{Controller, ControllerOutput};
use crate::joint::{Joint, LinearJoint};
use crate::multibody::Multibody;

/// Hinge about z.
#[derive(Debug, Clone)]
pub(crate) struct TestHinge {
    q: f64,
    dq: f64,
}

impl TestHinge {
    pub(crate) fn new(q: f64, dq: f64) -> Self {
        Self { q, dq }
    }
}

impl Joint for TestHinge {
    fn ndof(&self) -> usize {
        1
    }

    fn pose(&self) -> Transform {
        rotz(self.q)
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        Matrix6xX::from_column_slice(&[0.0, 0.0, 1.0, 0.0, 0.0, 0.0])
    }

    fn djacobian(&self, _gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        Matrix6xX::zeros(1)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::from_element(1, self.dq)
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        match gvel {
            [dq] => {
                self.dq = *dq;
                Ok(())
            }
            _ => Err(ArborError::dimension_mismatch("hinge gvel", 1, gvel.len())),
        }
    }

    fn integrate(&mut self, gvel: DVectorView<'_, f64>, dt: f64) {
        self.dq = gvel[0];
        self.q += dt * self.dq;
    }

    fn as_linear(&self) -> Option<&dyn LinearJoint> {
        Some(self)
    }

    fn as_linear_mut(&mut self) -> Option<&mut dyn LinearJoint> {
        Some(self)
    }
}

impl LinearJoint for TestHinge {
    fn gpos(&self) -> DVector<f64> {
        DVector::from_element(1, self.q)
    }

    fn set_gpos(&mut self, gpos: &[f64]) -> Result<()> {
        match gpos {
            [q] => {
                self.q = *q;
                Ok(())
            }
            _ => Err(ArborError::dimension_mismatch("hinge gpos", 1, gpos.len())),
        }
    }
}

/// Six-dof joint with body-frame velocity.
#[derive(Debug, Clone)]
pub(crate) struct TestFreeJoint {
    pose: Transform,
    gvel: Twist,
}

impl TestFreeJoint {
    pub(crate) fn new(pose: Transform) -> Self {
        Self {
            pose,
            gvel: Twist::zeros(),
        }
    }
}

impl Joint for TestFreeJoint {
    fn ndof(&self) -> usize {
        6
    }

    fn pose(&self) -> Transform {
        self.pose
    }

    fn jacobian(&self) -> Matrix6xX<f64> {
        Matrix6xX::identity(6)
    }

    fn djacobian(&self, _gvel: DVectorView<'_, f64>) -> Matrix6xX<f64> {
        Matrix6xX::zeros(6)
    }

    fn gvel(&self) -> DVector<f64> {
        DVector::from_column_slice(self.gvel.as_slice())
    }

    fn set_gvel(&mut self, gvel: &[f64]) -> Result<()> {
        if gvel.len() != 6 {
            return Err(ArborError::dimension_mismatch("free gvel", 6, gvel.len()));
        }
        self.gvel = Twist::from_column_slice(gvel);
        Ok(())
    }

    fn integrate(&mut self, gvel: DVectorView<'_, f64>, dt: f64) {
        self.gvel = Twist::from_fn(|i, _| gvel[i]);
        self.pose *= exp(&(self.gvel * dt));
    }
}

/// Bilateral constraint holding one generalized velocity at zero.
#[derive(Debug, Clone)]
pub(crate) struct TestVelocityLock {
    dof: usize,
    jacobian: DMatrix<f64>,
    force: DVector<f64>,
}

impl TestVelocityLock {
    pub(crate) fn new(dof: usize) -> Self {
        Self {
            dof,
            jacobian: DMatrix::zeros(1, 0),
            force: DVector::zeros(1),
        }
    }

    pub(crate) fn resize(&mut self, ndof: usize) {
        self.jacobian = DMatrix::zeros(1, ndof);
        self.jacobian[(0, self.dof)] = 1.0;
        self.force = DVector::zeros(1);
    }
}

impl Constraint for TestVelocityLock {
    fn ndol(&self) -> usize {
        1
    }

    fn init(&mut self, mb: &Multibody) -> Result<()> {
        self.resize(mb.ndof());
        Ok(())
    }

    fn update(&mut self, _mb: &Multibody, _dt: f64) -> Result<()> {
        Ok(())
    }

    fn is_active(&self) -> bool {
        true
    }

    fn jacobian(&self) -> &DMatrix<f64> {
        &self.jacobian
    }

    fn force(&self) -> &DVector<f64> {
        &self.force
    }

    fn solve(
        &mut self,
        vel: DVectorView<'_, f64>,
        admittance: DMatrixView<'_, f64>,
        _dt: f64,
    ) -> Result<DVector<f64>> {
        let a = admittance[(0, 0)];
        if a.abs() < 1e-12 {
            return Err(ArborError::SingularAdmittance {
                constraint: "velocity lock".into(),
            });
        }
        let dforce = DVector::from_element(1, -vel[0] / a);
        self.force += &dforce;
        Ok(dforce)
    }
}

/// Constant generalized force on every dof with linear damping.
#[derive(Debug, Clone)]
pub(crate) struct TestDamper {
    pub(crate) gforce: f64,
    pub(crate) damping: f64,
}

impl Controller for TestDamper {
    fn update(&mut self, mb: &Multibody, _dt: f64) -> Result<ControllerOutput> {
        let ndof = mb.ndof();
        Ok(ControllerOutput {
            gforce: DVector::from_element(ndof, self.gforce),
            impedance: DMatrix::identity(ndof, ndof) * -self.damping,
        })
    }
}
