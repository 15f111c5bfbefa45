//! Proportional-derivative joint control.

use arbor_core::{Controller, ControllerOutput, Multibody};
use arbor_types::{ArborError, JointId, Result};
use nalgebra::{DMatrix, DVector};

/// Tracks desired positions and velocities of linear joints.
///
/// The torque `Kp (q_d − q(t+dt)) + Kd (dq_d − dq(t+dt))` is linearized
/// with `q(t+dt) = q(t) + dt dq(t+dt)`, giving
///
/// - force `Kp (q_d − q) + Kd dq_d`
/// - impedance `−(dt Kp + Kd)`
///
/// on the dofs of the controlled joints.
#[derive(Debug, Clone, PartialEq)]
pub struct PdController {
    joints: Vec<JointId>,
    kp: DMatrix<f64>,
    kd: DMatrix<f64>,
    gpos_des: Option<DVector<f64>>,
    gvel_des: Option<DVector<f64>>,
    dof_map: Vec<usize>,
}

impl PdController {
    /// Controller on `joints` with gain matrices sized to the sum of their
    /// dofs. Targets default to zero.
    #[must_use]
    pub fn new(joints: Vec<JointId>, kp: DMatrix<f64>, kd: DMatrix<f64>) -> Self {
        Self {
            joints,
            kp,
            kd,
            gpos_des: None,
            gvel_des: None,
            dof_map: Vec::new(),
        }
    }

    /// Set the desired generalized position.
    #[must_use]
    pub fn with_gpos_des(mut self, gpos_des: DVector<f64>) -> Self {
        self.gpos_des = Some(gpos_des);
        self
    }

    /// Set the desired generalized velocity.
    #[must_use]
    pub fn with_gvel_des(mut self, gvel_des: DVector<f64>) -> Self {
        self.gvel_des = Some(gvel_des);
        self
    }

    /// Controlled joints.
    #[must_use]
    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    fn cndof(&self) -> usize {
        self.dof_map.len()
    }

    fn gpos(&self, mb: &Multibody) -> Result<DVector<f64>> {
        let mut parts = Vec::with_capacity(self.cndof());
        for &id in &self.joints {
            let joint = mb
                .joint(id)?
                .as_linear()
                .ok_or(ArborError::NotLinearJoint { joint: id })?;
            parts.extend(joint.gpos().iter().copied());
        }
        Ok(DVector::from_vec(parts))
    }
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ArborError::dimension_mismatch(what, expected, actual))
    }
}

impl Controller for PdController {
    fn init(&mut self, mb: &Multibody) -> Result<()> {
        let mut dof_map = Vec::new();
        for &id in &self.joints {
            if mb.joint(id)?.as_linear().is_none() {
                return Err(ArborError::NotLinearJoint { joint: id });
            }
            dof_map.extend(mb.joint_dofs(id)?);
        }
        let n = dof_map.len();
        check_len("pd kp rows", n, self.kp.nrows())?;
        check_len("pd kp columns", n, self.kp.ncols())?;
        check_len("pd kd rows", n, self.kd.nrows())?;
        check_len("pd kd columns", n, self.kd.ncols())?;
        let gpos_des = self.gpos_des.get_or_insert_with(|| DVector::zeros(n));
        check_len("pd gpos_des", n, gpos_des.len())?;
        let gvel_des = self.gvel_des.get_or_insert_with(|| DVector::zeros(n));
        check_len("pd gvel_des", n, gvel_des.len())?;
        self.dof_map = dof_map;
        Ok(())
    }

    fn update(&mut self, mb: &Multibody, dt: f64) -> Result<ControllerOutput> {
        let (Some(gpos_des), Some(gvel_des)) = (&self.gpos_des, &self.gvel_des) else {
            return Err(ArborError::not_initialized("pd controller targets"));
        };
        let gpos = self.gpos(mb)?;
        check_len("pd gpos", self.cndof(), gpos.len())?;

        let force = &self.kp * (gpos_des - gpos) + &self.kd * gvel_des;
        let impedance = -(&self.kp * dt + &self.kd);

        let mut output = ControllerOutput::zeros(mb.ndof());
        for (i, &row) in self.dof_map.iter().enumerate() {
            output.gforce[row] = force[i];
            for (j, &col) in self.dof_map.iter().enumerate() {
                output.impedance[(row, col)] = impedance[(i, j)];
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_core::{Body, World};
    use arbor_joints::{FreeJoint, RevoluteJoint};
    use arbor_spatial::mass::sphere_mass;

    fn arm() -> (World, JointId, JointId) {
        let mut world = World::default();
        let upper = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
        let lower = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
        let shoulder = world
            .add_link(world.ground(), RevoluteJoint::rz(0.2, 0.0), upper)
            .unwrap();
        let elbow = world
            .add_link(upper, RevoluteJoint::rz(-0.4, 0.0), lower)
            .unwrap();
        (world, shoulder, elbow)
    }

    #[test]
    fn test_force_and_impedance() {
        let (mut world, _, elbow) = arm();
        world.init().unwrap();
        let mut pd = PdController::new(
            vec![elbow],
            DMatrix::from_element(1, 1, 10.0),
            DMatrix::from_element(1, 1, 2.0),
        )
        .with_gpos_des(DVector::from_element(1, 0.1))
        .with_gvel_des(DVector::from_element(1, 0.5));
        pd.init(world.multibody()).unwrap();
        let output = pd.update(world.multibody(), 0.01).unwrap();

        assert_eq!(output.gforce[0], 0.0);
        assert_relative_eq!(output.gforce[1], 10.0 * 0.5 + 2.0 * 0.5, epsilon = 1e-12);
        assert_relative_eq!(output.impedance[(1, 1)], -(10.0 * 0.01 + 2.0), epsilon = 1e-12);
        assert_eq!(output.impedance[(0, 0)], 0.0);
    }

    #[test]
    fn test_rejects_free_joint() {
        let mut world = World::default();
        let body = world.add_body(Body::new(sphere_mass(0.1, 1.0)).unwrap());
        let free = world
            .add_link(world.ground(), FreeJoint::identity(), body)
            .unwrap();
        world.add_controller(PdController::new(
            vec![free],
            DMatrix::zeros(6, 6),
            DMatrix::zeros(6, 6),
        ));
        assert_eq!(world.init(), Err(ArborError::NotLinearJoint { joint: free }));
    }

    #[test]
    fn test_rejects_wrong_gain_size() {
        let (mut world, shoulder, elbow) = arm();
        world.add_controller(PdController::new(
            vec![shoulder, elbow],
            DMatrix::identity(3, 3),
            DMatrix::identity(2, 2),
        ));
        assert!(matches!(
            world.init(),
            Err(ArborError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_converges_to_target() {
        let (mut world, shoulder, elbow) = arm();
        world.add_controller(
            PdController::new(
                vec![shoulder, elbow],
                DMatrix::identity(2, 2) * 5.0,
                DMatrix::identity(2, 2) * 1.0,
            )
            .with_gpos_des(DVector::from_vec(vec![0.5, 0.3])),
        );
        let timeline: Vec<f64> = (0..=2000).map(|i| f64::from(i) * 0.005).collect();
        arbor_core::simulate(&mut world, &timeline, &mut []).unwrap();

        let gpos = |id| world.joint(id).unwrap().as_linear().unwrap().gpos()[0];
        assert_relative_eq!(gpos(shoulder), 0.5, epsilon = 1e-3);
        assert_relative_eq!(gpos(elbow), 0.3, epsilon = 1e-3);
    }
}
