//! Mass matrix by repeated inverse dynamics.

use screw_math::{DMat, DVec};
use screw_model::KinematicTree;
use tracing::trace;

use crate::{DynamicsConfig, InverseDynamicsCalculator, MassMatrixCalculator, Result};

/// Column `k` of `M` is the torque produced by a unit acceleration of
/// coordinate `k` with zero velocity, no gravity and no external wrenches.
///
/// Costs one inverse dynamics pass per degree of freedom; used as a
/// reference for [`CompositeRigidBodyMassMatrixCalculator`](crate::CompositeRigidBodyMassMatrixCalculator).
#[derive(Debug, Clone)]
pub struct DifferentialIdMassMatrixCalculator {
    inverse_dynamics: InverseDynamicsCalculator,
    mass_matrix: DMat,
}

impl DifferentialIdMassMatrixCalculator {
    pub fn new(tree: &KinematicTree) -> Self {
        Self {
            inverse_dynamics: InverseDynamicsCalculator::new(tree, DynamicsConfig::inertial_only()),
            mass_matrix: DMat::zeros(0, 0),
        }
    }
}

impl MassMatrixCalculator for DifferentialIdMassMatrixCalculator {
    fn compute(&mut self, tree: &KinematicTree) -> Result<()> {
        let n = tree.dof();
        let mut m = DMat::zeros(n, n);
        let mut qdd = DVec::zeros(n);
        for k in 0..n {
            qdd[k] = 1.0;
            self.inverse_dynamics.compute_with_accelerations(tree, &qdd)?;
            m.set_column(k, &self.inverse_dynamics.torques(tree)?);
            qdd[k] = 0.0;
        }
        if n == 0 {
            tree.check_frames_current()?;
        }
        trace!(dof = n, "differential mass matrix computed");
        self.mass_matrix = m;
        Ok(())
    }

    fn mass_matrix(&self) -> &DMat {
        &self.mass_matrix
    }
}
