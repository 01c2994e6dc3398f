//! Calculator configuration.

use serde::{Deserialize, Serialize};

use screw_math::{GRAVITY, Vec3};
use screw_model::KinematicTree;

use crate::{CompositeRigidBodyMassMatrixCalculator, DifferentialIdMassMatrixCalculator, MassMatrixCalculator};

/// Mass matrix algorithm selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassMatrixAlgorithm {
    #[default]
    CompositeRigidBody,
    DifferentialInverseDynamics,
}

impl MassMatrixAlgorithm {
    pub fn calculator(self, tree: &KinematicTree) -> Box<dyn MassMatrixCalculator> {
        match self {
            MassMatrixAlgorithm::CompositeRigidBody => Box::new(CompositeRigidBodyMassMatrixCalculator::new(tree)),
            MassMatrixAlgorithm::DifferentialInverseDynamics => {
                Box::new(DifferentialIdMassMatrixCalculator::new(tree))
            }
        }
    }
}

/// Settings shared by the dynamics calculators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Gravitational acceleration in the world frame (m/s²).
    pub gravity: Vec3,
    /// Include Coriolis, centripetal and gyroscopic terms.
    pub include_velocity_terms: bool,
    pub mass_matrix_algorithm: MassMatrixAlgorithm,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -GRAVITY),
            include_velocity_terms: true,
            mass_matrix_algorithm: MassMatrixAlgorithm::default(),
        }
    }
}

impl DynamicsConfig {
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn without_gravity(self) -> Self {
        self.with_gravity(Vec3::zeros())
    }

    pub fn with_velocity_terms(mut self, include: bool) -> Self {
        self.include_velocity_terms = include;
        self
    }

    /// Zero velocity, zero gravity: the configuration used to extract
    /// mass-matrix columns from inverse dynamics.
    pub fn inertial_only() -> Self {
        Self::default().without_gravity().with_velocity_terms(false)
    }
}
