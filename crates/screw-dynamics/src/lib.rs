//! Kinematics and dynamics algorithms over a [`KinematicTree`].
//!
//! - [`TwistCalculator`]: top-down twist propagation
//! - [`InverseDynamicsCalculator`]: recursive Newton-Euler
//! - [`CompositeRigidBodyMassMatrixCalculator`] and
//!   [`DifferentialIdMassMatrixCalculator`]: joint-space mass matrix
//! - [`GeometricJacobian`] and [`PointJacobian`]
//!
//! Every calculator requires the tree's frames to be current; call
//! [`KinematicTree::update_frames_recursively`] after changing joint
//! configurations.

pub mod config;
pub mod crba;
pub mod differential;
pub mod energy;
pub mod error;
pub mod inverse_dynamics;
pub mod jacobian;
pub mod mass_matrix;
pub mod point_jacobian;
pub mod twist;

pub use config::{DynamicsConfig, MassMatrixAlgorithm};
pub use crba::CompositeRigidBodyMassMatrixCalculator;
pub use differential::DifferentialIdMassMatrixCalculator;
pub use energy::{center_of_mass, kinetic_energy, linear_momentum, potential_energy, total_energy};
pub use error::{DynamicsError, Result};
pub use inverse_dynamics::InverseDynamicsCalculator;
pub use jacobian::GeometricJacobian;
pub use mass_matrix::MassMatrixCalculator;
pub use point_jacobian::PointJacobian;
pub use screw_model::KinematicTree;
pub use twist::TwistCalculator;
