//! screw: screw-theory rigid multibody kinematics and dynamics.
//!
//! Umbrella crate re-exporting the layers:
//!
//! - [`screw_math`]: nalgebra aliases, quaternions, rigid transforms
//! - [`screw_frames`]: the reference frame graph
//! - [`screw_spatial`]: frame-tagged twists, wrenches, accelerations, inertias
//! - [`screw_model`]: joints, bodies and the kinematic tree
//! - [`screw_dynamics`]: twist propagation, inverse dynamics, mass matrices,
//!   Jacobians
//!
//! ```no_run
//! use screw::{
//!     DynamicsConfig, InverseDynamicsCalculator, JointKind, KinematicTreeBuilder,
//!     MassProperties, RigidTransform, UnitVec3, Vec3,
//! };
//!
//! let mut builder = KinematicTreeBuilder::new("base");
//! let root = builder.root();
//! let (shoulder, _) = builder
//!     .attach(
//!         root,
//!         "shoulder",
//!         JointKind::revolute(UnitVec3::new_normalize(Vec3::y())),
//!         RigidTransform::identity(),
//!         "arm",
//!         MassProperties::rod(1.0, 0.5).with_com(Vec3::new(0.0, 0.0, -0.25)),
//!     )
//!     .unwrap();
//! let mut tree = builder.build().unwrap();
//! tree.joint_mut(shoulder).unwrap().set_q(0.3).unwrap();
//! tree.update_frames_recursively().unwrap();
//!
//! let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
//! id.compute(&tree).unwrap();
//! let holding_torque = id.joint_torque(shoulder).unwrap()[0];
//! # let _ = holding_torque;
//! ```

pub use screw_dynamics::{
    self, CompositeRigidBodyMassMatrixCalculator, DifferentialIdMassMatrixCalculator, DynamicsConfig,
    DynamicsError, GeometricJacobian, InverseDynamicsCalculator, MassMatrixAlgorithm, MassMatrixCalculator,
    PointJacobian, TwistCalculator, center_of_mass, kinetic_energy, linear_momentum, potential_energy,
    total_energy,
};
pub use screw_frames::{self, FrameError, FrameId, FramePoint, FrameTree, FrameVector};
pub use screw_math::{self, DMat, DVec, GRAVITY, MassProperties, Quat, RigidTransform, UnitVec3, Vec3, Vec6};
pub use screw_model::{
    self, BodyId, Joint, JointId, JointKind, JointLimits, KinematicTree, KinematicTreeBuilder, PathJoint,
    RigidBody, TreeError,
};
pub use screw_spatial::{self, Momentum, MotionSubspace, SpatialAcceleration, SpatialInertia, Twist, Wrench};
