//! Kinematic tree model: rigid bodies connected by joints.
//!
//! Bodies and joints live in arenas owned by [`KinematicTree`] and refer to
//! each other through [`BodyId`] and [`JointId`] handles. Every body and
//! joint owns frames in the tree's [`FrameTree`]:
//!
//! ```text
//! predecessor body frame
//!   └── joint frame before   (fixed offset)
//!         └── joint frame after    (joint transform, updated from q)
//!               └── successor body frame   (identity)
//! ```

pub mod body;
pub mod builder;
pub mod error;
pub mod joint;
pub mod random;
pub mod tree;

pub use body::RigidBody;
pub use builder::KinematicTreeBuilder;
pub use error::{Result, TreeError};
pub use joint::{Joint, JointKind, JointLimits, OneDofJoint, SixDofJoint};
pub use screw_frames::{FrameId, FrameTree};
pub use tree::{BodyId, JointId, KinematicTree, PathJoint};
