//! Rigid bodies.

use screw_frames::FrameId;
use screw_spatial::SpatialInertia;

use crate::JointId;

/// A rigid body in a kinematic tree.
///
/// The root ("elevator") has no inertia and no parent joint.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub(crate) name: String,
    pub(crate) body_frame: FrameId,
    pub(crate) inertia: Option<SpatialInertia>,
    pub(crate) parent_joint: Option<JointId>,
    pub(crate) child_joints: Vec<JointId>,
}

impl RigidBody {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body_frame(&self) -> FrameId {
        self.body_frame
    }

    /// Inertia expressed in the body frame; `None` for the root.
    pub fn inertia(&self) -> Option<&SpatialInertia> {
        self.inertia.as_ref()
    }

    pub fn parent_joint(&self) -> Option<JointId> {
        self.parent_joint
    }

    pub fn child_joints(&self) -> &[JointId] {
        &self.child_joints
    }

    pub fn is_root(&self) -> bool {
        self.parent_joint.is_none()
    }

    pub fn mass(&self) -> f64 {
        self.inertia.map_or(0.0, |i| i.mass())
    }
}
