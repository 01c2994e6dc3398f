//! Top-down twist propagation.

use screw_frames::{FramePoint, FrameVector};
use screw_model::{BodyId, KinematicTree};
use screw_spatial::Twist;
use tracing::trace;

use crate::{DynamicsError, Result};

/// Twist of every body relative to the world frame.
///
/// Body twists are stored expressed in the body's own frame. The root is
/// attached rigidly to the world, so its twist is zero; every other body
/// gets its parent's twist plus the twist across its parent joint.
#[derive(Debug, Clone)]
pub struct TwistCalculator {
    twists: Vec<Option<Twist>>,
}

impl TwistCalculator {
    pub fn new(tree: &KinematicTree) -> Self {
        Self {
            twists: vec![None; tree.num_bodies()],
        }
    }

    pub(crate) fn check_tree(&self, tree: &KinematicTree) -> Result<()> {
        if self.twists.len() != tree.num_bodies() {
            return Err(DynamicsError::TreeMismatch {
                what: "bodies",
                expected: self.twists.len(),
                actual: tree.num_bodies(),
            });
        }
        Ok(())
    }

    pub fn compute(&mut self, tree: &KinematicTree) -> Result<()> {
        self.check_tree(tree)?;
        tree.check_frames_current()?;
        let frames = tree.frames();

        self.twists.fill(None);
        let root_frame = tree.root_frame();
        self.twists[tree.root_body().index()] = Some(Twist::zero(root_frame, tree.world_frame(), root_frame));

        for (_, joint) in tree.joints_in_order() {
            let predecessor_frame = tree.body(joint.predecessor())?.body_frame();
            let successor_frame = tree.body(joint.successor())?.body_frame();

            let mut twist = self
                .stored(joint.predecessor())?
                .changed_frame(frames, successor_frame)?;

            let mut across = joint.joint_twist();
            across.change_base_frame_no_relative_motion(predecessor_frame);
            across.change_body_frame_no_relative_motion(successor_frame);
            across.change_frame(frames, successor_frame)?;

            twist.add(&across)?;
            self.twists[joint.successor().index()] = Some(twist);
        }
        trace!(bodies = self.twists.len(), "twists computed");
        Ok(())
    }

    fn stored(&self, body: BodyId) -> Result<Twist> {
        self.twists
            .get(body.index())
            .copied()
            .flatten()
            .ok_or(DynamicsError::NotComputed { what: "body twist" })
    }

    /// Twist of `body` relative to the world, in the body frame.
    pub fn twist_of_body(&self, body: BodyId) -> Result<Twist> {
        self.stored(body)
    }

    /// Twist of `body` relative to `base`, in `body`'s frame.
    pub fn relative_twist(&self, tree: &KinematicTree, base: BodyId, body: BodyId) -> Result<Twist> {
        let frame = tree.body(body)?.body_frame();
        let base_twist = self.stored(base)?.changed_frame(tree.frames(), frame)?;
        let mut twist = self.stored(body)?;
        twist.sub(&base_twist)?;
        Ok(twist)
    }

    /// Angular velocity of `body` relative to the world, in the body frame.
    pub fn angular_velocity_of_body(&self, body: BodyId) -> Result<FrameVector> {
        let twist = self.stored(body)?;
        Ok(FrameVector::new(twist.expressed_in_frame(), twist.angular))
    }

    pub fn relative_angular_velocity(&self, tree: &KinematicTree, base: BodyId, body: BodyId) -> Result<FrameVector> {
        let twist = self.relative_twist(tree, base, body)?;
        Ok(FrameVector::new(twist.expressed_in_frame(), twist.angular))
    }

    /// Velocity of `point`, rigidly attached to `body`, relative to `base`.
    /// The result is expressed in the point's frame.
    pub fn linear_velocity_of_body_fixed_point(
        &self,
        tree: &KinematicTree,
        base: BodyId,
        body: BodyId,
        point: &FramePoint,
    ) -> Result<FrameVector> {
        let twist = self
            .relative_twist(tree, base, body)?
            .changed_frame(tree.frames(), point.frame())?;
        Ok(twist.linear_velocity_of_point_fixed_in_body(point)?)
    }
}
