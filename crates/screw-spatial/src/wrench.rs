//! Spatial force acting on a body.

use screw_frames::{FrameError, FrameId, FramePoint, FrameTree, FrameVector, Result};
use screw_math::{Vec3, Vec6, join6, split6};

/// Torque and force acting on `body_frame`, expressed in `expressed_in_frame`.
///
/// The torque is taken about the origin of the expressed-in frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wrench {
    body_frame: FrameId,
    expressed_in_frame: FrameId,
    /// Torque.
    pub angular: Vec3,
    /// Force.
    pub linear: Vec3,
}

impl Wrench {
    pub fn new(body_frame: FrameId, expressed_in_frame: FrameId, angular: Vec3, linear: Vec3) -> Self {
        Self {
            body_frame,
            expressed_in_frame,
            angular,
            linear,
        }
    }

    pub fn zero(body_frame: FrameId, expressed_in_frame: FrameId) -> Self {
        Self::new(body_frame, expressed_in_frame, Vec3::zeros(), Vec3::zeros())
    }

    pub fn from_vector(body_frame: FrameId, expressed_in_frame: FrameId, v: &Vec6) -> Self {
        let (angular, linear) = split6(v);
        Self::new(body_frame, expressed_in_frame, angular, linear)
    }

    /// A pure force applied at `point`; both must be expressed in the same frame.
    pub fn from_force_at_point(body_frame: FrameId, force: &FrameVector, point: &FramePoint) -> Result<Self> {
        point.check_frame("force at point", force.frame())?;
        Ok(Self::new(
            body_frame,
            force.frame(),
            point.position.cross(&force.vector),
            force.vector,
        ))
    }

    pub fn to_vector(&self) -> Vec6 {
        join6(&self.angular, &self.linear)
    }

    pub fn body_frame(&self) -> FrameId {
        self.body_frame
    }

    pub fn expressed_in_frame(&self) -> FrameId {
        self.expressed_in_frame
    }

    pub fn check_expressed_in(&self, operation: &'static str, frame: FrameId) -> Result<()> {
        FrameError::check(operation, frame, self.expressed_in_frame)
    }

    fn check_compatible(&self, operation: &'static str, other: &Wrench) -> Result<()> {
        FrameError::check(operation, self.body_frame, other.body_frame)?;
        self.check_expressed_in(operation, other.expressed_in_frame)
    }

    pub fn add(&mut self, other: &Wrench) -> Result<()> {
        self.check_compatible("wrench addition", other)?;
        self.angular += other.angular;
        self.linear += other.linear;
        Ok(())
    }

    pub fn sub(&mut self, other: &Wrench) -> Result<()> {
        self.check_compatible("wrench subtraction", other)?;
        self.angular -= other.angular;
        self.linear -= other.linear;
        Ok(())
    }

    pub fn scale(&mut self, s: f64) {
        self.angular *= s;
        self.linear *= s;
    }

    pub fn negate(&mut self) {
        self.scale(-1.0);
    }

    /// Re-express in `frame`, moving the torque reference point to its origin.
    pub fn change_frame(&mut self, frames: &FrameTree, frame: FrameId) -> Result<()> {
        if frame == self.expressed_in_frame {
            return Ok(());
        }
        let xf = frames.transform_to_desired_frame(self.expressed_in_frame, frame)?;
        (self.angular, self.linear) = xf.apply_force(&self.angular, &self.linear);
        self.expressed_in_frame = frame;
        Ok(())
    }

    pub fn changed_frame(mut self, frames: &FrameTree, frame: FrameId) -> Result<Self> {
        self.change_frame(frames, frame)?;
        Ok(self)
    }

    /// Reinterpret as acting on another body, as when a joint transmits the
    /// wrench from its successor to its predecessor.
    pub fn set_body_frame(&mut self, frame: FrameId) {
        self.body_frame = frame;
    }

    /// Checked overwrite: copies `other` only if its tags equal `self`'s.
    pub fn check_and_set(&mut self, other: &Wrench) -> Result<()> {
        self.check_compatible("wrench assignment", other)?;
        *self = *other;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use screw_math::RigidTransform;

    #[test]
    fn force_at_point_produces_moment() {
        let frames = FrameTree::new();
        let world = frames.world();
        let f = FrameVector::new(world, Vec3::new(0.0, 0.0, -10.0));
        let p = FramePoint::new(world, Vec3::new(1.0, 0.0, 0.0));
        let w = Wrench::from_force_at_point(world, &f, &p).unwrap();
        assert_relative_eq!(w.angular, Vec3::new(0.0, 10.0, 0.0));
        assert_relative_eq!(w.linear, f.vector);
    }

    #[test]
    fn change_frame_moves_moment_reference() {
        let mut frames = FrameTree::new();
        let world = frames.world();
        let shifted = frames
            .add_fixed_frame("shifted", world, RigidTransform::from_translation(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        // force applied at the shifted frame's origin has no moment there
        let w = Wrench::new(shifted, shifted, Vec3::zeros(), Vec3::new(0.0, 0.0, -10.0));
        let in_world = w.changed_frame(&frames, world).unwrap();
        assert_relative_eq!(in_world.angular, Vec3::new(0.0, 10.0, 0.0), epsilon = 1e-14);
        let back = in_world.changed_frame(&frames, shifted).unwrap();
        assert_relative_eq!(back.angular, Vec3::zeros(), epsilon = 1e-14);
    }

    #[test]
    fn mismatched_wrenches_are_rejected() {
        let mut frames = FrameTree::new();
        let world = frames.world();
        let body = frames
            .add_fixed_frame("body", world, RigidTransform::identity())
            .unwrap();
        let mut w = Wrench::zero(body, body);
        assert!(w.add(&Wrench::zero(world, body)).is_err());
        assert!(w.sub(&Wrench::zero(body, world)).is_err());
        assert!(w.check_and_set(&Wrench::zero(body, world)).is_err());
        assert!(w.add(&Wrench::new(body, body, Vec3::x(), Vec3::y())).is_ok());
        assert_relative_eq!(w.to_vector(), Vec6::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0));
        assert!(
            Wrench::from_force_at_point(body, &FrameVector::zero(world), &FramePoint::origin(body)).is_err()
        );
    }
}
