//! Spatial acceleration of one frame relative to another.

use screw_frames::{FrameError, FrameId, FramePoint, FrameTree, FrameVector, Result};
use screw_math::{Vec3, Vec6, join6, split6};

use crate::Twist;

/// Time derivative of the twist of `body_frame` with respect to
/// `base_frame` taken while expressed in `base_frame`, then re-expressed in
/// `expressed_in_frame`.
///
/// With this definition a change of expressed-in frame is a plain motion
/// transform and chaining needs one velocity-product term, see
/// [`SpatialAcceleration::compose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialAcceleration {
    body_frame: FrameId,
    base_frame: FrameId,
    expressed_in_frame: FrameId,
    pub angular: Vec3,
    pub linear: Vec3,
}

impl SpatialAcceleration {
    pub fn new(
        body_frame: FrameId,
        base_frame: FrameId,
        expressed_in_frame: FrameId,
        angular: Vec3,
        linear: Vec3,
    ) -> Self {
        Self {
            body_frame,
            base_frame,
            expressed_in_frame,
            angular,
            linear,
        }
    }

    pub fn zero(body_frame: FrameId, base_frame: FrameId, expressed_in_frame: FrameId) -> Self {
        Self::new(body_frame, base_frame, expressed_in_frame, Vec3::zeros(), Vec3::zeros())
    }

    pub fn from_vector(
        body_frame: FrameId,
        base_frame: FrameId,
        expressed_in_frame: FrameId,
        v: &Vec6,
    ) -> Self {
        let (angular, linear) = split6(v);
        Self::new(body_frame, base_frame, expressed_in_frame, angular, linear)
    }

    /// Build the acceleration of `twist`'s body from the angular acceleration
    /// and the acceleration of the body origin, both in body coordinates.
    ///
    /// `twist` must be the body's twist expressed in the body frame. The
    /// linear part is `a_origin - ω × v`, since the origin acceleration
    /// includes the rotation of the velocity vector.
    pub fn from_origin_acceleration(
        twist: &Twist,
        angular_acceleration: &Vec3,
        origin_acceleration: &Vec3,
    ) -> Result<Self> {
        twist.check_expressed_in("acceleration from origin acceleration", twist.body_frame())?;
        Ok(Self::new(
            twist.body_frame(),
            twist.base_frame(),
            twist.body_frame(),
            *angular_acceleration,
            origin_acceleration - twist.angular.cross(&twist.linear),
        ))
    }

    pub fn to_vector(&self) -> Vec6 {
        join6(&self.angular, &self.linear)
    }

    pub fn body_frame(&self) -> FrameId {
        self.body_frame
    }

    pub fn base_frame(&self) -> FrameId {
        self.base_frame
    }

    pub fn expressed_in_frame(&self) -> FrameId {
        self.expressed_in_frame
    }

    pub fn check_expressed_in(&self, operation: &'static str, frame: FrameId) -> Result<()> {
        FrameError::check(operation, frame, self.expressed_in_frame)
    }

    fn check_tags(&self, operation: &'static str, twist: &Twist) -> Result<()> {
        FrameError::check(operation, self.body_frame, twist.body_frame())?;
        FrameError::check(operation, self.base_frame, twist.base_frame())?;
        self.check_expressed_in(operation, twist.expressed_in_frame())
    }

    /// Chain accelerations: a^{k,0} = a^{j,0} + a^{k,j} + T^{j,0} ×m T^{k,j}.
    ///
    /// `self` is a^{j,0}, `relative` is a^{k,j}; the twists must carry the
    /// same tags as the corresponding accelerations.
    pub fn compose(
        &self,
        relative: &SpatialAcceleration,
        twist: &Twist,
        relative_twist: &Twist,
    ) -> Result<SpatialAcceleration> {
        const OP: &str = "acceleration composition";
        self.check_expressed_in(OP, relative.expressed_in_frame)?;
        FrameError::check(OP, self.body_frame, relative.base_frame)?;
        self.check_tags(OP, twist)?;
        relative.check_tags(OP, relative_twist)?;

        let bias = twist.bias_acceleration(relative_twist)?;
        Ok(SpatialAcceleration::new(
            relative.body_frame,
            self.base_frame,
            self.expressed_in_frame,
            self.angular + relative.angular + bias.angular,
            self.linear + relative.linear + bias.linear,
        ))
    }

    pub fn scale(&mut self, s: f64) {
        self.angular *= s;
        self.linear *= s;
    }

    pub fn change_frame(&mut self, frames: &FrameTree, frame: FrameId) -> Result<()> {
        if frame == self.expressed_in_frame {
            return Ok(());
        }
        let xf = frames.transform_to_desired_frame(self.expressed_in_frame, frame)?;
        (self.angular, self.linear) = xf.apply_motion(&self.angular, &self.linear);
        self.expressed_in_frame = frame;
        Ok(())
    }

    pub fn changed_frame(mut self, frames: &FrameTree, frame: FrameId) -> Result<Self> {
        self.change_frame(frames, frame)?;
        Ok(self)
    }

    /// Retag the body; valid when `frame` is rigidly attached to the current body.
    pub fn change_body_frame_no_relative_motion(&mut self, frame: FrameId) {
        self.body_frame = frame;
    }

    /// Retag the base; valid when `frame` is rigidly attached to the current base.
    pub fn change_base_frame_no_relative_motion(&mut self, frame: FrameId) {
        self.base_frame = frame;
    }

    /// Acceleration of the body-fixed `point` relative to the base, in body
    /// coordinates. `twist` is the matching twist of the body.
    pub fn acceleration_of_point_fixed_in_body(
        &self,
        frames: &FrameTree,
        twist: &Twist,
        point: &FramePoint,
    ) -> Result<FrameVector> {
        const OP: &str = "point acceleration";
        FrameError::check(OP, self.body_frame, twist.body_frame())?;
        FrameError::check(OP, self.base_frame, twist.base_frame())?;
        let body = self.body_frame;
        let acc = self.changed_frame(frames, body)?;
        let twist = twist.changed_frame(frames, body)?;
        let r = point.changed_frame(frames, body)?.position;

        let point_velocity = twist.linear + twist.angular.cross(&r);
        Ok(FrameVector::new(
            body,
            acc.linear + acc.angular.cross(&r) + twist.angular.cross(&point_velocity),
        ))
    }
}
