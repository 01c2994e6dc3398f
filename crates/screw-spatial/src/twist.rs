//! Spatial velocity of one frame relative to another.

use screw_frames::{FrameError, FrameId, FramePoint, FrameTree, FrameVector, Result};
use screw_math::{Vec3, Vec6, join6, split6};

use crate::{SpatialAcceleration, Wrench, cross_motion};

/// Velocity of `body_frame` relative to `base_frame`, expressed in
/// `expressed_in_frame`.
///
/// The linear part is the velocity of the body-fixed point that coincides
/// with the origin of the expressed-in frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    body_frame: FrameId,
    base_frame: FrameId,
    expressed_in_frame: FrameId,
    pub angular: Vec3,
    pub linear: Vec3,
}

impl Twist {
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

    /// Twist of a screw motion with unit `axis` through `point` and the given
    /// `pitch`, scaled by `rate`. All quantities are in `expressed_in_frame`.
    pub fn from_screw(
        body_frame: FrameId,
        base_frame: FrameId,
        expressed_in_frame: FrameId,
        axis: &Vec3,
        point: &Vec3,
        pitch: f64,
        rate: f64,
    ) -> Self {
        let angular = axis * rate;
        let linear = point.cross(&angular) + axis * (pitch * rate);
        Self::new(body_frame, base_frame, expressed_in_frame, angular, linear)
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

    /// Fail unless `other` has exactly the same frame tags.
    pub fn check_frames_match(&self, operation: &'static str, other: &Twist) -> Result<()> {
        FrameError::check(operation, self.body_frame, other.body_frame)?;
        FrameError::check(operation, self.base_frame, other.base_frame)?;
        FrameError::check(operation, self.expressed_in_frame, other.expressed_in_frame)
    }

    /// Chain `other` onto `self`: T^{k,0} = T^{j,0} + T^{k,j}.
    ///
    /// Requires `self.body_frame == other.base_frame`; the result's body is
    /// `other.body_frame`.
    pub fn add(&mut self, other: &Twist) -> Result<()> {
        self.check_expressed_in("twist addition", other.expressed_in_frame)?;
        FrameError::check("twist addition", self.body_frame, other.base_frame)?;
        self.angular += other.angular;
        self.linear += other.linear;
        self.body_frame = other.body_frame;
        Ok(())
    }

    /// Difference of two twists sharing a base (T^{A,W} - T^{B,W} = T^{A,B})
    /// or sharing a body (T^{A,W} - T^{A,B} = T^{B,W}).
    pub fn sub(&mut self, other: &Twist) -> Result<()> {
        self.check_expressed_in("twist subtraction", other.expressed_in_frame)?;
        if self.base_frame == other.base_frame {
            self.base_frame = other.body_frame;
        } else if self.body_frame == other.body_frame {
            self.body_frame = other.base_frame;
        } else {
            return Err(FrameError::Mismatch {
                operation: "twist subtraction",
                expected: self.base_frame,
                actual: other.base_frame,
            });
        }
        self.angular -= other.angular;
        self.linear -= other.linear;
        Ok(())
    }

    pub fn scale(&mut self, s: f64) {
        self.angular *= s;
        self.linear *= s;
    }

    /// Re-express in `frame`.
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

    /// Instantaneous power delivered by `wrench` acting on this motion.
    pub fn dot(&self, wrench: &Wrench) -> Result<f64> {
        FrameError::check("twist-wrench power", self.body_frame, wrench.body_frame())?;
        self.check_expressed_in("twist-wrench power", wrench.expressed_in_frame())?;
        Ok(self.angular.dot(&wrench.angular) + self.linear.dot(&wrench.linear))
    }

    /// Velocity of a point rigidly attached to the body, relative to the
    /// base, in this twist's expressed-in frame. The point must already be
    /// expressed there.
    pub fn linear_velocity_of_point_fixed_in_body(&self, point: &FramePoint) -> Result<FrameVector> {
        point.check_frame("point velocity", self.expressed_in_frame)?;
        Ok(FrameVector::new(
            self.expressed_in_frame,
            self.linear + self.angular.cross(&point.position),
        ))
    }

    pub fn angular_velocity_in_base_frame(&self, frames: &FrameTree) -> Result<FrameVector> {
        FrameVector::new(self.expressed_in_frame, self.angular).changed_frame(frames, self.base_frame)
    }

    /// Velocity of the body frame's origin relative to the base, in the base frame.
    pub fn body_origin_velocity_in_base_frame(&self, frames: &FrameTree) -> Result<FrameVector> {
        let origin = FramePoint::origin(self.body_frame).changed_frame(frames, self.expressed_in_frame)?;
        self.linear_velocity_of_point_fixed_in_body(&origin)?
            .changed_frame(frames, self.base_frame)
    }

    /// Velocity-product term `self ×m relative` arising when `relative` is
    /// chained onto `self`, tagged like the chained acceleration.
    pub fn bias_acceleration(&self, relative: &Twist) -> Result<SpatialAcceleration> {
        self.check_expressed_in("twist bias acceleration", relative.expressed_in_frame)?;
        FrameError::check("twist bias acceleration", self.body_frame, relative.base_frame)?;
        let (angular, linear) = cross_motion(
            (&self.angular, &self.linear),
            (&relative.angular, &relative.linear),
        );
        Ok(SpatialAcceleration::new(
            relative.body_frame,
            self.base_frame,
            self.expressed_in_frame,
            angular,
            linear,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use screw_math::RigidTransform;

    struct Frames {
        tree: FrameTree,
        world: FrameId,
        a: FrameId,
        b: FrameId,
        c: FrameId,
    }

    fn frames() -> Frames {
        let mut tree = FrameTree::new();
        let world = tree.world();
        let a = tree
            .add_fixed_frame(
                "a",
                world,
                RigidTransform::rot_x(0.4).compose(&RigidTransform::from_translation(Vec3::new(1.0, 2.0, 3.0))),
            )
            .unwrap();
        let b = tree
            .add_fixed_frame("b", a, RigidTransform::rot_z(-1.2))
            .unwrap();
        let c = tree
            .add_fixed_frame("c", world, RigidTransform::from_translation(Vec3::new(0.0, -1.0, 0.5)))
            .unwrap();
        Frames { tree, world, a, b, c }
    }

    #[test]
    fn add_chains_body_onto_base() {
        let f = frames();
        let mut t = Twist::new(f.a, f.world, f.c, Vec3::x(), Vec3::y());
        let rel = Twist::new(f.b, f.a, f.c, Vec3::z(), Vec3::x());
        t.add(&rel).unwrap();
        assert_eq!(t.body_frame(), f.b);
        assert_eq!(t.base_frame(), f.world);
        assert_relative_eq!(t.angular, Vec3::new(1.0, 0.0, 1.0));
        assert_relative_eq!(t.linear, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn add_rejects_broken_chain() {
        let f = frames();
        let mut t = Twist::new(f.a, f.world, f.c, Vec3::x(), Vec3::y());
        let snapshot = t;
        let wrong_base = Twist::new(f.b, f.c, f.c, Vec3::z(), Vec3::x());
        let wrong_expr = Twist::new(f.b, f.a, f.b, Vec3::z(), Vec3::x());
        assert!(matches!(t.add(&wrong_base), Err(FrameError::Mismatch { .. })));
        assert!(matches!(t.add(&wrong_expr), Err(FrameError::Mismatch { .. })));
        assert_eq!(t, snapshot);
    }

    #[test]
    fn sub_with_common_base_or_body() {
        let f = frames();
        let mut t1 = Twist::new(f.b, f.world, f.c, Vec3::x(), Vec3::zeros());
        let t2 = Twist::new(f.a, f.world, f.c, Vec3::y(), Vec3::zeros());
        t1.sub(&t2).unwrap();
        assert_eq!((t1.body_frame(), t1.base_frame()), (f.b, f.a));

        let mut t3 = Twist::new(f.b, f.world, f.c, Vec3::x(), Vec3::zeros());
        let t4 = Twist::new(f.b, f.a, f.c, Vec3::y(), Vec3::zeros());
        t3.sub(&t4).unwrap();
        assert_eq!((t3.body_frame(), t3.base_frame()), (f.a, f.world));

        let mut t5 = Twist::new(f.b, f.world, f.c, Vec3::x(), Vec3::zeros());
        let unrelated = Twist::new(f.a, f.c, f.c, Vec3::y(), Vec3::zeros());
        assert!(t5.sub(&unrelated).is_err());
    }

    #[test]
    fn change_frame_preserves_point_velocities() {
        let f = frames();
        let t = Twist::new(f.b, f.world, f.a, Vec3::new(0.1, -0.3, 0.7), Vec3::new(1.0, 0.5, -0.2));
        let p = FramePoint::new(f.a, Vec3::new(0.3, 0.0, -1.0));
        let v_a = t.linear_velocity_of_point_fixed_in_body(&p).unwrap();

        let t_c = t.changed_frame(&f.tree, f.c).unwrap();
        let p_c = p.changed_frame(&f.tree, f.c).unwrap();
        let v_c = t_c.linear_velocity_of_point_fixed_in_body(&p_c).unwrap();

        let v_a_in_c = v_a.changed_frame(&f.tree, f.c).unwrap();
        assert_relative_eq!(v_c.vector, v_a_in_c.vector, epsilon = 1e-12);
        assert_eq!(t_c.expressed_in_frame(), f.c);
    }

    #[test]
    fn point_velocity_requires_matching_frame() {
        let f = frames();
        let t = Twist::zero(f.b, f.world, f.a);
        assert!(t
            .linear_velocity_of_point_fixed_in_body(&FramePoint::origin(f.c))
            .is_err());
    }

    #[test]
    fn dot_checks_body_and_expressed_frame() {
        let f = frames();
        let t = Twist::new(f.a, f.world, f.a, Vec3::x(), Vec3::y());
        let w = Wrench::new(f.a, f.a, Vec3::x() * 2.0, Vec3::y() * 3.0);
        assert_relative_eq!(t.dot(&w).unwrap(), 5.0);

        let other_body = Wrench::new(f.b, f.a, Vec3::x(), Vec3::y());
        let other_frame = Wrench::new(f.a, f.b, Vec3::x(), Vec3::y());
        assert!(t.dot(&other_body).is_err());
        assert!(t.dot(&other_frame).is_err());
    }

    #[test]
    fn screw_twist_has_expected_pitch() {
        let f = frames();
        let axis = Vec3::z();
        let t = Twist::from_screw(f.a, f.world, f.world, &axis, &Vec3::new(1.0, 0.0, 0.0), 0.5, 2.0);
        // point on the axis only translates along the axis
        let on_axis = FramePoint::new(f.world, Vec3::new(1.0, 0.0, 7.0));
        let v = t.linear_velocity_of_point_fixed_in_body(&on_axis).unwrap();
        assert_relative_eq!(v.vector, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-14);
    }

    #[test]
    fn body_origin_velocity_for_pure_rotation() {
        let f = frames();
        // spin about world z through world origin; c sits at (0, -1, 0.5)
        let t = Twist::new(f.c, f.world, f.world, Vec3::z(), Vec3::zeros());
        let v = t.body_origin_velocity_in_base_frame(&f.tree).unwrap();
        assert_eq!(v.frame(), f.world);
        assert_relative_eq!(v.vector, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-14);
        let w = t.angular_velocity_in_base_frame(&f.tree).unwrap();
        assert_relative_eq!(w.vector, Vec3::z());
    }
}
