//! Points and free vectors tagged with the frame they are expressed in.

use screw_math::Vec3;

use crate::{FrameError, FrameId, FrameTree, Result};

/// A point expressed in a particular frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePoint {
    frame: FrameId,
    pub position: Vec3,
}

/// A free vector expressed in a particular frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameVector {
    frame: FrameId,
    pub vector: Vec3,
}

impl FramePoint {
    pub fn new(frame: FrameId, position: Vec3) -> Self {
        Self { frame, position }
    }

    /// The frame's own origin.
    pub fn origin(frame: FrameId) -> Self {
        Self::new(frame, Vec3::zeros())
    }

    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn check_frame(&self, operation: &'static str, expected: FrameId) -> Result<()> {
        FrameError::check(operation, expected, self.frame)
    }

    pub fn change_frame(&mut self, frames: &FrameTree, frame: FrameId) -> Result<()> {
        if frame != self.frame {
            let xf = frames.transform_to_desired_frame(self.frame, frame)?;
            self.position = xf.transform_point(&self.position);
            self.frame = frame;
        }
        Ok(())
    }

    pub fn changed_frame(mut self, frames: &FrameTree, frame: FrameId) -> Result<Self> {
        self.change_frame(frames, frame)?;
        Ok(self)
    }

    /// Displacement `self - other`.
    pub fn sub(&self, other: &FramePoint) -> Result<FrameVector> {
        FrameError::check("point difference", self.frame, other.frame)?;
        Ok(FrameVector::new(self.frame, self.position - other.position))
    }

    pub fn translate(&mut self, offset: &FrameVector) -> Result<()> {
        FrameError::check("point translation", self.frame, offset.frame)?;
        self.position += offset.vector;
        Ok(())
    }

    pub fn distance(&self, other: &FramePoint) -> Result<f64> {
        Ok(self.sub(other)?.vector.norm())
    }
}

impl FrameVector {
    pub fn new(frame: FrameId, vector: Vec3) -> Self {
        Self { frame, vector }
    }

    pub fn zero(frame: FrameId) -> Self {
        Self::new(frame, Vec3::zeros())
    }

    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn check_frame(&self, operation: &'static str, expected: FrameId) -> Result<()> {
        FrameError::check(operation, expected, self.frame)
    }

    /// Rotate into `frame`; translation does not affect free vectors.
    pub fn change_frame(&mut self, frames: &FrameTree, frame: FrameId) -> Result<()> {
        if frame != self.frame {
            let xf = frames.transform_to_desired_frame(self.frame, frame)?;
            self.vector = xf.transform_vector(&self.vector);
            self.frame = frame;
        }
        Ok(())
    }

    pub fn changed_frame(mut self, frames: &FrameTree, frame: FrameId) -> Result<Self> {
        self.change_frame(frames, frame)?;
        Ok(self)
    }

    pub fn add(&mut self, other: &FrameVector) -> Result<()> {
        FrameError::check("vector addition", self.frame, other.frame)?;
        self.vector += other.vector;
        Ok(())
    }

    pub fn sub(&mut self, other: &FrameVector) -> Result<()> {
        FrameError::check("vector subtraction", self.frame, other.frame)?;
        self.vector -= other.vector;
        Ok(())
    }

    pub fn dot(&self, other: &FrameVector) -> Result<f64> {
        FrameError::check("vector dot product", self.frame, other.frame)?;
        Ok(self.vector.dot(&other.vector))
    }

    pub fn cross(&self, other: &FrameVector) -> Result<FrameVector> {
        FrameError::check("vector cross product", self.frame, other.frame)?;
        Ok(FrameVector::new(self.frame, self.vector.cross(&other.vector)))
    }

    pub fn scale(&mut self, s: f64) {
        self.vector *= s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use screw_math::RigidTransform;

    #[test]
    fn point_and_vector_change_frame_differently() {
        let mut frames = FrameTree::new();
        let world = frames.world();
        let body = frames
            .add_fixed_frame(
                "body",
                world,
                RigidTransform::new(
                    RigidTransform::rot_z(std::f64::consts::FRAC_PI_2).rotation,
                    Vec3::new(1.0, 2.0, 3.0),
                ),
            )
            .unwrap();

        let p = FramePoint::new(body, Vec3::x()).changed_frame(&frames, world).unwrap();
        let v = FrameVector::new(body, Vec3::x()).changed_frame(&frames, world).unwrap();
        assert_relative_eq!(p.position, Vec3::new(1.0, 3.0, 3.0), epsilon = 1e-14);
        assert_relative_eq!(v.vector, Vec3::y(), epsilon = 1e-14);
        assert_eq!(p.frame(), world);

        let back = p.changed_frame(&frames, body).unwrap();
        assert_relative_eq!(back.position, Vec3::x(), epsilon = 1e-14);
    }

    #[test]
    fn mismatched_frames_are_rejected() {
        let mut frames = FrameTree::new();
        let world = frames.world();
        let other = frames
            .add_fixed_frame("other", world, RigidTransform::identity())
            .unwrap();

        let mut a = FrameVector::new(world, Vec3::x());
        let b = FrameVector::new(other, Vec3::y());
        assert!(matches!(a.add(&b), Err(FrameError::Mismatch { .. })));
        assert!(a.dot(&b).is_err());
        assert!(a.cross(&b).is_err());
        assert!(
            FramePoint::origin(world)
                .sub(&FramePoint::origin(other))
                .is_err()
        );
        // failed add leaves the operand untouched
        assert_eq!(a.vector, Vec3::x());
    }

    #[test]
    fn point_arithmetic() {
        let frames = FrameTree::new();
        let world = frames.world();
        let mut p = FramePoint::new(world, Vec3::new(1.0, 1.0, 0.0));
        p.translate(&FrameVector::new(world, Vec3::new(0.0, 0.0, 2.0)))
            .unwrap();
        let d = p.distance(&FramePoint::origin(world)).unwrap();
        assert_relative_eq!(d, 6.0_f64.sqrt(), epsilon = 1e-14);
    }
}
