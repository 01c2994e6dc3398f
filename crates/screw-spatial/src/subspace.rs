//! Joint motion subspaces.

use screw_frames::{FrameError, FrameId, FrameTree, Result};
use screw_math::{DMat, DVec, Vec6};

use crate::{SpatialAcceleration, Twist, Wrench};

/// Basis twists of `body_frame` relative to `base_frame`, stored as the
/// columns of a 6×n matrix expressed in `expressed_in_frame`.
///
/// A subspace with zero columns is valid and describes a rigid connection.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSubspace {
    body_frame: FrameId,
    base_frame: FrameId,
    expressed_in_frame: FrameId,
    columns: DMat,
}

impl MotionSubspace {
    pub fn new(body_frame: FrameId, base_frame: FrameId, expressed_in_frame: FrameId, columns: &[Vec6]) -> Self {
        let mut m = DMat::zeros(6, columns.len());
        for (k, c) in columns.iter().enumerate() {
            m.fixed_view_mut::<6, 1>(0, k).copy_from(c);
        }
        Self {
            body_frame,
            base_frame,
            expressed_in_frame,
            columns: m,
        }
    }

    /// Rigid connection: no columns.
    pub fn empty(body_frame: FrameId, base_frame: FrameId, expressed_in_frame: FrameId) -> Self {
        Self::new(body_frame, base_frame, expressed_in_frame, &[])
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

    pub fn dof(&self) -> usize {
        self.columns.ncols()
    }

    pub fn matrix(&self) -> &DMat {
        &self.columns
    }

    pub fn column(&self, k: usize) -> Option<Vec6> {
        (k < self.dof()).then(|| self.columns.fixed_view::<6, 1>(0, k).into_owned())
    }

    pub fn unit_twist(&self, k: usize) -> Option<Twist> {
        self.column(k)
            .map(|c| Twist::from_vector(self.body_frame, self.base_frame, self.expressed_in_frame, &c))
    }

    fn combine(&self, what: &'static str, coefficients: &[f64]) -> Result<Vec6> {
        if coefficients.len() != self.dof() {
            return Err(FrameError::DimensionMismatch {
                what,
                expected: self.dof(),
                actual: coefficients.len(),
            });
        }
        let mut v = Vec6::zeros();
        for (k, &c) in coefficients.iter().enumerate() {
            v += self.columns.fixed_view::<6, 1>(0, k) * c;
        }
        Ok(v)
    }

    /// Twist produced by the generalized velocity `qd`.
    pub fn twist(&self, qd: &[f64]) -> Result<Twist> {
        let v = self.combine("motion subspace velocity", qd)?;
        Ok(Twist::from_vector(self.body_frame, self.base_frame, self.expressed_in_frame, &v))
    }

    /// Acceleration `S qdd`, exact when the subspace is constant in the body frame.
    pub fn acceleration(&self, qdd: &[f64]) -> Result<SpatialAcceleration> {
        let v = self.combine("motion subspace acceleration", qdd)?;
        Ok(SpatialAcceleration::from_vector(
            self.body_frame,
            self.base_frame,
            self.expressed_in_frame,
            &v,
        ))
    }

    /// Generalized force `Sᵀ W`. Empty for a rigid connection.
    ///
    /// The wrench must act on the subspace's body frame and be expressed in
    /// the same frame as the columns.
    pub fn project(&self, wrench: &Wrench) -> Result<DVec> {
        FrameError::check("motion subspace projection body", self.body_frame, wrench.body_frame())?;
        wrench.check_expressed_in("motion subspace projection", self.expressed_in_frame)?;
        Ok(self.columns.tr_mul(&DVec::from_column_slice(wrench.to_vector().as_slice())))
    }

    pub fn change_frame(&mut self, frames: &FrameTree, frame: FrameId) -> Result<()> {
        if frame == self.expressed_in_frame {
            return Ok(());
        }
        let xf = frames.transform_to_desired_frame(self.expressed_in_frame, frame)?;
        let ad = xf.motion_matrix();
        for k in 0..self.dof() {
            let c: Vec6 = ad * self.columns.fixed_view::<6, 1>(0, k);
            self.columns.fixed_view_mut::<6, 1>(0, k).copy_from(&c);
        }
        self.expressed_in_frame = frame;
        Ok(())
    }

    pub fn changed_frame(mut self, frames: &FrameTree, frame: FrameId) -> Result<Self> {
        self.change_frame(frames, frame)?;
        Ok(self)
    }

    pub fn change_body_frame_no_relative_motion(&mut self, frame: FrameId) {
        self.body_frame = frame;
    }

    pub fn change_base_frame_no_relative_motion(&mut self, frame: FrameId) {
        self.base_frame = frame;
    }

    pub fn check_expressed_in(&self, operation: &'static str, frame: FrameId) -> Result<()> {
        FrameError::check(operation, frame, self.expressed_in_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use screw_math::{RigidTransform, Vec3};

    #[test]
    fn twist_and_projection_are_dual() {
        let mut frames = FrameTree::new();
        let world = frames.world();
        let after = frames
            .add_fixed_frame("after", world, RigidTransform::rot_x(0.5))
            .unwrap();
        let s = MotionSubspace::new(
            after,
            world,
            after,
            &[Vec6::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0), Vec6::new(0.0, 0.0, 0.0, 1.0, 0.0, 0.0)],
        );
        let w = Wrench::new(after, after, Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        let tau = s.project(&w).unwrap();
        assert_relative_eq!(tau[0], 3.0);
        assert_relative_eq!(tau[1], 4.0);

        let qd = [0.7, -0.2];
        let power = s.twist(&qd).unwrap().dot(&Wrench::new(after, after, w.angular, w.linear)).unwrap();
        assert_relative_eq!(power, tau[0] * qd[0] + tau[1] * qd[1], epsilon = 1e-14);

        let in_world = s.changed_frame(&frames, world).unwrap();
        assert!(in_world.project(&w).is_err());
        let tau_world = in_world.project(&w.changed_frame(&frames, world).unwrap()).unwrap();
        assert_relative_eq!(tau_world, tau, epsilon = 1e-12);
    }

    #[test]
    fn empty_subspace_projects_to_nothing() {
        let frames = FrameTree::new();
        let world = frames.world();
        let s = MotionSubspace::empty(world, world, world);
        assert_eq!(s.dof(), 0);
        assert_eq!(s.project(&Wrench::zero(world, world)).unwrap().len(), 0);
        assert_eq!(s.twist(&[]).unwrap().to_vector(), Vec6::zeros());
        assert!(s.unit_twist(0).is_none());
    }

    #[test]
    fn wrong_coefficient_count_is_rejected() {
        let frames = FrameTree::new();
        let world = frames.world();
        let s = MotionSubspace::new(world, world, world, &[Vec6::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0)]);
        assert_eq!(
            s.twist(&[1.0, 2.0]).unwrap_err(),
            FrameError::DimensionMismatch {
                what: "motion subspace velocity",
                expected: 1,
                actual: 2,
            }
        );
        assert!(matches!(
            s.acceleration(&[]),
            Err(FrameError::DimensionMismatch { expected: 1, actual: 0, .. })
        ));
    }

    #[test]
    fn projection_requires_matching_body() {
        let mut frames = FrameTree::new();
        let world = frames.world();
        let after = frames
            .add_fixed_frame("after", world, RigidTransform::identity())
            .unwrap();
        let other = frames
            .add_fixed_frame("other", world, RigidTransform::identity())
            .unwrap();
        let s = MotionSubspace::new(after, world, after, &[Vec6::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0)]);
        let mut w = Wrench::new(other, after, Vec3::new(0.0, 0.0, 2.0), Vec3::zeros());
        assert!(matches!(s.project(&w), Err(FrameError::Mismatch { .. })));
        w.set_body_frame(after);
        assert_relative_eq!(s.project(&w).unwrap()[0], 2.0);
    }
}
