//! Linear velocity Jacobian of a body-fixed point.

use screw_frames::{FrameId, FramePoint, FrameVector};
use screw_math::{DMat, DVec, Vec3};
use screw_model::KinematicTree;

use crate::{DynamicsError, GeometricJacobian, Result};

/// 3×N map from path joint velocities to the velocity of a point fixed in
/// the end effector, relative to the base.
///
/// Column `k` is `v_k + ω_k × p` for the geometric Jacobian column
/// `[ω_k; v_k]`, with `p` the point in the Jacobian's frame.
#[derive(Debug, Clone)]
pub struct PointJacobian {
    frame: Option<FrameId>,
    matrix: DMat,
}

impl Default for PointJacobian {
    fn default() -> Self {
        Self::new()
    }
}

impl PointJacobian {
    pub fn new() -> Self {
        Self {
            frame: None,
            matrix: DMat::zeros(3, 0),
        }
    }

    /// `jacobian` must already be computed for the current configuration.
    pub fn compute(&mut self, tree: &KinematicTree, jacobian: &GeometricJacobian, point: &FramePoint) -> Result<()> {
        jacobian.check_current(tree)?;
        let frame = jacobian.expressed_in_frame();
        let p = point.changed_frame(tree.frames(), frame)?.position;
        let j = jacobian.matrix();
        let mut m = DMat::zeros(3, j.ncols());
        for k in 0..j.ncols() {
            let angular = Vec3::new(j[(0, k)], j[(1, k)], j[(2, k)]);
            let linear = Vec3::new(j[(3, k)], j[(4, k)], j[(5, k)]);
            m.set_column(k, &(linear + angular.cross(&p)));
        }
        self.matrix = m;
        self.frame = Some(frame);
        Ok(())
    }

    pub fn matrix(&self) -> &DMat {
        &self.matrix
    }

    /// Frame the rows are expressed in, once computed.
    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    /// Point velocity for the path joint velocities `qd`.
    pub fn compute_velocity(&self, qd: &DVec) -> Result<FrameVector> {
        let frame = self.frame.ok_or(DynamicsError::NotComputed { what: "point jacobian" })?;
        if qd.len() != self.matrix.ncols() {
            return Err(DynamicsError::DimensionMismatch {
                what: "point jacobian joint velocities",
                expected: self.matrix.ncols(),
                actual: qd.len(),
            });
        }
        let v = &self.matrix * qd;
        Ok(FrameVector::new(frame, Vec3::new(v[0], v[1], v[2])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TwistCalculator;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use screw_model::random::{random_chain, random_vector, set_random_configuration, set_random_velocities, RandomJoint};

    #[test]
    fn velocity_before_compute_fails() {
        let pj = PointJacobian::new();
        assert!(pj.compute_velocity(&DVec::zeros(0)).is_err());
    }

    #[test]
    fn uncomputed_jacobian_is_rejected() {
        let mut rng = StdRng::seed_from_u64(40);
        let mut tree = random_chain(&mut rng, &[RandomJoint::Revolute, RandomJoint::Revolute]).unwrap();
        set_random_configuration(&mut tree, &mut rng).unwrap();
        set_random_velocities(&mut tree, &mut rng).unwrap();
        tree.update_frames_recursively().unwrap();

        let end = tree.body_by_name("body1").unwrap();
        let end_frame = tree.body(end).unwrap().body_frame();
        let jac = GeometricJacobian::new(&tree, tree.root_body(), end, tree.world_frame()).unwrap();
        let mut pj = PointJacobian::new();
        let point = FramePoint::new(end_frame, random_vector(&mut rng, 1.0));
        assert_eq!(
            pj.compute(&tree, &jac, &point),
            Err(DynamicsError::NotComputed { what: "jacobian" })
        );
        assert!(pj.frame().is_none());
        assert!(matches!(
            pj.compute_velocity(&jac.joint_velocities(&tree).unwrap()),
            Err(DynamicsError::NotComputed { .. })
        ));
    }

    #[test]
    fn matches_twist_calculator_point_velocity() {
        let mut rng = StdRng::seed_from_u64(41);
        let kinds = [RandomJoint::Revolute, RandomJoint::Prismatic, RandomJoint::Revolute, RandomJoint::Revolute];
        let mut tree = random_chain(&mut rng, &kinds).unwrap();
        set_random_configuration(&mut tree, &mut rng).unwrap();
        set_random_velocities(&mut tree, &mut rng).unwrap();
        tree.update_frames_recursively().unwrap();

        let end = tree.body_by_name("body3").unwrap();
        let end_frame = tree.body(end).unwrap().body_frame();
        let world = tree.world_frame();
        let point = FramePoint::new(end_frame, random_vector(&mut rng, 1.0));

        let mut jac = GeometricJacobian::new(&tree, tree.root_body(), end, world).unwrap();
        jac.compute(&tree).unwrap();
        let mut pj = PointJacobian::new();
        pj.compute(&tree, &jac, &point).unwrap();
        assert_eq!(pj.matrix().shape(), (3, 4));
        let v = pj.compute_velocity(&jac.joint_velocities(&tree).unwrap()).unwrap();

        let mut twists = TwistCalculator::new(&tree);
        twists.compute(&tree).unwrap();
        let point_in_world = point.changed_frame(tree.frames(), world).unwrap();
        let expected = twists
            .linear_velocity_of_body_fixed_point(&tree, tree.root_body(), end, &point_in_world)
            .unwrap();
        assert_eq!(v.frame(), expected.frame());
        assert_relative_eq!(v.vector, expected.vector, epsilon = 1e-10);
    }
}
