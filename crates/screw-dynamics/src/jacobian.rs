//! Geometric Jacobian between two bodies.

use screw_frames::{FrameError, FrameId};
use screw_math::{DMat, DVec, Vec6};
use screw_model::{BodyId, JointId, KinematicTree, PathJoint};
use screw_spatial::Twist;
use tracing::debug;

use crate::{DynamicsError, Result};

/// Maps the velocities of the joints on the path from `base` to
/// `end_effector` to the twist of the end effector relative to the base.
///
/// Column block `k` is the motion subspace of the `k`-th path joint
/// expressed in `expressed_in`, negated for joints traversed against their
/// parent-to-child direction (those between the base and the common
/// ancestor).
#[derive(Debug, Clone)]
pub struct GeometricJacobian {
    base: BodyId,
    end_effector: BodyId,
    base_frame: FrameId,
    end_effector_frame: FrameId,
    expressed_in: FrameId,
    path: Vec<PathJoint>,
    matrix: DMat,
    /// Configuration stamp of the tree at the last `compute`.
    computed_at: Option<u64>,
}

impl GeometricJacobian {
    pub fn new(tree: &KinematicTree, base: BodyId, end_effector: BodyId, expressed_in: FrameId) -> Result<Self> {
        let base_frame = tree.body(base)?.body_frame();
        let end_effector_frame = tree.body(end_effector)?.body_frame();
        if !tree.frames().contains(expressed_in) {
            return Err(FrameError::UnknownFrame(expressed_in).into());
        }
        let path = tree.joint_path(base, end_effector)?;
        let columns = path
            .iter()
            .map(|p| tree.joint(p.joint).map(|j| j.dof()))
            .sum::<screw_model::Result<usize>>()?;
        debug!(
            base = %base,
            end_effector = %end_effector,
            joints = path.len(),
            columns,
            "geometric jacobian created"
        );
        Ok(Self {
            base,
            end_effector,
            base_frame,
            end_effector_frame,
            expressed_in,
            path,
            matrix: DMat::zeros(6, columns),
            computed_at: None,
        })
    }

    pub fn base(&self) -> BodyId {
        self.base
    }

    pub fn end_effector(&self) -> BodyId {
        self.end_effector
    }

    pub fn expressed_in_frame(&self) -> FrameId {
        self.expressed_in
    }

    /// Joints in column order.
    pub fn joints(&self) -> impl Iterator<Item = JointId> + '_ {
        self.path.iter().map(|p| p.joint)
    }

    pub fn path(&self) -> &[PathJoint] {
        &self.path
    }

    pub fn num_columns(&self) -> usize {
        self.matrix.ncols()
    }

    /// Rebuild the columns for the tree's current configuration.
    pub fn compute(&mut self, tree: &KinematicTree) -> Result<()> {
        tree.check_frames_current()?;
        let frames = tree.frames();
        let mut column = 0;
        for p in &self.path {
            let joint = tree.joint(p.joint)?;
            let subspace = joint.motion_subspace().changed_frame(frames, self.expressed_in)?;
            let sign = if p.reversed { -1.0 } else { 1.0 };
            let dof = subspace.dof();
            self.matrix
                .columns_mut(column, dof)
                .copy_from(&(subspace.matrix() * sign));
            column += dof;
        }
        self.computed_at = Some(tree.configuration_stamp());
        Ok(())
    }

    pub fn is_computed(&self) -> bool {
        self.computed_at.is_some()
    }

    /// Fail unless the matrix was computed for `tree`'s current
    /// configuration and the frames are up to date.
    pub fn check_current(&self, tree: &KinematicTree) -> Result<()> {
        let stamp = self.computed_at.ok_or(DynamicsError::NotComputed { what: "jacobian" })?;
        tree.check_frames_current()?;
        if stamp != tree.configuration_stamp() {
            return Err(DynamicsError::Outdated { what: "jacobian" });
        }
        Ok(())
    }

    /// The 6×N matrix; all zeros before the first `compute`.
    pub fn matrix(&self) -> &DMat {
        &self.matrix
    }

    /// Velocities of the path joints, stacked in column order.
    pub fn joint_velocities(&self, tree: &KinematicTree) -> Result<DVec> {
        let mut qd = DVec::zeros(self.num_columns());
        let mut row = 0;
        for p in &self.path {
            let v = tree.joint(p.joint)?.velocity();
            qd.rows_mut(row, v.len()).copy_from(&v);
            row += v.len();
        }
        Ok(qd)
    }

    /// Twist of the end effector relative to the base for the joint
    /// velocities `qd` (in column order).
    pub fn twist(&self, tree: &KinematicTree, qd: &DVec) -> Result<Twist> {
        self.check_current(tree)?;
        if qd.len() != self.num_columns() {
            return Err(DynamicsError::DimensionMismatch {
                what: "jacobian joint velocities",
                expected: self.num_columns(),
                actual: qd.len(),
            });
        }
        let v = &self.matrix * qd;
        Ok(Twist::from_vector(
            self.end_effector_frame,
            self.base_frame,
            self.expressed_in,
            &Vec6::from_column_slice(v.as_slice()),
        ))
    }

    /// [`twist`](Self::twist) with the tree's current joint velocities.
    pub fn compute_twist(&self, tree: &KinematicTree) -> Result<Twist> {
        self.twist(tree, &self.joint_velocities(tree)?)
    }
}
