//! The kinematic tree and its traversal utilities.

use std::fmt;

use screw_frames::{FrameError, FrameId, FrameTree};
use screw_math::DVec;

use crate::{Joint, Result, RigidBody, TreeError};

/// Handle to a body in a [`KinematicTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(usize);

/// Handle to a joint in a [`KinematicTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(usize);

impl BodyId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl JointId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint#{}", self.0)
    }
}

/// One joint on the path between two bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathJoint {
    pub joint: JointId,
    /// The joint is traversed from successor to predecessor, i.e. it lies
    /// between the base body and the common ancestor.
    pub reversed: bool,
}

/// Rigid bodies connected by joints, rooted at a fixed body.
#[derive(Debug, Clone)]
pub struct KinematicTree {
    pub(crate) frames: FrameTree,
    pub(crate) bodies: Vec<RigidBody>,
    pub(crate) joints: Vec<Joint>,
    pub(crate) root: BodyId,
    /// Joints ordered parent before child.
    pub(crate) order: Vec<JointId>,
    pub(crate) velocity_offsets: Vec<usize>,
    pub(crate) configuration_offsets: Vec<usize>,
    pub(crate) dof: usize,
    pub(crate) configuration_dof: usize,
    /// Joint generations at the last frame update; `None` before the first.
    pub(crate) updated_generations: Option<Vec<u64>>,
}

impl KinematicTree {
    pub fn frames(&self) -> &FrameTree {
        &self.frames
    }

    /// The inertial frame the root body is attached to.
    pub fn world_frame(&self) -> FrameId {
        self.frames.world()
    }

    pub fn root_body(&self) -> BodyId {
        self.root
    }

    pub fn root_frame(&self) -> FrameId {
        self.bodies[self.root.0].body_frame
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Total number of velocity coordinates.
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// Total number of configuration coordinates.
    pub fn configuration_dof(&self) -> usize {
        self.configuration_dof
    }

    pub fn body(&self, id: BodyId) -> Result<&RigidBody> {
        self.bodies.get(id.0).ok_or(TreeError::UnknownBody(id))
    }

    pub fn joint(&self, id: JointId) -> Result<&Joint> {
        self.joints.get(id.0).ok_or(TreeError::UnknownJoint(id))
    }

    /// Mutable joint access. Configuration writes mark the frames stale
    /// until the next [`update_frames_recursively`](Self::update_frames_recursively).
    pub fn joint_mut(&mut self, id: JointId) -> Result<&mut Joint> {
        self.joints.get_mut(id.0).ok_or(TreeError::UnknownJoint(id))
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &RigidBody)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    /// Joints in tree order (every joint after its predecessor's parent joint).
    pub fn joints_in_order(&self) -> impl Iterator<Item = (JointId, &Joint)> {
        self.order.iter().map(|&id| (id, &self.joints[id.0]))
    }

    pub fn joint_order(&self) -> &[JointId] {
        &self.order
    }

    pub fn body_by_name(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().position(|b| b.name == name).map(BodyId)
    }

    pub fn joint_by_name(&self, name: &str) -> Option<JointId> {
        self.joints.iter().position(|j| j.name == name).map(JointId)
    }

    /// Offset of a joint's first velocity coordinate in packed vectors.
    pub fn velocity_offset(&self, id: JointId) -> Result<usize> {
        self.velocity_offsets
            .get(id.0)
            .copied()
            .ok_or(TreeError::UnknownJoint(id))
    }

    pub fn configuration_offset(&self, id: JointId) -> Result<usize> {
        self.configuration_offsets
            .get(id.0)
            .copied()
            .ok_or(TreeError::UnknownJoint(id))
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(RigidBody::mass).sum()
    }

    /// Recompute every joint's frame-after transform from its configuration,
    /// parents before children.
    pub fn update_frames_recursively(&mut self) -> Result<()> {
        for &id in &self.order {
            let joint = &self.joints[id.0];
            self.frames
                .set_transform_to_parent(joint.frame_after, joint.joint_transform())?;
        }
        self.updated_generations = Some(self.joints.iter().map(|j| j.generation).collect());
        Ok(())
    }

    /// Sum of the joint configuration generations. Every configuration write
    /// increases it, so two equal values bracket an unchanged configuration.
    pub fn configuration_stamp(&self) -> u64 {
        self.joints.iter().map(|j| j.generation).sum()
    }

    /// Fail if frames were never updated or a configuration changed since.
    pub fn check_frames_current(&self) -> Result<()> {
        let Some(generations) = &self.updated_generations else {
            return match self.order.first() {
                Some(&id) => Err(FrameError::Uninitialized {
                    frame: self.frames.name(self.joints[id.0].frame_after)?.to_string(),
                }
                .into()),
                None => Ok(()),
            };
        };
        match self
            .joints
            .iter()
            .zip(generations)
            .find(|&(j, &g)| j.generation != g)
        {
            Some((joint, _)) => Err(TreeError::StaleFrames {
                joint: joint.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Joints from `body` up to the root, nearest first.
    pub fn ancestors(&self, body: BodyId) -> Result<Vec<JointId>> {
        let mut joints = Vec::new();
        let mut cur = self.body(body)?;
        while let Some(j) = cur.parent_joint {
            joints.push(j);
            cur = &self.bodies[self.joints[j.0].predecessor.0];
        }
        Ok(joints)
    }

    /// True if `ancestor` is `body` or lies on its path to the root.
    pub fn is_ancestor(&self, ancestor: BodyId, body: BodyId) -> Result<bool> {
        self.body(ancestor)?;
        if ancestor == body {
            return Ok(true);
        }
        Ok(self
            .ancestors(body)?
            .iter()
            .any(|&j| self.joints[j.0].predecessor == ancestor))
    }

    /// The unique joint path from `base` to `end`: joints between `base` and
    /// the common ancestor (reversed, ordered upward) followed by joints from
    /// the common ancestor down to `end`.
    pub fn joint_path(&self, base: BodyId, end: BodyId) -> Result<Vec<PathJoint>> {
        let mut up = self.ancestors(base)?;
        let mut down = self.ancestors(end)?;
        while let (Some(a), Some(b)) = (up.last(), down.last()) {
            if a != b {
                break;
            }
            up.pop();
            down.pop();
        }
        let reversed = up.into_iter().map(|joint| PathJoint {
            joint,
            reversed: true,
        });
        let forward = down.into_iter().rev().map(|joint| PathJoint {
            joint,
            reversed: false,
        });
        Ok(reversed.chain(forward).collect())
    }

    /// `body` and all its descendants, parents before children.
    pub fn subtree_bodies(&self, body: BodyId) -> Result<Vec<BodyId>> {
        let mut out = vec![body];
        let mut i = 0;
        self.body(body)?;
        while i < out.len() {
            for &j in &self.bodies[out[i].0].child_joints {
                out.push(self.joints[j.0].successor);
            }
            i += 1;
        }
        Ok(out)
    }

    fn pack(&self, len: usize, offsets: &[usize], get: impl Fn(&Joint) -> DVec) -> DVec {
        let mut out = DVec::zeros(len);
        for &id in &self.order {
            let values = get(&self.joints[id.0]);
            out.rows_mut(offsets[id.0], values.len()).copy_from(&values);
        }
        out
    }

    fn unpack(
        &mut self,
        what: &'static str,
        len: usize,
        configuration: bool,
        values: &DVec,
        mut set: impl FnMut(&mut Joint, &[f64]) -> Result<()>,
    ) -> Result<()> {
        if values.len() != len {
            return Err(TreeError::DimensionMismatch {
                what,
                expected: len,
                actual: values.len(),
            });
        }
        for &id in &self.order {
            let joint = &mut self.joints[id.0];
            let (offset, n) = if configuration {
                (self.configuration_offsets[id.0], joint.configuration_dof())
            } else {
                (self.velocity_offsets[id.0], joint.dof())
            };
            set(joint, &values.as_slice()[offset..offset + n])?;
        }
        Ok(())
    }

    pub fn configuration_vector(&self) -> DVec {
        self.pack(self.configuration_dof, &self.configuration_offsets, Joint::configuration)
    }

    pub fn set_configuration_vector(&mut self, q: &DVec) -> Result<()> {
        self.unpack("tree configuration", self.configuration_dof, true, q, Joint::set_configuration)
    }

    pub fn velocity_vector(&self) -> DVec {
        self.pack(self.dof, &self.velocity_offsets, Joint::velocity)
    }

    pub fn set_velocity_vector(&mut self, qd: &DVec) -> Result<()> {
        self.unpack("tree velocity", self.dof, false, qd, Joint::set_velocity)
    }

    pub fn desired_acceleration_vector(&self) -> DVec {
        self.pack(self.dof, &self.velocity_offsets, Joint::desired_acceleration_vector)
    }

    pub fn set_desired_acceleration_vector(&mut self, qdd: &DVec) -> Result<()> {
        self.unpack("tree desired acceleration", self.dof, false, qdd, Joint::set_desired_acceleration)
    }

    pub fn acceleration_vector(&self) -> DVec {
        self.pack(self.dof, &self.velocity_offsets, Joint::acceleration_vector)
    }

    pub fn set_acceleration_vector(&mut self, qdd: &DVec) -> Result<()> {
        self.unpack("tree acceleration", self.dof, false, qdd, Joint::set_acceleration)
    }

    pub fn torque_vector(&self) -> DVec {
        self.pack(self.dof, &self.velocity_offsets, Joint::torque)
    }

    pub fn set_torque_vector(&mut self, tau: &DVec) -> Result<()> {
        self.unpack("tree torque", self.dof, false, tau, Joint::set_torque)
    }

    /// Advance every joint by its velocity over `dt`. Frames become stale.
    pub fn integrate(&mut self, dt: f64) {
        for joint in &mut self.joints {
            joint.integrate(dt);
        }
    }

    /// Copy all joint states from a tree with the same structure.
    pub fn copy_state_from(&mut self, other: &KinematicTree) -> Result<()> {
        if other.joints.len() != self.joints.len() {
            return Err(TreeError::DimensionMismatch {
                what: "tree joints",
                expected: self.joints.len(),
                actual: other.joints.len(),
            });
        }
        for (mine, theirs) in self.joints.iter_mut().zip(&other.joints) {
            mine.copy_state_from(theirs)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JointKind, KinematicTreeBuilder};
    use approx::assert_relative_eq;
    use screw_math::{MassProperties, RigidTransform, Vec3};

    /// root ── j1 ── a ── j2 ── b
    ///                 └─ j3 ── c ── j4 (six-dof) ── d
    fn branching() -> KinematicTree {
        let mut builder = KinematicTreeBuilder::new("root");
        let root = builder.root();
        let mass = MassProperties::sphere(1.0, 0.1);
        let a = builder.add_body("a", mass);
        let b = builder.add_body("b", mass);
        let c = builder.add_body("c", mass);
        let d = builder.add_body("d", mass);
        let offset = RigidTransform::from_translation(Vec3::new(0.0, 0.0, 1.0));
        builder
            .add_joint("j1", root, a, JointKind::revolute(Vec3::z_axis()), offset)
            .unwrap();
        builder
            .add_joint("j2", a, b, JointKind::prismatic(Vec3::x_axis()), offset)
            .unwrap();
        builder
            .add_joint("j3", a, c, JointKind::revolute(Vec3::y_axis()), offset)
            .unwrap();
        builder
            .add_joint("j4", c, d, JointKind::six_dof(), offset)
            .unwrap();
        builder.build().unwrap()
    }

    fn id(tree: &KinematicTree, name: &str) -> JointId {
        tree.joint_by_name(name).unwrap()
    }

    #[test]
    fn dof_and_offsets() {
        let tree = branching();
        assert_eq!(tree.dof(), 9);
        assert_eq!(tree.configuration_dof(), 10);
        assert_eq!(tree.velocity_offset(id(&tree, "j4")).unwrap(), 3);
        assert_eq!(tree.configuration_offset(id(&tree, "j4")).unwrap(), 3);
        assert_relative_eq!(tree.total_mass(), 4.0);
    }

    #[test]
    fn joint_path_between_branches() {
        let tree = branching();
        let b = tree.body_by_name("b").unwrap();
        let d = tree.body_by_name("d").unwrap();
        let path = tree.joint_path(b, d).unwrap();
        let names: Vec<(&str, bool)> = path
            .iter()
            .map(|p| (tree.joint(p.joint).unwrap().name(), p.reversed))
            .collect();
        assert_eq!(names, vec![("j2", true), ("j3", false), ("j4", false)]);

        let root = tree.root_body();
        let down: Vec<bool> = tree.joint_path(root, d).unwrap().iter().map(|p| p.reversed).collect();
        assert_eq!(down, vec![false, false, false]);
        assert!(tree.joint_path(d, d).unwrap().is_empty());
    }

    #[test]
    fn ancestry_and_subtrees() {
        let tree = branching();
        let a = tree.body_by_name("a").unwrap();
        let b = tree.body_by_name("b").unwrap();
        let d = tree.body_by_name("d").unwrap();
        assert!(tree.is_ancestor(a, d).unwrap());
        assert!(!tree.is_ancestor(b, d).unwrap());
        assert_eq!(tree.subtree_bodies(a).unwrap().len(), 4);
        assert_eq!(tree.ancestors(d).unwrap().len(), 3);
    }

    #[test]
    fn frames_must_be_updated_before_use() {
        let mut tree = branching();
        assert!(matches!(
            tree.check_frames_current(),
            Err(TreeError::Frame(FrameError::Uninitialized { .. }))
        ));
        tree.update_frames_recursively().unwrap();
        tree.check_frames_current().unwrap();

        let j1 = id(&tree, "j1");
        tree.joint_mut(j1).unwrap().set_qd(1.0).unwrap();
        tree.check_frames_current().unwrap();

        tree.joint_mut(j1).unwrap().set_q(0.5).unwrap();
        assert_eq!(
            tree.check_frames_current(),
            Err(TreeError::StaleFrames { joint: "j1".into() })
        );
        tree.update_frames_recursively().unwrap();
        tree.check_frames_current().unwrap();
    }

    #[test]
    fn update_moves_body_frames() {
        let mut tree = branching();
        let j1 = id(&tree, "j1");
        tree.joint_mut(j1).unwrap().set_q(std::f64::consts::FRAC_PI_2).unwrap();
        tree.update_frames_recursively().unwrap();

        let b = tree.body_by_name("b").unwrap();
        let b_frame = tree.body(b).unwrap().body_frame();
        let xf = tree.frames().transform_to_root(b_frame).unwrap();
        // two unit offsets along z; rotation about z leaves them in place
        assert_relative_eq!(xf.translation, Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-14);
        assert_relative_eq!(xf.transform_vector(&Vec3::x()), Vec3::y(), epsilon = 1e-14);
    }

    #[test]
    fn packed_vectors_roundtrip() {
        let mut tree = branching();
        let qd = DVec::from_fn(9, |i, _| i as f64);
        tree.set_velocity_vector(&qd).unwrap();
        assert_eq!(tree.velocity_vector(), qd);
        assert!(tree.set_velocity_vector(&DVec::zeros(3)).is_err());

        let mut q = tree.configuration_vector();
        assert_eq!(q.len(), 10);
        // identity quaternion for the floating joint
        assert_eq!(q[3], 1.0);
        q[0] = 0.25;
        tree.set_configuration_vector(&q).unwrap();
        assert_eq!(tree.joint(id(&tree, "j1")).unwrap().q().unwrap(), 0.25);
    }

    #[test]
    fn integrate_and_copy_state() {
        let mut tree = branching();
        let mut other = tree.clone();
        tree.set_velocity_vector(&DVec::from_element(9, 1.0)).unwrap();
        tree.integrate(0.1);
        other.copy_state_from(&tree).unwrap();
        assert_eq!(other.configuration_vector(), tree.configuration_vector());
        assert_eq!(other.velocity_vector(), tree.velocity_vector());
    }
}
