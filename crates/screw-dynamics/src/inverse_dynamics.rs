//! Recursive Newton-Euler inverse dynamics.
//!
//! Forward pass (root to leaves): body accelerations relative to the world
//! from the desired joint accelerations, including velocity-product terms.
//!
//! Backward pass (leaves to root): the wrench each joint must transmit to
//! its successor is the successor's Newton-Euler wrench, minus gravity and
//! external wrenches, plus the wrenches passed on to its own children.
//! Projecting that wrench onto the joint motion subspace gives the joint
//! torque.

use screw_frames::{FrameError, FrameVector};
use screw_math::DVec;
use screw_model::{BodyId, JointId, KinematicTree};
use screw_spatial::{SpatialAcceleration, Twist, Wrench};
use tracing::{debug, trace};

use crate::{DynamicsConfig, DynamicsError, Result, TwistCalculator};

#[derive(Debug, Clone)]
pub struct InverseDynamicsCalculator {
    config: DynamicsConfig,
    twist_calculator: TwistCalculator,
    /// Staged by body; any expressed-in frame.
    external_wrenches: Vec<Option<Wrench>>,
    /// Body accelerations relative to the world, in body frames.
    accelerations: Vec<Option<SpatialAcceleration>>,
    /// Wrench transmitted by each joint to its successor, in the successor frame.
    joint_wrenches: Vec<Option<Wrench>>,
    torques: Vec<DVec>,
    root_wrench: Option<Wrench>,
}

impl InverseDynamicsCalculator {
    pub fn new(tree: &KinematicTree, config: DynamicsConfig) -> Self {
        debug!(
            bodies = tree.num_bodies(),
            dof = tree.dof(),
            gravity = ?config.gravity,
            "inverse dynamics calculator created"
        );
        Self {
            config,
            twist_calculator: TwistCalculator::new(tree),
            external_wrenches: vec![None; tree.num_bodies()],
            accelerations: vec![None; tree.num_bodies()],
            joint_wrenches: vec![None; tree.num_joints()],
            torques: vec![DVec::zeros(0); tree.num_joints()],
            root_wrench: None,
        }
    }

    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    pub fn twist_calculator(&self) -> &TwistCalculator {
        &self.twist_calculator
    }

    fn check_tree(&self, tree: &KinematicTree) -> Result<()> {
        self.twist_calculator.check_tree(tree)?;
        if self.joint_wrenches.len() != tree.num_joints() {
            return Err(DynamicsError::TreeMismatch {
                what: "joints",
                expected: self.joint_wrenches.len(),
                actual: tree.num_joints(),
            });
        }
        Ok(())
    }

    /// Stage an external wrench acting on `body`. The wrench must be tagged
    /// with the body's frame; it may be expressed in any frame.
    pub fn set_external_wrench(&mut self, tree: &KinematicTree, body: BodyId, wrench: Wrench) -> Result<()> {
        self.check_tree(tree)?;
        let frame = tree.body(body)?.body_frame();
        FrameError::check("external wrench", frame, wrench.body_frame())?;
        self.external_wrenches[body.index()] = Some(wrench);
        Ok(())
    }

    /// Staged external wrench on `body`, zero if none.
    pub fn external_wrench(&self, tree: &KinematicTree, body: BodyId) -> Result<Wrench> {
        let frame = tree.body(body)?.body_frame();
        Ok(self
            .external_wrenches
            .get(body.index())
            .copied()
            .flatten()
            .unwrap_or_else(|| Wrench::zero(frame, frame)))
    }

    /// Clear all staged external wrenches.
    pub fn reset(&mut self) {
        self.external_wrenches.fill(None);
    }

    /// Run inverse dynamics with the joints' desired accelerations.
    pub fn compute(&mut self, tree: &KinematicTree) -> Result<()> {
        self.run(tree, None)
    }

    /// Run inverse dynamics with the packed joint accelerations `qdd`.
    pub fn compute_with_accelerations(&mut self, tree: &KinematicTree, qdd: &DVec) -> Result<()> {
        if qdd.len() != tree.dof() {
            return Err(DynamicsError::DimensionMismatch {
                what: "joint accelerations",
                expected: tree.dof(),
                actual: qdd.len(),
            });
        }
        self.run(tree, Some(qdd))
    }

    fn run(&mut self, tree: &KinematicTree, qdd: Option<&DVec>) -> Result<()> {
        self.check_tree(tree)?;
        self.twist_calculator.compute(tree)?;
        self.root_wrench = None;
        self.compute_accelerations(tree, qdd)?;
        self.compute_wrenches(tree)?;
        trace!(joints = tree.num_joints(), "inverse dynamics computed");
        Ok(())
    }

    fn compute_accelerations(&mut self, tree: &KinematicTree, qdd: Option<&DVec>) -> Result<()> {
        let frames = tree.frames();
        let world = tree.world_frame();
        let root_frame = tree.root_frame();
        let velocity_terms = self.config.include_velocity_terms;

        self.accelerations.fill(None);
        self.accelerations[tree.root_body().index()] =
            Some(SpatialAcceleration::zero(root_frame, world, root_frame));

        for (id, joint) in tree.joints_in_order() {
            let predecessor = joint.predecessor();
            let predecessor_frame = tree.body(predecessor)?.body_frame();
            let successor_frame = tree.body(joint.successor())?.body_frame();

            let parent = self.accelerations[predecessor.index()]
                .ok_or(DynamicsError::NotComputed { what: "parent acceleration" })?
                .changed_frame(frames, successor_frame)?;

            let mut across = match qdd {
                Some(qdd) => {
                    let offset = tree.velocity_offset(id)?;
                    joint
                        .motion_subspace()
                        .acceleration(&qdd.as_slice()[offset..offset + joint.dof()])?
                }
                None => joint.desired_acceleration()?,
            };
            across.change_base_frame_no_relative_motion(predecessor_frame);
            across.change_body_frame_no_relative_motion(successor_frame);
            across.change_frame(frames, successor_frame)?;

            let (parent_twist, joint_twist) = if velocity_terms {
                let parent_twist = self
                    .twist_calculator
                    .twist_of_body(predecessor)?
                    .changed_frame(frames, successor_frame)?;
                let mut joint_twist = joint.joint_twist();
                joint_twist.change_base_frame_no_relative_motion(predecessor_frame);
                joint_twist.change_body_frame_no_relative_motion(successor_frame);
                joint_twist.change_frame(frames, successor_frame)?;
                (parent_twist, joint_twist)
            } else {
                (
                    Twist::zero(predecessor_frame, world, successor_frame),
                    Twist::zero(successor_frame, predecessor_frame, successor_frame),
                )
            };

            self.accelerations[joint.successor().index()] =
                Some(parent.compose(&across, &parent_twist, &joint_twist)?);
        }
        Ok(())
    }

    fn compute_wrenches(&mut self, tree: &KinematicTree) -> Result<()> {
        let frames = tree.frames();
        let gravity = FrameVector::new(tree.world_frame(), self.config.gravity);

        self.joint_wrenches.fill(None);
        for &id in tree.joint_order().iter().rev() {
            let joint = tree.joint(id)?;
            let successor = joint.successor();
            let body = tree.body(successor)?;
            let frame = body.body_frame();

            let mut wrench = match body.inertia() {
                Some(inertia) => {
                    let acceleration = self.accelerations[successor.index()]
                        .ok_or(DynamicsError::NotComputed { what: "body acceleration" })?;
                    let mut w = if self.config.include_velocity_terms {
                        let twist = self.twist_calculator.twist_of_body(successor)?;
                        inertia.newton_euler_wrench(&acceleration, &twist)?
                    } else {
                        inertia.inertial_wrench(&acceleration)?
                    };
                    w.sub(&inertia.gravity_wrench(frames, &gravity)?)?;
                    w
                }
                None => Wrench::zero(frame, frame),
            };

            if let Some(external) = self.external_wrenches[successor.index()] {
                wrench.sub(&external.changed_frame(frames, frame)?)?;
            }
            self.add_child_wrenches(tree, successor, &mut wrench)?;

            // frame-after is rigidly attached to the successor body
            let mut in_joint_frame = wrench.changed_frame(frames, joint.frame_after())?;
            in_joint_frame.set_body_frame(joint.frame_after());
            self.torques[id.index()] = joint.motion_subspace().project(&in_joint_frame)?;
            self.joint_wrenches[id.index()] = Some(wrench);
        }

        let root = tree.root_body();
        let root_frame = tree.root_frame();
        let mut root_wrench = Wrench::zero(root_frame, root_frame);
        self.add_child_wrenches(tree, root, &mut root_wrench)?;
        if let Some(external) = self.external_wrenches[root.index()] {
            root_wrench.sub(&external.changed_frame(frames, root_frame)?)?;
        }
        self.root_wrench = Some(root_wrench);
        Ok(())
    }

    /// Accumulate the wrenches `body` transmits to its children into
    /// `wrench`, which must be tagged with and expressed in `body`'s frame.
    fn add_child_wrenches(&self, tree: &KinematicTree, body: BodyId, wrench: &mut Wrench) -> Result<()> {
        let frames = tree.frames();
        let frame = wrench.expressed_in_frame();
        for &child in tree.body(body)?.child_joints() {
            let mut w = self.joint_wrenches[child.index()]
                .ok_or(DynamicsError::NotComputed { what: "child joint wrench" })?
                .changed_frame(frames, frame)?;
            w.set_body_frame(wrench.body_frame());
            wrench.add(&w)?;
        }
        Ok(())
    }

    /// Acceleration of `body` relative to the world, in the body frame.
    pub fn acceleration_of_body(&self, body: BodyId) -> Result<SpatialAcceleration> {
        self.accelerations
            .get(body.index())
            .copied()
            .flatten()
            .ok_or(DynamicsError::NotComputed { what: "body acceleration" })
    }

    /// Wrench transmitted by `joint` to its successor, in the successor frame.
    pub fn joint_wrench(&self, joint: JointId) -> Result<Wrench> {
        self.joint_wrenches
            .get(joint.index())
            .copied()
            .flatten()
            .ok_or(DynamicsError::NotComputed { what: "joint wrench" })
    }

    pub fn joint_torque(&self, joint: JointId) -> Result<&DVec> {
        // a computed joint always has a wrench, even with zero DoF
        self.joint_wrench(joint)?;
        Ok(&self.torques[joint.index()])
    }

    /// All joint torques packed by velocity offset.
    pub fn torques(&self, tree: &KinematicTree) -> Result<DVec> {
        let mut out = DVec::zeros(tree.dof());
        for &id in tree.joint_order() {
            let tau = self.joint_torque(id)?;
            out.rows_mut(tree.velocity_offset(id)?, tau.len()).copy_from(tau);
        }
        Ok(out)
    }

    /// Residual wrench the environment must apply to the root to sustain
    /// the motion, in the root frame. Zero when the whole tree is balanced
    /// by its joints.
    pub fn root_wrench(&self) -> Result<Wrench> {
        self.root_wrench
            .ok_or(DynamicsError::NotComputed { what: "root wrench" })
    }

    /// Store the computed torques in the tree's joints.
    pub fn write_torques(&self, tree: &mut KinematicTree) -> Result<()> {
        let tau = self.torques(tree)?;
        tree.set_torque_vector(&tau)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use screw_frames::FramePoint;
    use screw_math::{GRAVITY, MassProperties, RigidTransform, UnitVec3, Vec3};
    use screw_model::{JointKind, KinematicTreeBuilder};

    /// Revolute joint about y at the origin, point mass `m` at distance `l`
    /// along -z of the link.
    fn pendulum(m: f64, l: f64) -> (KinematicTree, JointId, BodyId) {
        let mut b = KinematicTreeBuilder::new("base");
        let root = b.root();
        let (joint, link) = b
            .attach(
                root,
                "hinge",
                JointKind::revolute(UnitVec3::new_normalize(Vec3::y())),
                RigidTransform::identity(),
                "link",
                MassProperties::point_mass(m, Vec3::new(0.0, 0.0, -l)),
            )
            .unwrap();
        (b.build().unwrap(), joint, link)
    }

    #[test]
    fn pendulum_gravity_torque() {
        let (m, l, q) = (2.0, 0.5, 0.4);
        let (mut tree, hinge, _) = pendulum(m, l);
        tree.joint_mut(hinge).unwrap().set_q(q).unwrap();
        tree.update_frames_recursively().unwrap();

        let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
        id.compute(&tree).unwrap();

        // holding torque: the mass sits at x = -l sin q, gravity pulls it down
        let expected = m * GRAVITY * l * q.sin();
        assert_relative_eq!(id.joint_torque(hinge).unwrap()[0], expected, epsilon = 1e-10);
    }

    #[test]
    fn pendulum_inertial_and_centripetal_terms() {
        let (m, l) = (1.5, 0.8);
        let (mut tree, hinge, link) = pendulum(m, l);
        {
            let joint = tree.joint_mut(hinge).unwrap();
            joint.set_qd(3.0).unwrap();
            joint.set_qdd_desired(2.0).unwrap();
        }
        tree.update_frames_recursively().unwrap();

        let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default().without_gravity());
        id.compute(&tree).unwrap();
        assert_relative_eq!(id.joint_torque(hinge).unwrap()[0], m * l * l * 2.0, epsilon = 1e-10);

        // joint force holds the mass on its circle: m l qd² toward the hinge
        let w = id.joint_wrench(hinge).unwrap();
        assert_relative_eq!(w.linear.z, m * l * 9.0, epsilon = 1e-10);

        let a = id.acceleration_of_body(link).unwrap();
        assert_relative_eq!(a.angular, Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn external_wrench_balances_gravity() {
        let (m, l) = (1.0, 1.0);
        let (mut tree, hinge, link) = pendulum(m, l);
        tree.joint_mut(hinge).unwrap().set_q(0.7).unwrap();
        tree.update_frames_recursively().unwrap();

        let link_frame = tree.body(link).unwrap().body_frame();
        let world = tree.world_frame();
        let com = FramePoint::new(link_frame, Vec3::new(0.0, 0.0, -l))
            .changed_frame(tree.frames(), world)
            .unwrap();
        let lift = FrameVector::new(world, Vec3::new(0.0, 0.0, m * GRAVITY));
        let wrench = Wrench::from_force_at_point(link_frame, &lift, &com).unwrap();

        let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
        id.set_external_wrench(&tree, link, wrench).unwrap();
        id.compute(&tree).unwrap();
        assert_relative_eq!(id.joint_torque(hinge).unwrap()[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(id.root_wrench().unwrap().to_vector().norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn external_wrench_on_wrong_body_is_rejected() {
        let (tree, _, link) = pendulum(1.0, 1.0);
        let root_frame = tree.root_frame();
        let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
        let err = id
            .set_external_wrench(&tree, link, Wrench::zero(root_frame, root_frame))
            .unwrap_err();
        assert!(err.is_frame_mismatch(), "{err}");
    }

    #[test]
    fn reset_clears_external_wrenches() {
        let (tree, _, link) = pendulum(1.0, 1.0);
        let frame = tree.body(link).unwrap().body_frame();
        let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
        let w = Wrench::new(frame, frame, Vec3::x(), Vec3::y());
        id.set_external_wrench(&tree, link, w).unwrap();
        assert_eq!(id.external_wrench(&tree, link).unwrap(), w);
        id.reset();
        for (body, _) in tree.bodies() {
            assert_eq!(id.external_wrench(&tree, body).unwrap().to_vector().norm(), 0.0);
        }
    }

    #[test]
    fn root_wrench_carries_static_load() {
        let m = 3.0;
        let (mut tree, _, _) = pendulum(m, 0.5);
        tree.update_frames_recursively().unwrap();
        let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
        id.compute(&tree).unwrap();
        let w = id.root_wrench().unwrap();
        assert_eq!(w.expressed_in_frame(), tree.root_frame());
        assert_relative_eq!(w.linear, Vec3::new(0.0, 0.0, m * GRAVITY), epsilon = 1e-10);
    }

    #[test]
    fn packed_accelerations_must_match_dof() {
        let (mut tree, _, _) = pendulum(1.0, 1.0);
        tree.update_frames_recursively().unwrap();
        let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
        assert!(matches!(
            id.compute_with_accelerations(&tree, &DVec::zeros(3)),
            Err(DynamicsError::DimensionMismatch { expected: 1, actual: 3, .. })
        ));
    }

    #[test]
    fn queries_before_compute_fail() {
        let (tree, hinge, link) = pendulum(1.0, 1.0);
        let id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
        assert!(id.joint_torque(hinge).is_err());
        assert!(id.acceleration_of_body(link).is_err());
        assert!(id.root_wrench().is_err());
    }

    #[test]
    fn write_torques_updates_joints() {
        let (mut tree, hinge, _) = pendulum(1.0, 1.0);
        tree.joint_mut(hinge).unwrap().set_q(0.5).unwrap();
        tree.update_frames_recursively().unwrap();
        let mut id = InverseDynamicsCalculator::new(&tree, DynamicsConfig::default());
        id.compute(&tree).unwrap();
        id.write_torques(&mut tree).unwrap();
        assert_relative_eq!(
            tree.joint(hinge).unwrap().tau().unwrap(),
            id.joint_torque(hinge).unwrap()[0],
            epsilon = 1e-15
        );
    }
}
