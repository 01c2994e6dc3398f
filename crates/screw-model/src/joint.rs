//! Joint variants and their state.
//!
//! The set of joint kinds is closed; behavior is dispatched by matching on
//! [`JointKind`]. Every joint reports its motion in its frame-after, where
//! the motion subspace is constant.

use screw_frames::FrameId;
use screw_math::{DVec, Quat, RigidTransform, UnitVec3, Vec3, Vec6, join6, split6};
use screw_spatial::{MotionSubspace, SpatialAcceleration, Twist};

use crate::{BodyId, Result, TreeError};

/// Position and effort limits of a one-DoF joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    pub lower: f64,
    pub upper: f64,
    /// Largest admissible absolute torque or force.
    pub effort: f64,
}

impl JointLimits {
    pub fn contains(&self, q: f64) -> bool {
        (self.lower..=self.upper).contains(&q)
    }
}

/// State of a revolute or prismatic joint.
#[derive(Debug, Clone, PartialEq)]
pub struct OneDofJoint {
    axis: UnitVec3,
    q: f64,
    qd: f64,
    qdd: f64,
    qdd_desired: f64,
    tau: f64,
    limits: Option<JointLimits>,
}

impl OneDofJoint {
    fn new(axis: UnitVec3) -> Self {
        Self {
            axis,
            q: 0.0,
            qd: 0.0,
            qdd: 0.0,
            qdd_desired: 0.0,
            tau: 0.0,
            limits: None,
        }
    }

    pub fn axis(&self) -> &UnitVec3 {
        &self.axis
    }

    pub fn q(&self) -> f64 {
        self.q
    }

    pub fn qd(&self) -> f64 {
        self.qd
    }

    pub fn qdd(&self) -> f64 {
        self.qdd
    }

    pub fn qdd_desired(&self) -> f64 {
        self.qdd_desired
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn limits(&self) -> Option<&JointLimits> {
        self.limits.as_ref()
    }
}

/// State of a floating (six-DoF) joint.
///
/// The configuration is the pose of frame-after in frame-before. Velocity,
/// acceleration and wrench are `[angular; linear]` in frame-after.
#[derive(Debug, Clone, PartialEq)]
pub struct SixDofJoint {
    rotation: Quat,
    position: Vec3,
    twist: Vec6,
    acceleration: Vec6,
    acceleration_desired: Vec6,
    wrench: Vec6,
}

impl SixDofJoint {
    fn new() -> Self {
        Self {
            rotation: Quat::identity(),
            position: Vec3::zeros(),
            twist: Vec6::zeros(),
            acceleration: Vec6::zeros(),
            acceleration_desired: Vec6::zeros(),
            wrench: Vec6::zeros(),
        }
    }

    pub fn rotation(&self) -> &Quat {
        &self.rotation
    }

    pub fn position(&self) -> &Vec3 {
        &self.position
    }

    pub fn twist(&self) -> &Vec6 {
        &self.twist
    }

    pub fn acceleration(&self) -> &Vec6 {
        &self.acceleration
    }

    pub fn acceleration_desired(&self) -> &Vec6 {
        &self.acceleration_desired
    }

    pub fn wrench(&self) -> &Vec6 {
        &self.wrench
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JointKind {
    /// Rotation about a fixed axis of frame-before.
    Revolute(OneDofJoint),
    /// Translation along a fixed axis of frame-before.
    Prismatic(OneDofJoint),
    /// Unconstrained floating joint.
    SixDof(SixDofJoint),
    /// Rigid attachment with no degrees of freedom.
    Fixed,
}

impl JointKind {
    pub fn revolute(axis: UnitVec3) -> Self {
        JointKind::Revolute(OneDofJoint::new(axis))
    }

    pub fn prismatic(axis: UnitVec3) -> Self {
        JointKind::Prismatic(OneDofJoint::new(axis))
    }

    pub fn six_dof() -> Self {
        JointKind::SixDof(SixDofJoint::new())
    }

    pub fn fixed() -> Self {
        JointKind::Fixed
    }

    /// Attach limits to a revolute or prismatic joint; ignored otherwise.
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        if let JointKind::Revolute(j) | JointKind::Prismatic(j) = &mut self {
            j.limits = Some(limits);
        }
        self
    }

    pub fn label(&self) -> &'static str {
        match self {
            JointKind::Revolute(_) => "revolute",
            JointKind::Prismatic(_) => "prismatic",
            JointKind::SixDof(_) => "six-dof",
            JointKind::Fixed => "fixed",
        }
    }

    /// Number of velocity coordinates.
    pub fn dof(&self) -> usize {
        match self {
            JointKind::Revolute(_) | JointKind::Prismatic(_) => 1,
            JointKind::SixDof(_) => 6,
            JointKind::Fixed => 0,
        }
    }

    /// Number of configuration coordinates.
    pub fn configuration_dof(&self) -> usize {
        match self {
            JointKind::Revolute(_) | JointKind::Prismatic(_) => 1,
            JointKind::SixDof(_) => 7,
            JointKind::Fixed => 0,
        }
    }
}

/// A joint between a predecessor and a successor body.
#[derive(Debug, Clone)]
pub struct Joint {
    pub(crate) name: String,
    pub(crate) kind: JointKind,
    pub(crate) predecessor: BodyId,
    pub(crate) successor: BodyId,
    pub(crate) frame_before: FrameId,
    pub(crate) frame_after: FrameId,
    /// Bumped on every configuration write.
    pub(crate) generation: u64,
}

fn check_len(what: &'static str, expected: usize, values: &[f64]) -> Result<()> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(TreeError::DimensionMismatch {
            what,
            expected,
            actual: values.len(),
        })
    }
}

fn vec6(values: &[f64]) -> Vec6 {
    Vec6::from_column_slice(values)
}

impl Joint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    pub fn predecessor(&self) -> BodyId {
        self.predecessor
    }

    pub fn successor(&self) -> BodyId {
        self.successor
    }

    pub fn frame_before(&self) -> FrameId {
        self.frame_before
    }

    pub fn frame_after(&self) -> FrameId {
        self.frame_after
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dof(&self) -> usize {
        self.kind.dof()
    }

    pub fn configuration_dof(&self) -> usize {
        self.kind.configuration_dof()
    }

    /// Pose of frame-after in frame-before for the current configuration.
    pub fn joint_transform(&self) -> RigidTransform {
        match &self.kind {
            JointKind::Revolute(j) => RigidTransform::from_axis_angle(&j.axis, j.q),
            JointKind::Prismatic(j) => RigidTransform::from_translation(j.axis.into_inner() * j.q),
            JointKind::SixDof(j) => RigidTransform::from_quat(&j.rotation, j.position),
            JointKind::Fixed => RigidTransform::identity(),
        }
    }

    /// Motion subspace of frame-after relative to frame-before, in frame-after.
    pub fn motion_subspace(&self) -> MotionSubspace {
        let (after, before) = (self.frame_after, self.frame_before);
        match &self.kind {
            JointKind::Revolute(j) => {
                MotionSubspace::new(after, before, after, &[join6(&j.axis, &Vec3::zeros())])
            }
            JointKind::Prismatic(j) => {
                MotionSubspace::new(after, before, after, &[join6(&Vec3::zeros(), &j.axis)])
            }
            JointKind::SixDof(_) => {
                let columns: Vec<Vec6> = (0..6)
                    .map(|k| {
                        let mut c = Vec6::zeros();
                        c[k] = 1.0;
                        c
                    })
                    .collect();
                MotionSubspace::new(after, before, after, &columns)
            }
            JointKind::Fixed => MotionSubspace::empty(after, before, after),
        }
    }

    /// Twist of frame-after relative to frame-before, in frame-after.
    pub fn joint_twist(&self) -> Twist {
        let (after, before) = (self.frame_after, self.frame_before);
        match &self.kind {
            JointKind::Revolute(j) => Twist::new(after, before, after, j.axis.into_inner() * j.qd, Vec3::zeros()),
            JointKind::Prismatic(j) => Twist::new(after, before, after, Vec3::zeros(), j.axis.into_inner() * j.qd),
            JointKind::SixDof(j) => Twist::from_vector(after, before, after, &j.twist),
            JointKind::Fixed => Twist::zero(after, before, after),
        }
    }

    /// `S qdd_desired`, tagged like [`joint_twist`](Self::joint_twist).
    pub fn desired_acceleration(&self) -> Result<SpatialAcceleration> {
        Ok(self
            .motion_subspace()
            .acceleration(self.desired_acceleration_vector().as_slice())?)
    }

    /// `S qdd` from the actual joint acceleration.
    pub fn acceleration(&self) -> Result<SpatialAcceleration> {
        Ok(self
            .motion_subspace()
            .acceleration(self.acceleration_vector().as_slice())?)
    }

    /// Configuration coordinates; six-DoF joints pack `[qw, qx, qy, qz, x, y, z]`.
    pub fn configuration(&self) -> DVec {
        match &self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => DVec::from_element(1, j.q),
            JointKind::SixDof(j) => {
                let (r, p) = (&j.rotation, &j.position);
                DVec::from_column_slice(&[r.w, r.v.x, r.v.y, r.v.z, p.x, p.y, p.z])
            }
            JointKind::Fixed => DVec::zeros(0),
        }
    }

    pub fn set_configuration(&mut self, values: &[f64]) -> Result<()> {
        check_len("joint configuration", self.configuration_dof(), values)?;
        match &mut self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => j.q = values[0],
            JointKind::SixDof(j) => {
                j.rotation = Quat::new(values[0], values[1], values[2], values[3]).normalize();
                j.position = Vec3::new(values[4], values[5], values[6]);
            }
            JointKind::Fixed => {}
        }
        self.touch();
        Ok(())
    }

    pub fn velocity(&self) -> DVec {
        match &self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => DVec::from_element(1, j.qd),
            JointKind::SixDof(j) => DVec::from_column_slice(j.twist.as_slice()),
            JointKind::Fixed => DVec::zeros(0),
        }
    }

    pub fn set_velocity(&mut self, values: &[f64]) -> Result<()> {
        check_len("joint velocity", self.dof(), values)?;
        match &mut self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => j.qd = values[0],
            JointKind::SixDof(j) => j.twist = vec6(values),
            JointKind::Fixed => {}
        }
        Ok(())
    }

    pub fn desired_acceleration_vector(&self) -> DVec {
        match &self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => DVec::from_element(1, j.qdd_desired),
            JointKind::SixDof(j) => DVec::from_column_slice(j.acceleration_desired.as_slice()),
            JointKind::Fixed => DVec::zeros(0),
        }
    }

    pub fn set_desired_acceleration(&mut self, values: &[f64]) -> Result<()> {
        check_len("joint desired acceleration", self.dof(), values)?;
        match &mut self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => j.qdd_desired = values[0],
            JointKind::SixDof(j) => j.acceleration_desired = vec6(values),
            JointKind::Fixed => {}
        }
        Ok(())
    }

    pub fn acceleration_vector(&self) -> DVec {
        match &self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => DVec::from_element(1, j.qdd),
            JointKind::SixDof(j) => DVec::from_column_slice(j.acceleration.as_slice()),
            JointKind::Fixed => DVec::zeros(0),
        }
    }

    pub fn set_acceleration(&mut self, values: &[f64]) -> Result<()> {
        check_len("joint acceleration", self.dof(), values)?;
        match &mut self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => j.qdd = values[0],
            JointKind::SixDof(j) => j.acceleration = vec6(values),
            JointKind::Fixed => {}
        }
        Ok(())
    }

    /// Generalized force; for six-DoF joints the wrench in frame-after.
    pub fn torque(&self) -> DVec {
        match &self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => DVec::from_element(1, j.tau),
            JointKind::SixDof(j) => DVec::from_column_slice(j.wrench.as_slice()),
            JointKind::Fixed => DVec::zeros(0),
        }
    }

    pub fn set_torque(&mut self, values: &[f64]) -> Result<()> {
        check_len("joint torque", self.dof(), values)?;
        match &mut self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => {
                if let Some(limits) = j.limits.filter(|l| values[0].abs() > l.effort) {
                    tracing::warn!(joint = %self.name, tau = values[0], effort = limits.effort, "torque exceeds effort limit");
                }
                j.tau = values[0];
            }
            JointKind::SixDof(j) => j.wrench = vec6(values),
            JointKind::Fixed => {}
        }
        Ok(())
    }

    fn one_dof(&self) -> Result<&OneDofJoint> {
        match &self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => Ok(j),
            other => Err(self.wrong_kind("one-dof", other.label())),
        }
    }

    fn one_dof_mut(&mut self) -> Result<&mut OneDofJoint> {
        match &mut self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => Ok(j),
            other => Err(TreeError::WrongJointKind {
                joint: self.name.clone(),
                expected: "one-dof",
                actual: other.label(),
            }),
        }
    }

    fn six_dof_mut(&mut self) -> Result<&mut SixDofJoint> {
        match &mut self.kind {
            JointKind::SixDof(j) => Ok(j),
            other => Err(TreeError::WrongJointKind {
                joint: self.name.clone(),
                expected: "six-dof",
                actual: other.label(),
            }),
        }
    }

    fn wrong_kind(&self, expected: &'static str, actual: &'static str) -> TreeError {
        TreeError::WrongJointKind {
            joint: self.name.clone(),
            expected,
            actual,
        }
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    pub fn q(&self) -> Result<f64> {
        Ok(self.one_dof()?.q)
    }

    pub fn qd(&self) -> Result<f64> {
        Ok(self.one_dof()?.qd)
    }

    pub fn qdd(&self) -> Result<f64> {
        Ok(self.one_dof()?.qdd)
    }

    pub fn qdd_desired(&self) -> Result<f64> {
        Ok(self.one_dof()?.qdd_desired)
    }

    pub fn tau(&self) -> Result<f64> {
        Ok(self.one_dof()?.tau)
    }

    pub fn set_q(&mut self, q: f64) -> Result<()> {
        let j = self.one_dof_mut()?;
        j.q = q;
        if let Some(limits) = j.limits.filter(|l| !l.contains(q)) {
            tracing::warn!(joint = %self.name, q, lower = limits.lower, upper = limits.upper, "joint position outside limits");
        }
        self.touch();
        Ok(())
    }

    pub fn set_qd(&mut self, qd: f64) -> Result<()> {
        self.one_dof_mut()?.qd = qd;
        Ok(())
    }

    pub fn set_qdd(&mut self, qdd: f64) -> Result<()> {
        self.one_dof_mut()?.qdd = qdd;
        Ok(())
    }

    pub fn set_qdd_desired(&mut self, qdd: f64) -> Result<()> {
        self.one_dof_mut()?.qdd_desired = qdd;
        Ok(())
    }

    pub fn set_tau(&mut self, tau: f64) -> Result<()> {
        self.set_torque(&[tau])
    }

    /// Set the pose of a six-DoF joint.
    pub fn set_pose(&mut self, rotation: Quat, position: Vec3) -> Result<()> {
        let j = self.six_dof_mut()?;
        j.rotation = rotation.normalize();
        j.position = position;
        self.touch();
        Ok(())
    }

    /// Set the twist of a six-DoF joint, in frame-after.
    pub fn set_twist(&mut self, angular: Vec3, linear: Vec3) -> Result<()> {
        self.six_dof_mut()?.twist = join6(&angular, &linear);
        Ok(())
    }

    /// Set the desired acceleration of a six-DoF joint from the angular
    /// acceleration and the acceleration of the frame-after origin, both
    /// in frame-after.
    pub fn set_desired_acceleration_from_origin_acceleration(
        &mut self,
        angular_acceleration: Vec3,
        origin_acceleration: Vec3,
    ) -> Result<()> {
        let twist = self.joint_twist();
        let j = self.six_dof_mut()?;
        let acc = SpatialAcceleration::from_origin_acceleration(&twist, &angular_acceleration, &origin_acceleration)?;
        j.acceleration_desired = acc.to_vector();
        Ok(())
    }

    /// Advance the configuration by the current velocity over `dt`.
    pub fn integrate(&mut self, dt: f64) {
        match &mut self.kind {
            JointKind::Revolute(j) | JointKind::Prismatic(j) => j.q += j.qd * dt,
            JointKind::SixDof(j) => {
                let (omega, v) = split6(&j.twist);
                j.position += j.rotation.rotate(&v) * dt;
                j.rotation = j.rotation.integrate(&omega, dt);
            }
            JointKind::Fixed => return,
        }
        self.touch();
    }

    /// Copy configuration, velocity, accelerations and torque from a joint
    /// of the same kind.
    pub fn copy_state_from(&mut self, other: &Joint) -> Result<()> {
        if std::mem::discriminant(&self.kind) != std::mem::discriminant(&other.kind) {
            return Err(self.wrong_kind(other.kind.label(), self.kind.label()));
        }
        self.set_configuration(other.configuration().as_slice())?;
        self.set_velocity(other.velocity().as_slice())?;
        self.set_acceleration(other.acceleration_vector().as_slice())?;
        self.set_desired_acceleration(other.desired_acceleration_vector().as_slice())?;
        self.set_torque(other.torque().as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use screw_frames::FrameTree;

    fn joint(kind: JointKind) -> (FrameTree, Joint) {
        let mut frames = FrameTree::new();
        let world = frames.world();
        let before = frames
            .add_fixed_frame("before", world, RigidTransform::identity())
            .unwrap();
        let after = frames.add_frame("after", before).unwrap();
        let joint = Joint {
            name: "j".into(),
            kind,
            predecessor: BodyId::new(0),
            successor: BodyId::new(1),
            frame_before: before,
            frame_after: after,
            generation: 0,
        };
        (frames, joint)
    }

    #[test]
    fn revolute_transform_rotates_about_axis() {
        let (_, mut j) = joint(JointKind::revolute(Vec3::z_axis()));
        j.set_q(std::f64::consts::FRAC_PI_2).unwrap();
        let xf = j.joint_transform();
        assert_relative_eq!(xf.transform_vector(&Vec3::x()), Vec3::y(), epsilon = 1e-14);
        assert_eq!(j.generation(), 1);
        assert_eq!(j.motion_subspace().dof(), 1);
    }

    #[test]
    fn prismatic_twist_is_linear() {
        let (_, mut j) = joint(JointKind::prismatic(Vec3::x_axis()));
        j.set_qd(2.0).unwrap();
        let t = j.joint_twist();
        assert_relative_eq!(t.linear, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(t.angular, Vec3::zeros());
        // velocity writes do not touch the configuration generation
        assert_eq!(j.generation(), 0);
    }

    #[test]
    fn six_dof_configuration_roundtrip() {
        let (_, mut j) = joint(JointKind::six_dof());
        let q = Quat::from_axis_angle(&Vec3::new(1.0, 1.0, 0.0).normalize(), 0.8);
        j.set_pose(q, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let config = j.configuration();
        assert_eq!(config.len(), 7);

        let (_, mut k) = joint(JointKind::six_dof());
        k.set_configuration(config.as_slice()).unwrap();
        assert_relative_eq!(k.joint_transform().rotation, j.joint_transform().rotation, epsilon = 1e-14);
        assert_relative_eq!(k.joint_transform().translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(j.motion_subspace().dof(), 6);
    }

    #[test]
    fn origin_acceleration_sets_desired_acceleration() {
        let (_, mut j) = joint(JointKind::six_dof());
        j.set_twist(Vec3::new(0.0, 0.0, 1.0), Vec3::new(2.0, 0.0, 0.0)).unwrap();
        j.set_desired_acceleration_from_origin_acceleration(Vec3::zeros(), Vec3::zeros())
            .unwrap();
        // zero origin acceleration with a spinning, moving frame needs v̇ = -ω × v
        let acc = j.desired_acceleration().unwrap();
        assert_relative_eq!(acc.linear, Vec3::new(0.0, -2.0, 0.0), epsilon = 1e-14);
    }

    #[test]
    fn fixed_joint_has_no_coordinates() {
        let (_, mut j) = joint(JointKind::fixed());
        assert_eq!(j.dof(), 0);
        assert_eq!(j.motion_subspace().dof(), 0);
        assert_eq!(j.joint_transform(), RigidTransform::identity());
        assert!(j.set_velocity(&[]).is_ok());
        assert!(j.set_velocity(&[1.0]).is_err());
        assert!(matches!(j.set_q(1.0), Err(TreeError::WrongJointKind { .. })));
    }

    #[test]
    fn dimension_errors_are_reported() {
        let (_, mut j) = joint(JointKind::six_dof());
        assert_eq!(
            j.set_velocity(&[0.0; 5]),
            Err(TreeError::DimensionMismatch {
                what: "joint velocity",
                expected: 6,
                actual: 5
            })
        );
        assert!(j.set_qd(1.0).is_err());
    }

    #[test]
    fn integrate_six_dof_moves_along_body_velocity() {
        let (_, mut j) = joint(JointKind::six_dof());
        j.set_pose(Quat::from_axis_angle(&Vec3::z(), std::f64::consts::FRAC_PI_2), Vec3::zeros())
            .unwrap();
        j.set_twist(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)).unwrap();
        j.integrate(0.5);
        // body x points along world y
        assert_relative_eq!(j.joint_transform().translation, Vec3::new(0.0, 0.5, 0.0), epsilon = 1e-14);
    }

    #[test]
    fn copy_state_requires_same_kind() {
        let (_, mut a) = joint(JointKind::revolute(Vec3::y_axis()));
        let (_, mut b) = joint(JointKind::revolute(Vec3::y_axis()));
        b.set_q(0.3).unwrap();
        b.set_qd(-1.0).unwrap();
        b.set_qdd_desired(4.0).unwrap();
        a.copy_state_from(&b).unwrap();
        assert_eq!(a.q().unwrap(), 0.3);
        assert_eq!(a.qd().unwrap(), -1.0);
        assert_eq!(a.qdd_desired().unwrap(), 4.0);

        let (_, free) = joint(JointKind::six_dof());
        assert!(a.copy_state_from(&free).is_err());
    }

    #[test]
    fn limits_only_apply_to_one_dof_joints() {
        let limits = JointLimits {
            lower: -1.0,
            upper: 1.0,
            effort: 10.0,
        };
        match JointKind::revolute(Vec3::z_axis()).with_limits(limits) {
            JointKind::Revolute(j) => assert_eq!(j.limits(), Some(&limits)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(JointKind::six_dof().with_limits(limits), JointKind::six_dof());
        assert!(limits.contains(0.5));
        assert!(!limits.contains(1.5));
    }
}
