//! Random kinematic trees and states for randomized testing.

use rand::Rng;
use screw_math::{MassProperties, Quat, RigidTransform, UnitVec3, Vec3};

use crate::{BodyId, JointKind, KinematicTree, KinematicTreeBuilder, Result};

/// Joint kinds used by the random generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomJoint {
    Revolute,
    Prismatic,
    SixDof,
    Fixed,
}

pub fn random_vector<R: Rng>(rng: &mut R, magnitude: f64) -> Vec3 {
    Vec3::new(
        rng.gen_range(-magnitude..magnitude),
        rng.gen_range(-magnitude..magnitude),
        rng.gen_range(-magnitude..magnitude),
    )
}

pub fn random_unit_vector<R: Rng>(rng: &mut R) -> UnitVec3 {
    loop {
        let v = random_vector(rng, 1.0);
        let n = v.norm();
        if n > 0.1 && n <= 1.0 {
            return UnitVec3::new_normalize(v);
        }
    }
}

pub fn random_quat<R: Rng>(rng: &mut R) -> Quat {
    loop {
        let q = Quat::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let n = q.norm();
        if n > 0.1 && n <= 1.0 {
            return q.normalize();
        }
    }
}

pub fn random_transform<R: Rng>(rng: &mut R) -> RigidTransform {
    RigidTransform::from_quat(&random_quat(rng), random_vector(rng, 1.0))
}

/// Random box-shaped body with a rotated inertia and an offset center of mass.
pub fn random_mass_properties<R: Rng>(rng: &mut R) -> MassProperties {
    let size = Vec3::new(
        rng.gen_range(0.1..1.0),
        rng.gen_range(0.1..1.0),
        rng.gen_range(0.1..1.0),
    );
    let shape = MassProperties::solid_box(rng.gen_range(0.1..2.0), size);
    let r = random_quat(rng).to_matrix();
    MassProperties::new(shape.mass, random_vector(rng, 0.5), r * shape.inertia * r.transpose())
}

fn random_kind<R: Rng>(rng: &mut R, joint: RandomJoint) -> JointKind {
    match joint {
        RandomJoint::Revolute => JointKind::revolute(random_unit_vector(rng)),
        RandomJoint::Prismatic => JointKind::prismatic(random_unit_vector(rng)),
        RandomJoint::SixDof => JointKind::six_dof(),
        RandomJoint::Fixed => JointKind::fixed(),
    }
}

fn random_tree_impl<R: Rng>(rng: &mut R, joints: &[RandomJoint], branching: bool) -> Result<KinematicTree> {
    let mut builder = KinematicTreeBuilder::new("elevator");
    let mut bodies: Vec<BodyId> = vec![builder.root()];
    for (i, &joint) in joints.iter().enumerate() {
        let parent = if branching {
            bodies[rng.gen_range(0..bodies.len())]
        } else {
            bodies[bodies.len() - 1]
        };
        let kind = random_kind(rng, joint);
        let offset = random_transform(rng);
        let mass = random_mass_properties(rng);
        let (_, body) = builder.attach(parent, format!("joint{i}"), kind, offset, format!("body{i}"), mass)?;
        bodies.push(body);
    }
    builder.build()
}

/// Serial chain with the given joint sequence.
pub fn random_chain<R: Rng>(rng: &mut R, joints: &[RandomJoint]) -> Result<KinematicTree> {
    random_tree_impl(rng, joints, false)
}

/// Tree where each new body attaches to a uniformly chosen existing body.
pub fn random_tree<R: Rng>(rng: &mut R, joints: &[RandomJoint]) -> Result<KinematicTree> {
    random_tree_impl(rng, joints, true)
}

pub fn random_revolute_chain<R: Rng>(rng: &mut R, n: usize) -> Result<KinematicTree> {
    random_chain(rng, &vec![RandomJoint::Revolute; n])
}

/// Floating base followed by a chain of `n` one-DoF joints.
pub fn random_floating_chain<R: Rng>(rng: &mut R, n: usize) -> Result<KinematicTree> {
    let mut joints = vec![RandomJoint::SixDof];
    joints.extend((0..n).map(|_| {
        if rng.gen_bool(0.5) {
            RandomJoint::Revolute
        } else {
            RandomJoint::Prismatic
        }
    }));
    random_chain(rng, &joints)
}

/// One-DoF positions uniform in [-1, 1]; six-DoF joints get a random pose.
pub fn set_random_configuration<R: Rng>(tree: &mut KinematicTree, rng: &mut R) -> Result<()> {
    for joint in &mut tree.joints {
        match joint.kind() {
            JointKind::Revolute(_) | JointKind::Prismatic(_) => joint.set_q(rng.gen_range(-1.0..1.0))?,
            JointKind::SixDof(_) => joint.set_pose(random_quat(rng), random_vector(rng, 1.0))?,
            JointKind::Fixed => {}
        }
    }
    Ok(())
}

/// Every velocity coordinate uniform in [-1, 1].
pub fn set_random_velocities<R: Rng>(tree: &mut KinematicTree, rng: &mut R) -> Result<()> {
    for joint in &mut tree.joints {
        let qd: Vec<f64> = (0..joint.dof()).map(|_| rng.gen_range(-1.0..1.0)).collect();
        joint.set_velocity(&qd)?;
    }
    Ok(())
}

/// Every desired acceleration coordinate uniform in [-1, 1].
pub fn set_random_desired_accelerations<R: Rng>(tree: &mut KinematicTree, rng: &mut R) -> Result<()> {
    for joint in &mut tree.joints {
        let qdd: Vec<f64> = (0..joint.dof()).map(|_| rng.gen_range(-1.0..1.0)).collect();
        joint.set_desired_acceleration(&qdd)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_mass_properties_are_physical() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let m = random_mass_properties(&mut rng);
            assert!(m.is_physical(), "{m:?}");
        }
    }

    #[test]
    fn random_chain_has_requested_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let tree = random_chain(
            &mut rng,
            &[RandomJoint::SixDof, RandomJoint::Revolute, RandomJoint::Fixed, RandomJoint::Prismatic],
        )
        .unwrap();
        assert_eq!(tree.num_joints(), 4);
        assert_eq!(tree.dof(), 8);
        assert_eq!(tree.configuration_dof(), 9);
        // serial: every body except the leaf has exactly one child
        let leaves = tree.bodies().filter(|(_, b)| b.child_joints().is_empty()).count();
        assert_eq!(leaves, 1);
    }

    #[test]
    fn random_tree_is_reproducible() {
        let a = random_tree(&mut StdRng::seed_from_u64(3), &[RandomJoint::Revolute; 12]).unwrap();
        let b = random_tree(&mut StdRng::seed_from_u64(3), &[RandomJoint::Revolute; 12]).unwrap();
        let parents = |t: &KinematicTree| -> Vec<usize> {
            t.joints_in_order().map(|(_, j)| j.predecessor().index()).collect()
        };
        assert_eq!(parents(&a), parents(&b));
    }

    #[test]
    fn random_state_touches_configuration_only_through_setters() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut tree = random_floating_chain(&mut rng, 3).unwrap();
        tree.update_frames_recursively().unwrap();
        set_random_velocities(&mut tree, &mut rng).unwrap();
        set_random_desired_accelerations(&mut tree, &mut rng).unwrap();
        tree.check_frames_current().unwrap();
        set_random_configuration(&mut tree, &mut rng).unwrap();
        assert!(tree.check_frames_current().is_err());
        assert!(tree.velocity_vector().iter().all(|v| v.abs() <= 1.0));
    }
}
