//! Shared helpers for the integration tests.

#![allow(dead_code)]

use rand::Rng;
use screw::screw_model::random::{
    set_random_configuration, set_random_desired_accelerations, set_random_velocities,
};
use screw::{BodyId, KinematicTree, RigidTransform, Vec3};

pub const FD_STEP: f64 = 1e-8;

/// Random configuration, velocities and desired accelerations, frames updated.
pub fn randomize<R: Rng>(tree: &mut KinematicTree, rng: &mut R) {
    set_random_configuration(tree, rng).unwrap();
    set_random_velocities(tree, rng).unwrap();
    set_random_desired_accelerations(tree, rng).unwrap();
    tree.update_frames_recursively().unwrap();
}

/// Copy of `tree` advanced by its joint velocities over `dt`, frames updated.
pub fn stepped(tree: &KinematicTree, dt: f64) -> KinematicTree {
    let mut next = tree.clone();
    next.integrate(dt);
    next.update_frames_recursively().unwrap();
    next
}

/// Pose of `body` in `base`.
pub fn relative_pose(tree: &KinematicTree, base: BodyId, body: BodyId) -> RigidTransform {
    let from = tree.body(body).unwrap().body_frame();
    let to = tree.body(base).unwrap().body_frame();
    tree.frames().transform_to_desired_frame(from, to).unwrap()
}

/// Body-frame twist `(ω, v)` taking `before` to `after` over `dt`.
pub fn finite_difference_twist(before: &RigidTransform, after: &RigidTransform, dt: f64) -> (Vec3, Vec3) {
    let r0t = before.rotation.transpose();
    let omega = screw::screw_math::vee(&(r0t * after.rotation)) / dt;
    let v = r0t * (after.translation - before.translation) / dt;
    (omega, v)
}

pub fn all_bodies(tree: &KinematicTree) -> Vec<BodyId> {
    tree.bodies().map(|(id, _)| id).collect()
}
