//! Energy and momentum of the whole tree.

use screw_frames::{FramePoint, FrameVector};
use screw_math::Vec3;
use screw_model::KinematicTree;

use crate::{Result, TwistCalculator};

/// Σ ½ vᵀ I v over all bodies. `twists` must be computed for the tree's
/// current state.
pub fn kinetic_energy(tree: &KinematicTree, twists: &TwistCalculator) -> Result<f64> {
    let mut ke = 0.0;
    for (id, body) in tree.bodies() {
        if let Some(inertia) = body.inertia() {
            ke += inertia.kinetic_energy(&twists.twist_of_body(id)?)?;
        }
    }
    Ok(ke)
}

/// −Σ m gᵀ c over all bodies, with `gravity` and the centers of mass in the
/// world frame. Zero when every center of mass sits at the world origin.
pub fn potential_energy(tree: &KinematicTree, gravity: &Vec3) -> Result<f64> {
    tree.check_frames_current()?;
    let world = tree.world_frame();
    let mut pe = 0.0;
    for (_, body) in tree.bodies() {
        if let Some(inertia) = body.inertia() {
            let com = inertia.center_of_mass().changed_frame(tree.frames(), world)?;
            pe -= inertia.mass() * gravity.dot(&com.position);
        }
    }
    Ok(pe)
}

pub fn total_energy(tree: &KinematicTree, twists: &TwistCalculator, gravity: &Vec3) -> Result<f64> {
    Ok(kinetic_energy(tree, twists)? + potential_energy(tree, gravity)?)
}

/// Total linear momentum in the world frame.
pub fn linear_momentum(tree: &KinematicTree, twists: &TwistCalculator) -> Result<FrameVector> {
    let world = tree.world_frame();
    let mut p = FrameVector::zero(world);
    for (id, body) in tree.bodies() {
        if let Some(inertia) = body.inertia() {
            let mut h = inertia.momentum(&twists.twist_of_body(id)?)?;
            h.change_frame(tree.frames(), world)?;
            p.add(&FrameVector::new(world, h.linear))?;
        }
    }
    Ok(p)
}

/// Center of mass of the whole tree in the world frame; the world origin
/// for a massless tree.
pub fn center_of_mass(tree: &KinematicTree) -> Result<FramePoint> {
    tree.check_frames_current()?;
    let world = tree.world_frame();
    let mut weighted = Vec3::zeros();
    let mut mass = 0.0;
    for (_, body) in tree.bodies() {
        if let Some(inertia) = body.inertia() {
            let com = inertia.center_of_mass().changed_frame(tree.frames(), world)?;
            weighted += com.position * inertia.mass();
            mass += inertia.mass();
        }
    }
    if mass > 0.0 {
        weighted /= mass;
    }
    Ok(FramePoint::new(world, weighted))
}
