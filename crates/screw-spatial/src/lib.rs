//! Frame-tagged spatial vector algebra.
//!
//! Motion vectors ([`Twist`], [`SpatialAcceleration`]) carry a
//! `(body, base, expressed_in)` triple; force vectors ([`Wrench`],
//! [`Momentum`]) carry `(body, expressed_in)`. Every binary operation checks
//! the tags and returns [`FrameError::Mismatch`] instead of producing a
//! number in the wrong frame.
//!
//! All 6-vectors are ordered `[angular; linear]`.

pub mod acceleration;
pub mod inertia;
pub mod subspace;
pub mod twist;
pub mod wrench;

pub use acceleration::SpatialAcceleration;
pub use inertia::{Momentum, SpatialInertia};
pub use screw_frames::{FrameError, FrameId, FramePoint, FrameTree, FrameVector, Result};
pub use subspace::MotionSubspace;
pub use twist::Twist;
pub use wrench::Wrench;

use screw_math::Vec3;

/// Spatial motion cross product `a ×m b`.
///
/// | ω_a × ω_b             |
/// | ω_a × v_b + v_a × ω_b |
#[inline]
#[must_use]
pub fn cross_motion(a: (&Vec3, &Vec3), b: (&Vec3, &Vec3)) -> (Vec3, Vec3) {
    let (wa, va) = a;
    let (wb, vb) = b;
    (wa.cross(wb), wa.cross(vb) + va.cross(wb))
}

/// Spatial force cross product `v ×* f`.
///
/// | ω × τ + v × f |
/// | ω × f         |
#[inline]
#[must_use]
pub fn cross_force(v: (&Vec3, &Vec3), f: (&Vec3, &Vec3)) -> (Vec3, Vec3) {
    let (w, lin) = v;
    let (tau, force) = f;
    (w.cross(tau) + lin.cross(force), w.cross(force))
}
