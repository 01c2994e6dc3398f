//! Math primitives for the screw rigid-body engine.
//!
//! Thin nalgebra aliases, rotation helpers, rigid transforms and
//! untagged mass properties. Spatial vectors carrying frame tags live in
//! `screw-spatial`; this crate knows nothing about frames.

pub mod mass;
pub mod quaternion;
pub mod transform;

pub use mass::MassProperties;
pub use quaternion::Quat;
pub use transform::RigidTransform;

use nalgebra as na;

/// 3D vector alias.
pub type Vec3 = na::Vector3<f64>;
/// 3x3 matrix alias.
pub type Mat3 = na::Matrix3<f64>;
/// 6D vector alias, ordered `[angular; linear]`.
pub type Vec6 = na::Vector6<f64>;
/// 6x6 matrix alias.
pub type Mat6 = na::Matrix6<f64>;
/// Dynamic vector.
pub type DVec = na::DVector<f64>;
/// Dynamic matrix.
pub type DMat = na::DMatrix<f64>;
/// Unit-length 3D vector, used for joint axes.
pub type UnitVec3 = na::Unit<Vec3>;

/// Cross-product matrix: [v]× such that [v]× w = v × w.
#[inline]
pub fn skew(v: &Vec3) -> Mat3 {
    Mat3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Inverse of [`skew`] applied to the skew-symmetric part of `m`.
#[inline]
pub fn vee(m: &Mat3) -> Vec3 {
    Vec3::new(
        0.5 * (m[(2, 1)] - m[(1, 2)]),
        0.5 * (m[(0, 2)] - m[(2, 0)]),
        0.5 * (m[(1, 0)] - m[(0, 1)]),
    )
}

/// Split a 6-vector into its `(angular, linear)` halves.
#[inline]
pub fn split6(v: &Vec6) -> (Vec3, Vec3) {
    (
        Vec3::new(v[0], v[1], v[2]),
        Vec3::new(v[3], v[4], v[5]),
    )
}

/// Stack `(angular, linear)` into a 6-vector.
#[inline]
pub fn join6(angular: &Vec3, linear: &Vec3) -> Vec6 {
    Vec6::new(angular.x, angular.y, angular.z, linear.x, linear.y, linear.z)
}

/// Standard gravity (m/s²).
pub const GRAVITY: f64 = 9.81;
