//! Rigid transforms between coordinate frames.
//!
//! A `RigidTransform` from frame A to frame B stores A's pose in B:
//! `p_B = rotation * p_A + translation`. Spatial vectors are ordered
//! `[angular; linear]` (Featherstone).

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::{Mat3, Mat6, Quat, UnitVec3, Vec3, skew};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: Mat3,
    pub translation: Vec3,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn new(rotation: Mat3, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self {
            rotation: Mat3::identity(),
            translation: Vec3::zeros(),
        }
    }

    /// Pure translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: Mat3::identity(),
            translation,
        }
    }

    /// Pure rotation.
    pub fn from_rotation(rotation: Mat3) -> Self {
        Self {
            rotation,
            translation: Vec3::zeros(),
        }
    }

    /// Rotation about an arbitrary axis.
    pub fn from_axis_angle(axis: &UnitVec3, angle: f64) -> Self {
        let rot = na::Rotation3::from_axis_angle(axis, angle);
        Self::from_rotation(*rot.matrix())
    }

    pub fn from_quat(q: &Quat, translation: Vec3) -> Self {
        Self {
            rotation: q.to_matrix(),
            translation,
        }
    }

    pub fn rot_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rotation(Mat3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c))
    }

    pub fn rot_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rotation(Mat3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c))
    }

    pub fn rot_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rotation(Mat3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0))
    }

    pub fn to_quat(&self) -> Quat {
        Quat::from_matrix(&self.rotation)
    }

    /// Compose two transforms: if `other` maps A→B and `self` maps B→C,
    /// the result maps A→C.
    pub fn compose(&self, other: &RigidTransform) -> RigidTransform {
        RigidTransform {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    pub fn inverse(&self) -> RigidTransform {
        let rt = self.rotation.transpose();
        RigidTransform {
            rotation: rt,
            translation: -(rt * self.translation),
        }
    }

    #[inline]
    pub fn transform_point(&self, p: &Vec3) -> Vec3 {
        self.rotation * p + self.translation
    }

    #[inline]
    pub fn transform_vector(&self, v: &Vec3) -> Vec3 {
        self.rotation * v
    }

    #[inline]
    pub fn inverse_transform_point(&self, p: &Vec3) -> Vec3 {
        self.rotation.transpose() * (p - self.translation)
    }

    /// Re-express a motion vector `(ω, v)` given in A as one in B.
    ///
    /// ω' = Rω, v' = Rv + t × ω'
    #[inline]
    pub fn apply_motion(&self, angular: &Vec3, linear: &Vec3) -> (Vec3, Vec3) {
        let w = self.rotation * angular;
        let v = self.rotation * linear + self.translation.cross(&w);
        (w, v)
    }

    /// Re-express a force vector `(τ, f)` given in A as one in B.
    ///
    /// f' = Rf, τ' = Rτ + t × f'
    #[inline]
    pub fn apply_force(&self, torque: &Vec3, force: &Vec3) -> (Vec3, Vec3) {
        let f = self.rotation * force;
        let tau = self.rotation * torque + self.translation.cross(&f);
        (tau, f)
    }

    /// 6x6 matrix form of [`apply_motion`](Self::apply_motion).
    ///
    /// Ad = | R      0 |
    ///      | [t]×R  R |
    pub fn motion_matrix(&self) -> Mat6 {
        let r = self.rotation;
        let tr = skew(&self.translation) * r;

        let mut m = Mat6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
        m.fixed_view_mut::<3, 3>(3, 0).copy_from(&tr);
        m.fixed_view_mut::<3, 3>(3, 3).copy_from(&r);
        m
    }

    /// 6x6 matrix form of [`apply_force`](Self::apply_force).
    ///
    /// Ad* = | R  [t]×R |
    ///       | 0  R     |
    pub fn force_matrix(&self) -> Mat6 {
        let r = self.rotation;
        let tr = skew(&self.translation) * r;

        let mut m = Mat6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
        m.fixed_view_mut::<3, 3>(0, 3).copy_from(&tr);
        m.fixed_view_mut::<3, 3>(3, 3).copy_from(&r);
        m
    }
}
