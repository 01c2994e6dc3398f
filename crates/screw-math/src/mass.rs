//! Untagged mass properties of a rigid body.
//!
//! The frame a `MassProperties` is expressed in is implied by its owner;
//! `screw-spatial` wraps it with frame tags.

use serde::{Deserialize, Serialize};

use crate::{Mat3, Mat6, RigidTransform, Vec3, skew};

/// Mass, center of mass, and rotational inertia about the center of mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    /// Mass of the body.
    pub mass: f64,
    /// Center of mass position in the owning frame.
    pub com: Vec3,
    /// Rotational inertia about the center of mass (3x3 symmetric).
    pub inertia: Mat3,
}

impl MassProperties {
    pub fn new(mass: f64, com: Vec3, inertia: Mat3) -> Self {
        Self { mass, com, inertia }
    }

    /// A massless body.
    pub fn zero() -> Self {
        Self {
            mass: 0.0,
            com: Vec3::zeros(),
            inertia: Mat3::zeros(),
        }
    }

    pub fn point_mass(mass: f64, pos: Vec3) -> Self {
        Self {
            mass,
            com: pos,
            inertia: Mat3::zeros(),
        }
    }

    /// Uniform rod of given mass and length along the Z axis, centered at the origin.
    pub fn rod(mass: f64, length: f64) -> Self {
        let i = mass * length * length / 12.0;
        Self {
            mass,
            com: Vec3::zeros(),
            inertia: Mat3::from_diagonal(&Vec3::new(i, i, 0.0)),
        }
    }

    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 2.0 / 5.0 * mass * radius * radius;
        Self {
            mass,
            com: Vec3::zeros(),
            inertia: Mat3::from_diagonal(&Vec3::new(i, i, i)),
        }
    }

    /// Uniform box with full side lengths `size`, centered at the origin.
    pub fn solid_box(mass: f64, size: Vec3) -> Self {
        let (x2, y2, z2) = (size.x * size.x, size.y * size.y, size.z * size.z);
        let k = mass / 12.0;
        Self {
            mass,
            com: Vec3::zeros(),
            inertia: Mat3::from_diagonal(&Vec3::new(k * (y2 + z2), k * (x2 + z2), k * (x2 + y2))),
        }
    }

    /// Move the center of mass while keeping the rotational inertia.
    pub fn with_com(mut self, com: Vec3) -> Self {
        self.com = com;
        self
    }

    /// Non-negative mass and a symmetric rotational inertia whose principal
    /// moments satisfy the triangle inequality.
    pub fn is_physical(&self) -> bool {
        if !(self.mass >= 0.0) {
            return false;
        }
        if (self.inertia - self.inertia.transpose()).abs().max() > 1e-9 * (1.0 + self.inertia.abs().max()) {
            return false;
        }
        let eig = self.inertia.symmetric_eigenvalues();
        let tol = 1e-9 * (1.0 + eig.abs().max());
        eig.iter().all(|&e| e >= -tol)
            && eig[0] + eig[1] >= eig[2] - tol
            && eig[1] + eig[2] >= eig[0] - tol
            && eig[0] + eig[2] >= eig[1] - tol
    }

    /// Rotational inertia about the owning frame's origin.
    pub fn inertia_about_origin(&self) -> Mat3 {
        let cx = skew(&self.com);
        self.inertia + cx * cx.transpose() * self.mass
    }

    /// 6x6 spatial inertia matrix about the owning frame's origin.
    ///
    /// I_spatial = | I + m[c]×[c]×ᵀ   m[c]× |
    ///             | m[c]×ᵀ            mE   |
    pub fn to_matrix(&self) -> Mat6 {
        let cx = skew(&self.com);
        let m = self.mass;

        let mut mat = Mat6::zeros();
        mat.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.inertia_about_origin());
        let mcx = cx * m;
        mat.fixed_view_mut::<3, 3>(0, 3).copy_from(&mcx);
        mat.fixed_view_mut::<3, 3>(3, 0).copy_from(&mcx.transpose());
        mat.fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&(Mat3::identity() * m));
        mat
    }

    /// Momentum `(angular, linear)` about the origin for the motion `(ω, v)`.
    ///
    /// Equivalent to `to_matrix() * [ω; v]` without forming the 6x6 matrix.
    pub fn mul_motion(&self, angular: &Vec3, linear: &Vec3) -> (Vec3, Vec3) {
        let lin = (linear - self.com.cross(angular)) * self.mass;
        let ang = self.inertia * angular + self.com.cross(&lin);
        (ang, lin)
    }

    /// Express the same body in another frame, given the transform from the
    /// current frame to the new one.
    pub fn transformed(&self, xf: &RigidTransform) -> MassProperties {
        let r = xf.rotation;
        MassProperties {
            mass: self.mass,
            com: xf.transform_point(&self.com),
            inertia: r * self.inertia * r.transpose(),
        }
    }

    /// Lump two bodies expressed in the same frame into one.
    pub fn combine(&self, other: &MassProperties) -> MassProperties {
        let mass = self.mass + other.mass;
        if mass <= 0.0 {
            return MassProperties::zero();
        }
        let com = (self.com * self.mass + other.com * other.mass) / mass;
        let shift = |p: &MassProperties| {
            let d = skew(&(p.com - com));
            p.inertia + d * d.transpose() * p.mass
        };
        MassProperties {
            mass,
            com,
            inertia: shift(self) + shift(other),
        }
    }
}
