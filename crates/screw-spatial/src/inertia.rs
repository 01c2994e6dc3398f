//! Frame-tagged rigid body inertia and momentum.

use screw_frames::{FrameError, FrameId, FramePoint, FrameTree, FrameVector, Result};
use screw_math::{Mat6, MassProperties, Vec3};

use crate::{SpatialAcceleration, Twist, Wrench, cross_force};

/// Inertia of the body attached to `body_frame`, expressed in
/// `expressed_in_frame`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialInertia {
    body_frame: FrameId,
    expressed_in_frame: FrameId,
    pub mass_properties: MassProperties,
}

/// Angular and linear momentum, expressed in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    expressed_in_frame: FrameId,
    pub angular: Vec3,
    pub linear: Vec3,
}

impl SpatialInertia {
    pub fn new(body_frame: FrameId, expressed_in_frame: FrameId, mass_properties: MassProperties) -> Self {
        Self {
            body_frame,
            expressed_in_frame,
            mass_properties,
        }
    }

    /// Inertia expressed in the body's own frame.
    pub fn in_body_frame(body_frame: FrameId, mass_properties: MassProperties) -> Self {
        Self::new(body_frame, body_frame, mass_properties)
    }

    pub fn body_frame(&self) -> FrameId {
        self.body_frame
    }

    pub fn expressed_in_frame(&self) -> FrameId {
        self.expressed_in_frame
    }

    pub fn mass(&self) -> f64 {
        self.mass_properties.mass
    }

    pub fn center_of_mass(&self) -> FramePoint {
        FramePoint::new(self.expressed_in_frame, self.mass_properties.com)
    }

    pub fn to_matrix(&self) -> Mat6 {
        self.mass_properties.to_matrix()
    }

    /// Parallel-axis re-expression in `frame`.
    pub fn change_frame(&mut self, frames: &FrameTree, frame: FrameId) -> Result<()> {
        if frame == self.expressed_in_frame {
            return Ok(());
        }
        let xf = frames.transform_to_desired_frame(self.expressed_in_frame, frame)?;
        self.mass_properties = self.mass_properties.transformed(&xf);
        self.expressed_in_frame = frame;
        Ok(())
    }

    pub fn changed_frame(mut self, frames: &FrameTree, frame: FrameId) -> Result<Self> {
        self.change_frame(frames, frame)?;
        Ok(self)
    }

    /// Lump `other` into `self`; both must be expressed in the same frame.
    /// The result stays attached to `self`'s body.
    pub fn add(&mut self, other: &SpatialInertia) -> Result<()> {
        FrameError::check("inertia addition", self.expressed_in_frame, other.expressed_in_frame)?;
        self.mass_properties = self.mass_properties.combine(&other.mass_properties);
        Ok(())
    }

    fn check_motion(&self, operation: &'static str, body: FrameId, expressed_in: FrameId) -> Result<()> {
        FrameError::check(operation, self.body_frame, body)?;
        FrameError::check(operation, self.expressed_in_frame, expressed_in)
    }

    pub fn momentum(&self, twist: &Twist) -> Result<Momentum> {
        self.check_motion("momentum", twist.body_frame(), twist.expressed_in_frame())?;
        let (angular, linear) = self.mass_properties.mul_motion(&twist.angular, &twist.linear);
        Ok(Momentum {
            expressed_in_frame: self.expressed_in_frame,
            angular,
            linear,
        })
    }

    pub fn kinetic_energy(&self, twist: &Twist) -> Result<f64> {
        let h = self.momentum(twist)?;
        Ok(0.5 * (h.angular.dot(&twist.angular) + h.linear.dot(&twist.linear)))
    }

    /// `I a` without velocity-product terms.
    pub fn inertial_wrench(&self, acceleration: &SpatialAcceleration) -> Result<Wrench> {
        self.check_motion(
            "inertial wrench",
            acceleration.body_frame(),
            acceleration.expressed_in_frame(),
        )?;
        let (angular, linear) = self
            .mass_properties
            .mul_motion(&acceleration.angular, &acceleration.linear);
        Ok(Wrench::new(self.body_frame, self.expressed_in_frame, angular, linear))
    }

    /// Newton-Euler equation: `I a + v ×* (I v)`.
    ///
    /// Both the acceleration and the twist must be taken relative to an
    /// inertial base for the result to be the net wrench on the body.
    pub fn newton_euler_wrench(&self, acceleration: &SpatialAcceleration, twist: &Twist) -> Result<Wrench> {
        const OP: &str = "newton-euler wrench";
        self.check_motion(OP, twist.body_frame(), twist.expressed_in_frame())?;
        FrameError::check(OP, acceleration.base_frame(), twist.base_frame())?;
        let mut wrench = self.inertial_wrench(acceleration)?;
        let h = self.momentum(twist)?;
        let (angular, linear) = cross_force((&twist.angular, &twist.linear), (&h.angular, &h.linear));
        wrench.angular += angular;
        wrench.linear += linear;
        Ok(wrench)
    }

    /// Wrench exerted on this body by the gravitational acceleration `gravity`.
    pub fn gravity_wrench(&self, frames: &FrameTree, gravity: &FrameVector) -> Result<Wrench> {
        let g = gravity.changed_frame(frames, self.expressed_in_frame)?;
        let force = g.vector * self.mass_properties.mass;
        Ok(Wrench::new(
            self.body_frame,
            self.expressed_in_frame,
            self.mass_properties.com.cross(&force),
            force,
        ))
    }
}

impl Momentum {
    pub fn new(expressed_in_frame: FrameId, angular: Vec3, linear: Vec3) -> Self {
        Self {
            expressed_in_frame,
            angular,
            linear,
        }
    }

    pub fn zero(expressed_in_frame: FrameId) -> Self {
        Self::new(expressed_in_frame, Vec3::zeros(), Vec3::zeros())
    }

    pub fn expressed_in_frame(&self) -> FrameId {
        self.expressed_in_frame
    }

    pub fn add(&mut self, other: &Momentum) -> Result<()> {
        FrameError::check("momentum addition", self.expressed_in_frame, other.expressed_in_frame)?;
        self.angular += other.angular;
        self.linear += other.linear;
        Ok(())
    }

    pub fn change_frame(&mut self, frames: &FrameTree, frame: FrameId) -> Result<()> {
        if frame == self.expressed_in_frame {
            return Ok(());
        }
        let xf = frames.transform_to_desired_frame(self.expressed_in_frame, frame)?;
        (self.angular, self.linear) = xf.apply_force(&self.angular, &self.linear);
        self.expressed_in_frame = frame;
        Ok(())
    }
}
