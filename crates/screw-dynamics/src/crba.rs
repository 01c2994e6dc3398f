//! Composite Rigid Body Algorithm.

use screw_math::{DMat, MassProperties};
use screw_model::{BodyId, KinematicTree};
use screw_spatial::{SpatialInertia, Wrench};
use tracing::trace;

use crate::{DynamicsError, MassMatrixCalculator, Result};

/// Mass matrix from composite inertias.
///
/// Each body's composite inertia lumps its own inertia with everything
/// distal to it. Entry `M[i, j]` for joint `j` at or below joint `i` is the
/// composite inertia of `j`'s successor, mapped through `j`'s motion
/// subspace and projected onto `i`'s.
#[derive(Debug, Clone)]
pub struct CompositeRigidBodyMassMatrixCalculator {
    composites: Vec<Option<SpatialInertia>>,
    mass_matrix: DMat,
}

impl CompositeRigidBodyMassMatrixCalculator {
    pub fn new(tree: &KinematicTree) -> Self {
        Self {
            composites: vec![None; tree.num_bodies()],
            mass_matrix: DMat::zeros(0, 0),
        }
    }

    fn compute_composites(&mut self, tree: &KinematicTree) -> Result<()> {
        let frames = tree.frames();
        for (id, body) in tree.bodies() {
            let frame = body.body_frame();
            self.composites[id.index()] = Some(
                body.inertia()
                    .copied()
                    .unwrap_or_else(|| SpatialInertia::in_body_frame(frame, MassProperties::zero())),
            );
        }
        for &id in tree.joint_order().iter().rev() {
            let joint = tree.joint(id)?;
            let predecessor = joint.predecessor();
            let predecessor_frame = tree.body(predecessor)?.body_frame();
            let distal = self.composite(joint.successor().index())?
                .changed_frame(frames, predecessor_frame)?;
            if let Some(proximal) = self.composites[predecessor.index()].as_mut() {
                proximal.add(&distal)?;
            }
        }
        Ok(())
    }

    fn composite(&self, index: usize) -> Result<SpatialInertia> {
        self.composites[index].ok_or(DynamicsError::NotComputed { what: "composite inertia" })
    }

    /// Composite inertia of `body` and its descendants, in the body frame.
    pub fn composite_inertia(&self, body: BodyId) -> Result<SpatialInertia> {
        self.composites
            .get(body.index())
            .copied()
            .flatten()
            .ok_or(DynamicsError::NotComputed { what: "composite inertia" })
    }
}

impl MassMatrixCalculator for CompositeRigidBodyMassMatrixCalculator {
    fn compute(&mut self, tree: &KinematicTree) -> Result<()> {
        if self.composites.len() != tree.num_bodies() {
            return Err(DynamicsError::TreeMismatch {
                what: "bodies",
                expected: self.composites.len(),
                actual: tree.num_bodies(),
            });
        }
        tree.check_frames_current()?;
        self.compute_composites(tree)?;

        let frames = tree.frames();
        let n = tree.dof();
        let mut m = DMat::zeros(n, n);

        for &i in tree.joint_order() {
            let joint = tree.joint(i)?;
            if joint.dof() == 0 {
                continue;
            }
            let offset_i = tree.velocity_offset(i)?;
            let successor_frame = tree.body(joint.successor())?.body_frame();
            let inertia = self.composite(joint.successor().index())?;
            let subspace = joint.motion_subspace().changed_frame(frames, successor_frame)?;

            // F = Ic S_i, one wrench per column
            let mut forces: Vec<Wrench> = (0..joint.dof())
                .filter_map(|k| subspace.unit_twist(k))
                .map(|s| {
                    let (angular, linear) = inertia.mass_properties.mul_motion(&s.angular, &s.linear);
                    Wrench::new(successor_frame, successor_frame, angular, linear)
                })
                .collect();

            let mut current = i;
            loop {
                let ancestor = tree.joint(current)?;
                let offset_j = tree.velocity_offset(current)?;
                let projector = ancestor.motion_subspace();
                for (k, force) in forces.iter_mut().enumerate() {
                    force.change_frame(frames, ancestor.frame_after())?;
                    // transmitted across the ancestor joint to its frame-after
                    force.set_body_frame(ancestor.frame_after());
                    let column = projector.project(force)?;
                    for (l, &value) in column.iter().enumerate() {
                        m[(offset_j + l, offset_i + k)] = value;
                        m[(offset_i + k, offset_j + l)] = value;
                    }
                }
                match tree.body(ancestor.predecessor())?.parent_joint() {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        trace!(dof = n, "composite rigid body mass matrix computed");
        self.mass_matrix = m;
        Ok(())
    }

    fn mass_matrix(&self) -> &DMat {
        &self.mass_matrix
    }
}
