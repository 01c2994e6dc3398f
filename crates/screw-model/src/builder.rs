//! Tree construction from (parent body, joint, child body) edges.

use std::collections::{HashSet, VecDeque};

use screw_frames::FrameTree;
use screw_math::{MassProperties, RigidTransform};
use screw_spatial::SpatialInertia;

use crate::{BodyId, Joint, JointId, JointKind, KinematicTree, Result, RigidBody, TreeError};

struct PendingBody {
    name: String,
    mass: Option<MassProperties>,
    parent_joint: Option<JointId>,
}

struct PendingJoint {
    name: String,
    kind: JointKind,
    parent: BodyId,
    child: BodyId,
    /// Pose of the joint's frame-before in the parent body frame.
    offset: RigidTransform,
}

/// Builder for [`KinematicTree`].
///
/// Bodies are declared first, then connected by joints. `build` validates
/// that every body except the root has exactly one parent joint and that
/// every body is reachable from the root.
pub struct KinematicTreeBuilder {
    bodies: Vec<PendingBody>,
    joints: Vec<PendingJoint>,
}

impl KinematicTreeBuilder {
    /// Start a tree whose fixed root body is called `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            bodies: vec![PendingBody {
                name: root_name.into(),
                mass: None,
                parent_joint: None,
            }],
            joints: Vec::new(),
        }
    }

    pub fn root(&self) -> BodyId {
        BodyId::new(0)
    }

    pub fn add_body(&mut self, name: impl Into<String>, mass: MassProperties) -> BodyId {
        let name = name.into();
        if !mass.is_physical() {
            tracing::warn!(body = %name, ?mass, "non-physical mass properties");
        }
        self.bodies.push(PendingBody {
            name,
            mass: Some(mass),
            parent_joint: None,
        });
        BodyId::new(self.bodies.len() - 1)
    }

    /// Connect `parent` to `child` through a new joint whose frame-before is
    /// placed at `offset` in the parent body frame.
    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        parent: BodyId,
        child: BodyId,
        kind: JointKind,
        offset: RigidTransform,
    ) -> Result<JointId> {
        let name = name.into();
        for id in [parent, child] {
            if id.index() >= self.bodies.len() {
                return Err(TreeError::UnknownBody(id));
            }
        }
        if parent == child || child == self.root() {
            return Err(TreeError::Cycle {
                joint: name,
                body: self.bodies[child.index()].name.clone(),
            });
        }
        if let Some(existing) = self.bodies[child.index()].parent_joint {
            return Err(TreeError::MultipleParents {
                body: self.bodies[child.index()].name.clone(),
                existing: self.joints[existing.index()].name.clone(),
            });
        }
        let id = JointId::new(self.joints.len());
        self.bodies[child.index()].parent_joint = Some(id);
        self.joints.push(PendingJoint {
            name,
            kind,
            parent,
            child,
            offset,
        });
        Ok(id)
    }

    /// Add a body and attach it to `parent` in one step.
    pub fn attach(
        &mut self,
        parent: BodyId,
        joint_name: impl Into<String>,
        kind: JointKind,
        offset: RigidTransform,
        body_name: impl Into<String>,
        mass: MassProperties,
    ) -> Result<(JointId, BodyId)> {
        let body = self.add_body(body_name, mass);
        let joint = self.add_joint(joint_name, parent, body, kind, offset)?;
        Ok((joint, body))
    }

    pub fn build(self) -> Result<KinematicTree> {
        check_unique("body", self.bodies.iter().map(|b| b.name.as_str()))?;
        check_unique("joint", self.joints.iter().map(|j| j.name.as_str()))?;

        let orphans: Vec<String> = self
            .bodies
            .iter()
            .skip(1)
            .filter(|b| b.parent_joint.is_none())
            .map(|b| b.name.clone())
            .collect();
        if !orphans.is_empty() {
            return Err(TreeError::MultipleRoots { bodies: orphans });
        }

        let mut children: Vec<Vec<JointId>> = vec![Vec::new(); self.bodies.len()];
        for (i, joint) in self.joints.iter().enumerate() {
            children[joint.parent.index()].push(JointId::new(i));
        }

        // Breadth-first from the root; anything not reached hangs off a cycle.
        let mut order = Vec::with_capacity(self.joints.len());
        let mut reached = vec![false; self.bodies.len()];
        reached[0] = true;
        let mut queue = VecDeque::from([self.root()]);
        while let Some(body) = queue.pop_front() {
            for &j in &children[body.index()] {
                let child = self.joints[j.index()].child;
                reached[child.index()] = true;
                order.push(j);
                queue.push_back(child);
            }
        }
        if let Some(i) = reached.iter().position(|r| !r) {
            let body = &self.bodies[i];
            let joint = body
                .parent_joint
                .map(|j| self.joints[j.index()].name.clone())
                .unwrap_or_default();
            return Err(TreeError::Cycle {
                joint,
                body: body.name.clone(),
            });
        }

        let mut frames = FrameTree::new();
        let world = frames.world();
        let root_frame = frames.add_fixed_frame(self.bodies[0].name.clone(), world, RigidTransform::identity())?;

        let mut body_frames = vec![None; self.bodies.len()];
        body_frames[0] = Some(root_frame);
        let mut joint_frames = vec![None; self.joints.len()];
        for &j in &order {
            let pending = &self.joints[j.index()];
            // parents precede children in `order`, so the parent frame exists
            let parent_frame = body_frames[pending.parent.index()].ok_or(TreeError::UnknownBody(pending.parent))?;
            let before = frames.add_fixed_frame(format!("{}Before", pending.name), parent_frame, pending.offset)?;
            let after = frames.add_frame(format!("{}After", pending.name), before)?;
            let child = &self.bodies[pending.child.index()];
            body_frames[pending.child.index()] =
                Some(frames.add_fixed_frame(child.name.clone(), after, RigidTransform::identity())?);
            joint_frames[j.index()] = Some((before, after));
        }

        let mut velocity_offsets = vec![0; self.joints.len()];
        let mut configuration_offsets = vec![0; self.joints.len()];
        let (mut dof, mut configuration_dof) = (0, 0);
        for &j in &order {
            velocity_offsets[j.index()] = dof;
            configuration_offsets[j.index()] = configuration_dof;
            dof += self.joints[j.index()].kind.dof();
            configuration_dof += self.joints[j.index()].kind.configuration_dof();
        }

        let bodies = self
            .bodies
            .iter()
            .enumerate()
            .map(|(i, pending)| {
                let body_frame = body_frames[i].ok_or(TreeError::UnknownBody(BodyId::new(i)))?;
                Ok(RigidBody {
                    name: pending.name.clone(),
                    body_frame,
                    inertia: pending.mass.map(|m| SpatialInertia::in_body_frame(body_frame, m)),
                    parent_joint: pending.parent_joint,
                    child_joints: children[i].clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let joints = self
            .joints
            .into_iter()
            .enumerate()
            .map(|(i, pending)| {
                let (frame_before, frame_after) = joint_frames[i].ok_or(TreeError::UnknownJoint(JointId::new(i)))?;
                Ok(Joint {
                    name: pending.name,
                    kind: pending.kind,
                    predecessor: pending.parent,
                    successor: pending.child,
                    frame_before,
                    frame_after,
                    generation: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            bodies = bodies.len(),
            joints = joints.len(),
            dof,
            "built kinematic tree"
        );

        Ok(KinematicTree {
            frames,
            bodies,
            joints,
            root: BodyId::new(0),
            order,
            velocity_offsets,
            configuration_offsets,
            dof,
            configuration_dof,
            updated_generations: None,
        })
    }
}

fn check_unique<'a>(kind: &'static str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TreeError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
