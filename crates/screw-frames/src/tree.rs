//! Arena-backed frame forest with generation-checked transform caches.

use std::cell::{Cell, RefCell};
use std::fmt;

use screw_math::RigidTransform;

use crate::{FrameError, Result};

/// Handle to a frame in a [`FrameTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

impl FrameId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedTransform {
    /// Generation of the owning frame when this was composed.
    generation: u64,
    transform: RigidTransform,
}

#[derive(Debug, Clone)]
struct FrameNode {
    name: String,
    parent: Option<FrameId>,
    children: Vec<FrameId>,
    root: FrameId,
    depth: usize,
    transform_to_parent: Option<RigidTransform>,
    generation: u64,
    to_root: RefCell<Option<CachedTransform>>,
}

impl FrameNode {
    fn new(name: String, parent: Option<FrameId>, root: FrameId, depth: usize) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            root,
            depth,
            transform_to_parent: None,
            generation: 0,
            to_root: RefCell::new(None),
        }
    }

    /// Roots are always current; everything else needs a cache composed at
    /// the present generation.
    fn cached_to_root(&self) -> Option<RigidTransform> {
        if self.parent.is_none() {
            return Some(RigidTransform::identity());
        }
        match *self.to_root.borrow() {
            Some(c) if c.generation == self.generation => Some(c.transform),
            _ => None,
        }
    }
}

/// A forest of reference frames.
///
/// `FrameTree::new` creates the world frame. Additional roots can be added
/// with [`FrameTree::add_root`]; frames under different roots are
/// disconnected and cannot be related.
///
/// Setting a transform bumps the generation of the frame and of every
/// descendant whose cache is still current. A descendant that is already
/// stale has a stale subtree, so the walk stops there.
#[derive(Debug, Clone)]
pub struct FrameTree {
    nodes: Vec<FrameNode>,
    world: FrameId,
    compositions: Cell<u64>,
}

impl Default for FrameTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            world: FrameId(0),
            compositions: Cell::new(0),
        };
        tree.world = tree.add_root("world");
        tree
    }

    /// The inertial root frame.
    pub fn world(&self) -> FrameId {
        self.world
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, frame: FrameId) -> bool {
        frame.0 < self.nodes.len()
    }

    /// Add an independent root frame.
    pub fn add_root(&mut self, name: impl Into<String>) -> FrameId {
        let id = FrameId(self.nodes.len());
        let name = name.into();
        tracing::debug!(%id, %name, "adding root frame");
        self.nodes.push(FrameNode::new(name, None, id, 0));
        id
    }

    /// Add a frame whose transform to `parent` is not known yet.
    ///
    /// Any query through it fails with [`FrameError::Uninitialized`] until
    /// [`set_transform_to_parent`](Self::set_transform_to_parent) is called.
    pub fn add_frame(&mut self, name: impl Into<String>, parent: FrameId) -> Result<FrameId> {
        let p = self.node(parent)?;
        let (root, depth) = (p.root, p.depth + 1);
        let id = FrameId(self.nodes.len());
        self.nodes.push(FrameNode::new(name.into(), Some(parent), root, depth));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Add a frame rigidly attached to `parent`.
    pub fn add_fixed_frame(
        &mut self,
        name: impl Into<String>,
        parent: FrameId,
        transform_to_parent: RigidTransform,
    ) -> Result<FrameId> {
        let id = self.add_frame(name, parent)?;
        self.set_transform_to_parent(id, transform_to_parent)?;
        Ok(id)
    }

    /// Set a frame's pose in its parent and invalidate every cache below it.
    pub fn set_transform_to_parent(&mut self, frame: FrameId, transform: RigidTransform) -> Result<()> {
        let node = self.node_mut(frame)?;
        if node.parent.is_none() {
            return Err(FrameError::RootTransform {
                frame: node.name.clone(),
            });
        }
        let drift = (transform.rotation.transpose() * transform.rotation
            - screw_math::Mat3::identity())
        .abs()
        .max();
        if drift > 1e-6 {
            tracing::warn!(frame = %node.name, drift, "rotation is not orthonormal");
        }
        node.transform_to_parent = Some(transform);
        node.generation += 1;

        let mut pending = node.children.clone();
        while let Some(id) = pending.pop() {
            let child = &mut self.nodes[id.0];
            if child.cached_to_root().is_none() {
                continue;
            }
            child.generation += 1;
            pending.extend_from_slice(&child.children);
        }
        Ok(())
    }

    /// Number of root transforms composed so far. Cache hits leave it
    /// unchanged.
    pub fn compositions(&self) -> u64 {
        self.compositions.get()
    }

    pub fn name(&self, frame: FrameId) -> Result<&str> {
        Ok(&self.node(frame)?.name)
    }

    pub fn parent(&self, frame: FrameId) -> Result<Option<FrameId>> {
        Ok(self.node(frame)?.parent)
    }

    pub fn root_of(&self, frame: FrameId) -> Result<FrameId> {
        Ok(self.node(frame)?.root)
    }

    pub fn depth(&self, frame: FrameId) -> Result<usize> {
        Ok(self.node(frame)?.depth)
    }

    /// True if `ancestor` lies on the path from `frame` to its root
    /// (a frame is its own ancestor).
    pub fn is_ancestor(&self, ancestor: FrameId, frame: FrameId) -> Result<bool> {
        self.node(ancestor)?;
        let mut cur = Some(frame);
        while let Some(id) = cur {
            if id == ancestor {
                return Ok(true);
            }
            cur = self.node(id)?.parent;
        }
        Ok(false)
    }

    /// True once every frame on the path to the root has a transform.
    pub fn is_initialized(&self, frame: FrameId) -> Result<bool> {
        let mut cur = frame;
        loop {
            let node = self.node(cur)?;
            match node.parent {
                None => return Ok(true),
                Some(parent) => {
                    if node.transform_to_parent.is_none() {
                        return Ok(false);
                    }
                    cur = parent;
                }
            }
        }
    }

    /// Transform from `frame` to its parent; identity for a root.
    pub fn transform_to_parent(&self, frame: FrameId) -> Result<RigidTransform> {
        let node = self.node(frame)?;
        if node.parent.is_none() {
            return Ok(RigidTransform::identity());
        }
        node.transform_to_parent
            .ok_or_else(|| FrameError::Uninitialized {
                frame: node.name.clone(),
            })
    }

    /// Deepest frame that is an ancestor of both `a` and `b`, or `None` if
    /// they live under different roots.
    pub fn nearest_common_ancestor(&self, a: FrameId, b: FrameId) -> Result<Option<FrameId>> {
        let (mut a, mut b) = (a, b);
        let (mut da, mut db) = (self.depth(a)?, self.depth(b)?);
        if self.root_of(a)? != self.root_of(b)? {
            return Ok(None);
        }
        while da > db {
            a = self.parent_of_non_root(a)?;
            da -= 1;
        }
        while db > da {
            b = self.parent_of_non_root(b)?;
            db -= 1;
        }
        while a != b {
            a = self.parent_of_non_root(a)?;
            b = self.parent_of_non_root(b)?;
        }
        Ok(Some(a))
    }

    /// Pose of `frame` in its root.
    ///
    /// A current cache answers directly. Otherwise the walk climbs to the
    /// nearest current ancestor and recomposes downward, refreshing every
    /// cache it passes.
    pub fn transform_to_root(&self, frame: FrameId) -> Result<RigidTransform> {
        if let Some(xf) = self.node(frame)?.cached_to_root() {
            return Ok(xf);
        }

        let mut stale = Vec::with_capacity(self.nodes[frame.0].depth);
        let mut cur = frame;
        let mut xf = loop {
            let node = &self.nodes[cur.0];
            if let Some(xf) = node.cached_to_root() {
                break xf;
            }
            if node.transform_to_parent.is_none() {
                return Err(FrameError::Uninitialized {
                    frame: node.name.clone(),
                });
            }
            stale.push(cur);
            cur = self.parent_of_non_root(cur)?;
        };

        for &id in stale.iter().rev() {
            let node = &self.nodes[id.0];
            let to_parent = node.transform_to_parent.ok_or_else(|| FrameError::Uninitialized {
                frame: node.name.clone(),
            })?;
            xf = xf.compose(&to_parent);
            *node.to_root.borrow_mut() = Some(CachedTransform {
                generation: node.generation,
                transform: xf,
            });
            self.compositions.set(self.compositions.get() + 1);
        }
        Ok(xf)
    }

    /// Transform expressing `from`'s pose in `to`.
    pub fn transform_to_desired_frame(&self, from: FrameId, to: FrameId) -> Result<RigidTransform> {
        if from == to {
            self.node(from)?;
            return Ok(RigidTransform::identity());
        }
        if self.root_of(from)? != self.root_of(to)? {
            return Err(FrameError::Disconnected {
                from: self.node(from)?.name.clone(),
                to: self.node(to)?.name.clone(),
            });
        }
        let from_root = self.transform_to_root(from)?;
        let to_root = self.transform_to_root(to)?;
        Ok(to_root.inverse().compose(&from_root))
    }

    /// Whether a cached root transform exists and is still current.
    pub fn has_valid_root_cache(&self, frame: FrameId) -> Result<bool> {
        Ok(self.node(frame)?.cached_to_root().is_some())
    }

    fn parent_of_non_root(&self, frame: FrameId) -> Result<FrameId> {
        self.node(frame)?
            .parent
            .ok_or(FrameError::UnknownFrame(frame))
    }

    fn node(&self, frame: FrameId) -> Result<&FrameNode> {
        self.nodes
            .get(frame.0)
            .ok_or(FrameError::UnknownFrame(frame))
    }

    fn node_mut(&mut self, frame: FrameId) -> Result<&mut FrameNode> {
        self.nodes
            .get_mut(frame.0)
            .ok_or(FrameError::UnknownFrame(frame))
    }
}
