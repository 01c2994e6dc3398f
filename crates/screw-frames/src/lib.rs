//! Reference frame graph.
//!
//! Every body and joint in a kinematic tree owns one or more frames. Frames
//! form a forest of trees; each non-root frame stores its transform to its
//! parent. Transforms to the root are composed lazily and cached against a
//! per-frame generation. Moving a frame bumps the generation of its
//! descendants, so a repeated query is a single comparison.

pub mod error;
pub mod geometry;
pub mod tree;

pub use error::{FrameError, Result};
pub use geometry::{FramePoint, FrameVector};
pub use tree::{FrameId, FrameTree};
