//! Error types for tree construction and joint state access.

use screw_frames::FrameError;
use thiserror::Error;

use crate::{BodyId, JointId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("unknown body {0}")]
    UnknownBody(BodyId),

    #[error("unknown joint {0}")]
    UnknownJoint(JointId),

    /// A body can be the successor of at most one joint.
    #[error("body '{body}' already has parent joint '{existing}'")]
    MultipleParents { body: String, existing: String },

    #[error("joint '{joint}' closes a cycle through body '{body}'")]
    Cycle { joint: String, body: String },

    /// Every body except the root needs a parent joint.
    #[error("bodies without a parent joint besides the root: {bodies:?}")]
    MultipleRoots { bodies: Vec<String> },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{what}: expected {expected} values, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("joint '{joint}' is {actual}, expected {expected}")]
    WrongJointKind {
        joint: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A joint configuration changed after the last frame update.
    #[error("joint '{joint}' changed since the last frame update")]
    StaleFrames { joint: String },
}

pub type Result<T> = std::result::Result<T, TreeError>;
