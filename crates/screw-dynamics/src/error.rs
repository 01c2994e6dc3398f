//! Error types for the dynamics calculators.

use screw_frames::FrameError;
use screw_model::TreeError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DynamicsError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A result was queried before `compute` produced it.
    #[error("{what} is not available; call compute() first")]
    NotComputed { what: &'static str },

    /// A cached result belongs to an earlier configuration.
    #[error("{what} was computed for an earlier configuration; call compute() again")]
    Outdated { what: &'static str },

    /// The calculator was sized for a different tree.
    #[error("calculator expects {expected} {what}, tree has {actual}")]
    TreeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what}: expected {expected} values, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl DynamicsError {
    /// True for a query through a frame whose transform was never set.
    pub fn is_uninitialized_frame(&self) -> bool {
        matches!(
            self,
            DynamicsError::Frame(FrameError::Uninitialized { .. })
                | DynamicsError::Tree(TreeError::Frame(FrameError::Uninitialized { .. }))
        )
    }

    /// True for any operand frame-tag mismatch.
    pub fn is_frame_mismatch(&self) -> bool {
        matches!(
            self,
            DynamicsError::Frame(FrameError::Mismatch { .. })
                | DynamicsError::Tree(TreeError::Frame(FrameError::Mismatch { .. }))
        )
    }
}

pub type Result<T> = std::result::Result<T, DynamicsError>;
