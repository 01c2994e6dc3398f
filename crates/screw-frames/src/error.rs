//! Error types for frame queries and frame-tagged arithmetic.

use thiserror::Error;

use crate::FrameId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// The two frames do not share a root.
    #[error("frames '{from}' and '{to}' are not connected")]
    Disconnected { from: String, to: String },

    /// A frame on the queried path has never had its transform set.
    #[error("frame '{frame}' has no transform to its parent yet")]
    Uninitialized { frame: String },

    /// Operands carry incompatible frame tags.
    #[error("frame mismatch in {operation}: expected {expected}, got {actual}")]
    Mismatch {
        operation: &'static str,
        expected: FrameId,
        actual: FrameId,
    },

    /// Roots are fixed by definition.
    #[error("cannot set the transform of root frame '{frame}'")]
    RootTransform { frame: String },

    #[error("unknown frame {0}")]
    UnknownFrame(FrameId),

    /// Coefficient count does not match the number of basis vectors.
    #[error("{what}: expected {expected} values, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl FrameError {
    /// Fail with [`FrameError::Mismatch`] unless `expected == actual`.
    #[inline]
    pub fn check(operation: &'static str, expected: FrameId, actual: FrameId) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(FrameError::Mismatch {
                operation,
                expected,
                actual,
            })
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
