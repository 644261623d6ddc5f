//! Error types for the pose pipeline.

use crate::types::RotationRep;
use thiserror::Error;

/// Result type for pose and kinematics operations.
pub type PoseResult<T> = Result<T, PoseError>;

/// Errors that can occur while converting representations or solving
/// forward kinematics.
#[derive(Debug, Error)]
pub enum PoseError {
    /// The trailing dimension of an input array does not match the declared
    /// representation.
    #[error("shape mismatch for {rep:?} input: expected the trailing dimension to be {expected} values ({joints} joints x {dof} dof), got {found}")]
    ShapeMismatch {
        rep: RotationRep,
        joints: usize,
        dof: usize,
        expected: usize,
        found: usize,
    },

    /// A rotation matrix failed validation where correction was not requested.
    #[error("'{label}': rotation matrix at frame {frame}, joint {joint} is not a valid rotation")]
    InvalidRotation {
        label: String,
        frame: usize,
        joint: usize,
    },

    /// The parent-index array does not describe a tree rooted at joint 0.
    #[error("invalid skeleton: {reason}")]
    InvalidSkeleton { reason: String },
}

impl PoseError {
    pub fn invalid_skeleton(reason: impl Into<String>) -> Self {
        Self::InvalidSkeleton {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoseError::InvalidRotation {
            label: "target".to_string(),
            frame: 17,
            joint: 3,
        };
        assert!(err.to_string().contains("target"));
        assert!(err.to_string().contains("frame 17"));

        let err = PoseError::ShapeMismatch {
            rep: RotationRep::Quaternion,
            joints: 15,
            dof: 4,
            expected: 60,
            found: 45,
        };
        assert!(err.to_string().contains("60"));
        assert!(err.to_string().contains("45"));
    }
}
