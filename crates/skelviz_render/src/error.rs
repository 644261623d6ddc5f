//! Error types for composition and export.

use skelviz_core::error::PoseError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for rendering and export operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while composing an animation or exporting it.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Truncating to the shortest panel left zero frames, or no panels were
    /// given at all.
    #[error("animation has no frames to render")]
    EmptyAnimation,

    /// Panels have different lengths and the strict length policy is active.
    #[error("panel '{title}' has {found} frames, expected {expected}")]
    LengthMismatch {
        title: String,
        expected: usize,
        found: usize,
    },

    /// The external video encoder binary could not be found.
    #[error("ffmpeg not found. Ensure it is installed and in PATH")]
    EncoderUnavailable,

    /// The external video encoder exited with a non-zero status. Frame files
    /// already written are preserved so encoding can be retried manually.
    #[error("ffmpeg exited with status {exit_code}: {stderr}")]
    EncoderFailed { exit_code: i32, stderr: String },

    /// The dense body-model collaborator is not available.
    #[error("no body model registered; dense mesh visualization is unavailable")]
    ModelUnavailable,

    /// A frame image could not be encoded.
    #[error("failed to encode frame image: {0}")]
    Image(#[from] image::ImageError),

    /// IO error during frame writing or directory management.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An upstream pose error (shape or rotation validity).
    #[error(transparent)]
    Pose(#[from] PoseError),
}

impl RenderError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::EncoderFailed {
            exit_code: 1,
            stderr: "unknown encoder".to_string(),
        };
        assert!(err.to_string().contains("status 1"));

        let err = RenderError::EmptyAnimation;
        assert!(err.to_string().contains("no frames"));
    }
}
