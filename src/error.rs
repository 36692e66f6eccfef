// THEORY:
// One error type for the whole engine. Only an unusable input image or an
// invalid configuration aborts an analysis; a failing detector category is
// reported as `DetectionFailed` and downgraded by the caller to "no subjects".

use thiserror::Error;

use crate::core_modules::subject_detector::DetectionCategory;

/// Result type for composition analysis operations.
pub type CompositionResult<T> = Result<T, CompositionError>;

/// Errors that can occur while analyzing an image or frame.
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Subject detection failed for {category:?}: {message}")]
    DetectionFailed {
        category: DetectionCategory,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompositionError {
    /// Create an invalid image error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    /// Create a detection failure error for one detector category.
    pub fn detection_failed(category: DetectionCategory, message: impl Into<String>) -> Self {
        Self::DetectionFailed {
            category,
            message: message.into(),
        }
    }

    /// Wrap a decoder failure as an invalid image.
    pub fn undecodable(source: image::ImageError) -> Self {
        Self::InvalidImage(format!("cannot decode image: {source}"))
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the analysis can continue with "no evidence" for the failed part.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DetectionFailed { .. })
    }
}
