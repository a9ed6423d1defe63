/// Convenience result type used across framemark.
pub type FramemarkResult<T> = Result<T, FramemarkError>;

/// Top-level error taxonomy used by library APIs.
///
/// Unavailable capabilities (no detector model, no decoded frame yet) and transient
/// tracking failures are not errors; they surface as `Option`/`bool` returns and
/// tracker status instead.
#[derive(thiserror::Error, Debug)]
pub enum FramemarkError {
    /// Invalid user-provided data (times, layers, ids).
    #[error("validation error: {0}")]
    Validation(String),

    /// Tracking bookkeeping misuse (unknown annotation id, missing state).
    #[error("tracking error: {0}")]
    Tracking(String),

    /// Detector model loading or inference failures.
    #[error("detection error: {0}")]
    Detection(String),

    /// Malformed annotation package on import.
    #[error("package error: {0}")]
    Package(String),

    /// Host media service failures (probe, decode).
    #[error("media error: {0}")]
    Media(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramemarkError {
    /// Build a [`FramemarkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FramemarkError::Tracking`] value.
    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking(msg.into())
    }

    /// Build a [`FramemarkError::Detection`] value.
    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection(msg.into())
    }

    /// Build a [`FramemarkError::Package`] value.
    pub fn package(msg: impl Into<String>) -> Self {
        Self::Package(msg.into())
    }

    /// Build a [`FramemarkError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`FramemarkError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FramemarkError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
