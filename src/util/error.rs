//! Error types for yolopost.

use thiserror::Error;

/// Result alias for yolopost operations.
pub type Result<T> = std::result::Result<T, YoloPostError>;

/// Errors that can occur when decoding and suppressing detector output.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum YoloPostError {
    /// A threshold is not strictly inside (0, 1).
    #[error("{name} must be in (0, 1), got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f32 },
    /// The model resolution cannot be divided into whole grid cells.
    #[error("model size {model_size} is not divisible by stride {stride}")]
    ModelSizeNotDivisible { model_size: usize, stride: usize },
    /// A configuration parameter is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A raw head buffer does not match the expected layout length.
    #[error("head {head} has {got} values, expected {expected}")]
    HeadLengthMismatch {
        head: usize,
        expected: usize,
        got: usize,
    },
    /// The detection buffer cursor ran past its preallocated capacity.
    #[error("detection buffer capacity {capacity} exceeded")]
    CapacityExceeded { capacity: usize },
    /// Internal bookkeeping reached a state that valid input cannot produce.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
    /// The caller-provided output slice is too short.
    #[error("output buffer too small: needed {needed}, got {got}")]
    OutputTooSmall { needed: usize, got: usize },
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {reason}")]
    WorkerPool { reason: String },
}

impl YoloPostError {
    /// Returns true for errors reported before any decode work starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            YoloPostError::ThresholdOutOfRange { .. }
                | YoloPostError::ModelSizeNotDivisible { .. }
                | YoloPostError::InvalidConfig(_)
                | YoloPostError::HeadLengthMismatch { .. }
        )
    }
}
