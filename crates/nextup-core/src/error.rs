//! Core error types for nextup-core.
//!
//! The engine has a small failure surface: time-of-day strings can fail to
//! parse, and a repeat period can be non-positive. Both are surfaced
//! synchronously at the call site. Operations with no qualifying target
//! (completing a step on a task with none left, replacing a next step that
//! does not exist) are defined as no-ops, not errors.

use thiserror::Error;

/// Core error type for nextup-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Time-of-day parse errors
    #[error("Time parse error: {0}")]
    TimeParse(#[from] TimeParseError),

    /// Invariant violations raised at construction
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from parsing a time-of-day string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// Input did not match any accepted time format
    #[error("Unrecognized time format: {0:?}")]
    Unrecognized(String),

    /// Hour outside the valid range for the detected convention
    #[error("Hour {hour} out of range for {convention} time")]
    HourOutOfRange { hour: u32, convention: &'static str },

    /// Minute outside 0-59
    #[error("Minute {0} out of range")]
    MinuteOutOfRange(u32),
}

/// Invariant violations raised at construction, never silently clamped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A repeat period must be strictly positive
    #[error("Repeat period must be positive, got {millis} ms")]
    NonPositivePeriod { millis: i64 },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
