//! Error handling for asmx-store
//!
//! Wraps asmx-core ExError with store-specific helpers

use asmx_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a digest mismatch error
pub fn digest_mismatch(expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("decode")
        .with_message(format!(
            "Payload digest mismatch: header says {}, payload hashes to {}",
            expected, actual
        ))
}

/// Create a malformed input error
pub fn malformed(reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("decode")
        .with_message(reason.to_string())
}

/// Create a serialization error from serde_json::Error
pub fn from_serde(operation: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
