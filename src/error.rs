//! Error types for the encoder core.

use thiserror::Error;

/// Top-level error type. Every failure in this crate is unrecoverable for
/// the current call: the caller fixes its inputs and retries.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid configuration: {option}: {message}")]
    Config {
        option: &'static str,
        message: String,
    },

    #[error("shape mismatch in {tensor}: expected {expected}, got {actual}")]
    Shape {
        tensor: &'static str,
        expected: String,
        actual: String,
    },

    #[error("missing input tensor: {0}")]
    MissingInput(&'static str),
}

impl ModelError {
    pub(crate) fn config(option: &'static str, message: impl Into<String>) -> Self {
        ModelError::Config {
            option,
            message: message.into(),
        }
    }

    pub(crate) fn shape(
        tensor: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        ModelError::Shape {
            tensor,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type ModelResult<T> = Result<T, ModelError>;
