// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for device-data stream processing.
//!
//! [`DeviceDataError`] is the single error type carried in-band by every
//! operator (see [`StreamItem`](crate::StreamItem)) and returned by the
//! synchronous batch APIs.
//!
//! # Examples
//!
//! ```
//! use devicedata_core::{DeviceDataError, Result};
//!
//! fn parse_batch() -> Result<()> {
//!     Err(DeviceDataError::invalid_record("expected a JSON object"))
//! }
//!
//! assert!(parse_batch().is_err());
//! ```

/// Root error type for all device-data operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceDataError {
    /// Both halves of a dual-wave bolus were seen but their correlation keys differ.
    ///
    /// A wrong dose reconciliation is worse than no reconciliation, so this is
    /// never recovered locally: the conversion of the whole batch is aborted.
    #[error("Mismatched joinKeys[{normal_join_key}][{square_join_key}] at ts[{device_time}]")]
    JoinKeyMismatch {
        /// `joinKey` of the `dual/normal` half
        normal_join_key: String,
        /// `joinKey` of the `dual/square` half
        square_join_key: String,
        /// `deviceTime` of the `dual/normal` half
        device_time: String,
    },

    /// Input could not be interpreted as a record
    #[error("Invalid record: {context}")]
    InvalidRecord {
        /// What was wrong with the input
        context: String,
    },

    /// Stream processing encountered an error
    ///
    /// This is a general error for stream operations that don't fit
    /// other specific categories.
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong during stream processing
        context: String,
    },

    /// Custom error from user code
    ///
    /// Wraps errors produced by user-provided detectors and join sessions.
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DeviceDataError {
    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Create an invalid record error with the given context
    pub fn invalid_record(context: impl Into<String>) -> Self {
        Self::InvalidRecord {
            context: context.into(),
        }
    }

    /// Create a join key mismatch error
    pub fn join_key_mismatch(
        normal_join_key: impl Into<String>,
        square_join_key: impl Into<String>,
        device_time: impl Into<String>,
    ) -> Self {
        Self::JoinKeyMismatch {
            normal_join_key: normal_join_key.into(),
            square_join_key: square_join_key.into(),
            device_time: device_time.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Check if this is a recoverable error
    ///
    /// Nothing in the join pipeline is retried, so no error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }

    /// Check if this error indicates a permanent failure
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::JoinKeyMismatch { .. } | Self::StreamProcessingError { .. } | Self::UserError(_)
        )
    }
}

/// Specialized Result type for device-data operations
pub type Result<T> = std::result::Result<T, DeviceDataError>;

/// Helper trait for adding context to `Result`s
///
/// This allows chaining context information onto errors in a fluent style.
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// # Errors
    /// Returns `Err(DeviceDataError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// # Errors
    /// Returns `Err(DeviceDataError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DeviceDataError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.with_context(|| context.into())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            DeviceDataError::UserError(inner) => DeviceDataError::StreamProcessingError {
                context: format!("{}: {inner}", f()),
            },
            other => other,
        })
    }
}

impl From<serde_json::Error> for DeviceDataError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidRecord {
            context: error.to_string(),
        }
    }
}

impl Clone for DeviceDataError {
    fn clone(&self) -> Self {
        match self {
            Self::JoinKeyMismatch {
                normal_join_key,
                square_join_key,
                device_time,
            } => Self::JoinKeyMismatch {
                normal_join_key: normal_join_key.clone(),
                square_join_key: square_join_key.clone(),
                device_time: device_time.clone(),
            },
            Self::InvalidRecord { context } => Self::InvalidRecord {
                context: context.clone(),
            },
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            // The boxed error can't be cloned, keep its message
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
        }
    }
}
