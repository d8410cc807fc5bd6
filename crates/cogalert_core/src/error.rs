//! # Dispatch Error Types
//!
//! Errors raised at the producer/consumer boundary.

use thiserror::Error;

/// Errors that can occur while handing alerts to the consumer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// An alert was enqueued, or a drain requested, before any consumer
    /// was attached to the queue.
    #[error("no consumer attached to the dispatch queue")]
    UninitializedConsumer,

    /// A second consumer tried to attach while one is already draining.
    #[error("dispatch queue already has a consumer attached")]
    ConsumerAlreadyAttached,
}

/// Error returned by a display capability while rendering an alert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The renderer refused or failed to show the alert.
    #[error("failed to display alert: {reason}")]
    Rejected {
        /// Renderer-provided reason.
        reason: String,
    },

    /// The renderer is not ready to show anything yet.
    #[error("display unavailable")]
    Unavailable,
}

impl DisplayError {
    /// Shorthand for [`DisplayError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
