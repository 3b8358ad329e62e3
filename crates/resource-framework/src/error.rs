//! # Framework Errors
//!
//! This module defines the error types shared by every resource pipeline.
//! By centralizing error definitions, callers match on named variants
//! (`NotFound { code }`, `DuplicateField { field }`) instead of probing
//! ad-hoc properties on a generic error.
//!
//! ## Propagation
//!
//! - Accessor failures travel up unchanged as [`ResourceError::Accessor`],
//!   except uniqueness conflicts, which are rewritten by
//!   [`crate::conflict::translate_conflict`] before they reach the caller.
//! - [`SideEffectError`] never becomes a `ResourceError`: the pipeline turns it
//!   into an `error` change event.

use std::time::Duration;

/// Errors raised by a [`CollectionAccessor`](crate::accessor::CollectionAccessor).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AccessorError {
    /// A unique index rejected the write. `detail` is the raw, backend-specific
    /// message naming the violated index.
    #[error("unique constraint violated: {detail}")]
    Conflict { detail: String },
    /// The backend could not be reached.
    #[error("collection unavailable: {message}")]
    Unavailable { message: String },
    /// The call did not complete within the configured budget.
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },
    /// Any other backend failure.
    #[error("collection backend failure: {message}")]
    Backend { message: String },
}

/// Inbound fields rejected before they reach the accessor.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid field `{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of a best-effort step run after an action succeeded.
///
/// `code` is the message code published in the `error` change event
/// (e.g. `UnableToSendEmail`).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct SideEffectError {
    pub code: String,
    pub message: String,
}

impl SideEffectError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors returned to callers of a resource action.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("{resource} not found: {code}")]
    NotFound { resource: &'static str, code: String },

    #[error("{message}")]
    DuplicateField { field: String, message: String },

    /// Uniqueness violation whose detail could not be attributed to a field.
    #[error("{message}")]
    Conflict { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Accessor(AccessorError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Actor closed")]
    ActorClosed,

    #[error("Actor dropped response channel")]
    ActorDropped,
}

impl ResourceError {
    /// HTTP-equivalent status for transport bindings.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::DuplicateField { .. } | Self::Conflict { .. } | Self::Validation(_) => 400,
            Self::ActorClosed | Self::ActorDropped => 503,
            Self::Accessor(AccessorError::Unavailable { .. })
            | Self::Accessor(AccessorError::Timeout { .. }) => 503,
            Self::Accessor(_) | Self::Serialization(_) => 500,
        }
    }

    /// Client errors are never worth retrying.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}
