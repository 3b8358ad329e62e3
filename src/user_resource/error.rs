//! Error types for the user resource.

use resource_framework::{ResourceError, ValidationError};
use thiserror::Error;

/// Errors returned by [`UserClient`](crate::clients::UserClient).
#[derive(Debug, Error)]
pub enum UserError {
    /// The requested user was not found.
    #[error("User not found: {0}")]
    NotFound(String),

    /// Another user already holds this email or username.
    #[error("{message}")]
    DuplicateField { field: String, message: String },

    /// The user data provided is invalid.
    #[error("User validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage, cache or actor failure.
    #[error(transparent)]
    Resource(ResourceError),
}

impl From<ResourceError> for UserError {
    fn from(e: ResourceError) -> Self {
        match e {
            ResourceError::NotFound { code, .. } => UserError::NotFound(code),
            ResourceError::DuplicateField { field, message } => {
                UserError::DuplicateField { field, message }
            }
            ResourceError::Validation(v) => UserError::Validation(v),
            other => UserError::Resource(other),
        }
    }
}

impl UserError {
    pub fn status(&self) -> u16 {
        match self {
            UserError::NotFound(_) => 404,
            UserError::DuplicateField { .. } | UserError::Validation(_) => 400,
            UserError::Resource(e) => e.status(),
        }
    }
}
