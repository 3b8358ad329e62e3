//! Error types for the post resource.

use resource_framework::{ResourceError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("Post validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resource(ResourceError),
}

impl From<ResourceError> for PostError {
    fn from(e: ResourceError) -> Self {
        match e {
            ResourceError::NotFound { code, .. } => PostError::NotFound(code),
            ResourceError::Validation(v) => PostError::Validation(v),
            other => PostError::Resource(other),
        }
    }
}

impl PostError {
    pub fn status(&self) -> u16 {
        match self {
            PostError::NotFound(_) => 404,
            PostError::Validation(_) => 400,
            PostError::Resource(e) => e.status(),
        }
    }
}
