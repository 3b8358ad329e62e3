//! # Serializer & Relation Population
//!
//! Records leave the pipeline only as their resource's
//! [`View`](crate::entity::ResourceEntity::View): the view type *is* the field
//! allow-list, so an internal field can only be exposed by adding it to the
//! view struct.
//!
//! Reference fields are modelled with [`Related`]: the serializer fills in the
//! referenced code, and the resource's `populate` hook swaps it for the
//! embedded object (or clears it when the referenced record is gone).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reference to another resource's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Related<T> {
    Populated(T),
    Code(String),
}

impl<T> Related<T> {
    pub fn code(code: impl Into<String>) -> Self {
        Self::Code(code.into())
    }

    pub fn as_code(&self) -> Option<&str> {
        match self {
            Self::Code(code) => Some(code),
            Self::Populated(_) => None,
        }
    }

    pub fn populated(&self) -> Option<&T> {
        match self {
            Self::Populated(value) => Some(value),
            Self::Code(_) => None,
        }
    }
}

/// JSON form of an action result, as cached and published in events.
pub(crate) fn to_value<V: Serialize>(value: &V) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

pub(crate) fn from_value<V: DeserializeOwned>(value: Value) -> Result<V, serde_json::Error> {
    serde_json::from_value(value)
}
