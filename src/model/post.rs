use super::UserSummary;
use chrono::{DateTime, Utc};
use resource_framework::{RecordId, Related};
use serde::{Deserialize, Serialize};

/// A post written by a user. `author` holds the user's code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub code: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostCreate {
    pub title: String,
    pub content: String,
    pub author: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// The externally visible fields of a [`Post`]. `author` is `null` once the
/// referenced user is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub code: String,
    pub title: String,
    pub content: String,
    pub author: Option<Related<UserSummary>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
