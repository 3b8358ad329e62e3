use chrono::{DateTime, Utc};
use resource_framework::RecordId;
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// Most accounts are created by an administrator or a social login, so a new
/// user starts password-less with a generated reset token; the reset mail
/// lets them choose a password.
///
/// Everything here is persisted, including the credential fields. What leaves
/// the service is [`UserView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub code: String,
    pub full_name: Option<String>,
    pub email: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_less: bool,
    pub password_less_token: Option<String>,
    pub provider: Option<String>,
    pub profile: Profile,
    pub social_links: SocialLinks,
    pub roles: Vec<String>,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<DateTime<Utc>>,
    pub verified: bool,
    pub verify_token: Option<String>,
    pub api_key: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub locale: Option<String>,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub picture: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub google: Option<String>,
    pub github: Option<String>,
}

/// Payload for creating a user. Credentials are not accepted here; they are
/// generated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub full_name: Option<String>,
    pub email: String,
    pub username: Option<String>,
    pub provider: Option<String>,
    pub profile: Option<Profile>,
    pub social_links: Option<SocialLinks>,
    pub roles: Option<Vec<String>>,
    pub verify_token: Option<String>,
    pub api_key: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub locale: Option<String>,
    pub status: Option<i32>,
}

/// Partial update: `None` leaves the field alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_less: Option<bool>,
    pub password_less_token: Option<String>,
    pub provider: Option<String>,
    pub profile: Option<Profile>,
    pub social_links: Option<SocialLinks>,
    pub roles: Option<Vec<String>>,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<DateTime<Utc>>,
    pub verified: Option<bool>,
    pub verify_token: Option<String>,
    pub api_key: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub locale: Option<String>,
    pub status: Option<i32>,
}

/// The externally visible fields of a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub code: String,
    pub full_name: Option<String>,
    pub email: String,
    pub username: Option<String>,
    pub provider: Option<String>,
    pub profile: Profile,
    pub social_links: SocialLinks,
    pub roles: Vec<String>,
    pub verified: bool,
    pub api_key: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub locale: Option<String>,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What other resources embed when they reference a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub code: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            code: user.code.clone(),
            full_name: user.full_name.clone(),
            username: user.username.clone(),
        }
    }
}
