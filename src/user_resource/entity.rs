//! [`ResourceEntity`] implementation for [`User`].
//!
//! New users get generated credentials: a random placeholder password, a
//! password-reset token valid for 24 hours, `passwordLess` and `verified` set.
//! After the create commits, the reset link is mailed to them.

use super::UserContext;
use crate::model::{Profile, SocialLinks, User, UserCreate, UserUpdate, UserView};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use resource_framework::{RecordId, ResourceEntity, SideEffectError, ValidationError};
use uuid::Uuid;

const SECRET_BYTES: usize = 25;
const RESET_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_ROLE: &str = "user";
const ACTIVE: i32 = 1;

/// Random hex secret used for generated passwords and reset tokens.
pub fn generate_secret() -> String {
    hex::encode(rand::random::<[u8; SECRET_BYTES]>())
}

fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ValidationError::new("email", "must be a valid e-mail address")),
    }
}

fn normalize_username(username: &str) -> Result<String, ValidationError> {
    let username = username.trim();
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(
            "username",
            "must be non-empty and contain no whitespace",
        ));
    }
    Ok(username.to_string())
}

#[async_trait]
impl ResourceEntity for User {
    const NAME: &'static str = "users";
    type Create = UserCreate;
    type Update = UserUpdate;
    type View = UserView;
    type Context = UserContext;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("email", self.email.clone())];
        if let Some(username) = &self.username {
            fields.push(("username", username.clone()));
        }
        fields
    }

    fn from_create_params(params: UserCreate) -> Result<Self, ValidationError> {
        let email = normalize_email(&params.email)?;
        let username = params.username.as_deref().map(normalize_username).transpose()?;
        let now = Utc::now();

        Ok(Self {
            id: None,
            code: Uuid::new_v4().simple().to_string(),
            full_name: params.full_name,
            email,
            username,
            password: Some(generate_secret()),
            password_less: true,
            password_less_token: None,
            provider: params.provider,
            profile: params.profile.unwrap_or_default(),
            social_links: params.social_links.unwrap_or_default(),
            roles: params.roles.unwrap_or_else(|| vec![DEFAULT_ROLE.to_string()]),
            reset_password_token: Some(generate_secret()),
            reset_password_expires: Some(now + Duration::hours(RESET_TOKEN_TTL_HOURS)),
            verified: true,
            verify_token: params.verify_token,
            api_key: params.api_key,
            last_login: params.last_login,
            locale: params.locale,
            status: params.status.unwrap_or(ACTIVE),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(&mut self, update: UserUpdate) -> Result<bool, ValidationError> {
        // Validate everything before touching the record.
        let email = update.email.as_deref().map(normalize_email).transpose()?;
        let username = update.username.as_deref().map(normalize_username).transpose()?;

        let mut changed = false;
        let mut set = |present: bool| changed |= present;

        set(replace_some(&mut self.full_name, update.full_name));
        if let Some(email) = email {
            self.email = email;
            set(true);
        }
        set(replace_some(&mut self.username, username));
        set(replace_some(&mut self.password, update.password));
        set(replace(&mut self.password_less, update.password_less));
        set(replace_some(&mut self.password_less_token, update.password_less_token));
        set(replace_some(&mut self.provider, update.provider));
        set(replace::<Profile>(&mut self.profile, update.profile));
        set(replace::<SocialLinks>(&mut self.social_links, update.social_links));
        set(replace(&mut self.roles, update.roles));
        set(replace_some(&mut self.reset_password_token, update.reset_password_token));
        set(replace_some(&mut self.reset_password_expires, update.reset_password_expires));
        set(replace(&mut self.verified, update.verified));
        set(replace_some(&mut self.verify_token, update.verify_token));
        set(replace_some(&mut self.api_key, update.api_key));
        set(replace_some(&mut self.last_login, update.last_login));
        set(replace_some(&mut self.locale, update.locale));
        set(replace(&mut self.status, update.status));

        if changed {
            self.updated_at = Utc::now();
        }
        Ok(changed)
    }

    fn to_view(&self) -> UserView {
        UserView {
            code: self.code.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            provider: self.provider.clone(),
            profile: self.profile.clone(),
            social_links: self.social_links.clone(),
            roles: self.roles.clone(),
            verified: self.verified,
            api_key: self.api_key.clone(),
            last_login: self.last_login,
            locale: self.locale.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    async fn after_create(
        &self,
        _view: &UserView,
        ctx: &UserContext,
    ) -> Result<Option<String>, SideEffectError> {
        ctx.send_reset_link(self).await
    }
}

fn replace<V>(field: &mut V, value: Option<V>) -> bool {
    match value {
        Some(value) => {
            *field = value;
            true
        }
        None => false,
    }
}

fn replace_some<V>(field: &mut Option<V>, value: Option<V>) -> bool {
    match value {
        Some(value) => {
            *field = Some(value);
            true
        }
        None => false,
    }
}
