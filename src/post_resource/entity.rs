//! [`ResourceEntity`] implementation for [`Post`].

use super::PostContext;
use crate::model::{Post, PostCreate, PostUpdate, PostView, UserSummary};
use async_trait::async_trait;
use chrono::Utc;
use resource_framework::{RecordId, Related, ResourceApi, ResourceEntity, ValidationError};
use tracing::warn;
use uuid::Uuid;

fn required(field: &str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl ResourceEntity for Post {
    const NAME: &'static str = "posts";
    const REFERENCES: &'static [&'static str] = &["users"];
    type Create = PostCreate;
    type Update = PostUpdate;
    type View = PostView;
    type Context = PostContext;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn author(&self) -> Option<&str> {
        Some(&self.author)
    }

    fn from_create_params(params: PostCreate) -> Result<Self, ValidationError> {
        let now = Utc::now();
        Ok(Self {
            id: None,
            code: Uuid::new_v4().simple().to_string(),
            title: required("title", params.title)?,
            content: params.content,
            author: required("author", params.author)?,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(&mut self, update: PostUpdate) -> Result<bool, ValidationError> {
        let title = update.title.map(|t| required("title", t)).transpose()?;
        let mut changed = false;
        if let Some(title) = title {
            self.title = title;
            changed = true;
        }
        if let Some(content) = update.content {
            self.content = content;
            changed = true;
        }
        if changed {
            self.updated_at = Utc::now();
        }
        Ok(changed)
    }

    fn to_view(&self) -> PostView {
        PostView {
            code: self.code.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            author: Some(Related::code(self.author.clone())),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Embeds the author's summary. A missing author, or one that cannot be
    /// looked up, becomes `null`.
    async fn populate(mut view: PostView, ctx: &PostContext) -> PostView {
        let Some(code) = view.author.as_ref().and_then(Related::as_code).map(str::to_string)
        else {
            return view;
        };
        view.author = match ctx.users.model(&code).await {
            Ok(Some(user)) => Some(Related::Populated(UserSummary::from(&user))),
            Ok(None) => None,
            Err(e) => {
                warn!(post = %view.code, author = %code, error = %e, "Author lookup failed");
                None
            }
        };
        view
    }
}
