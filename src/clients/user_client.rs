use crate::model::{User, UserCreate, UserUpdate, UserView};
use crate::user_resource::UserError;
use async_trait::async_trait;
use resource_framework::{Actor, ResourceApi, ResourceClient, ResourceError};
use tracing::{debug, instrument};

/// Client for the users resource.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl UserClient {
    pub fn new(inner: ResourceClient<User>) -> Self {
        Self { inner }
    }

    /// Creates a user. The password-reset mail is sent in the background; its
    /// outcome is published as an event, not returned here.
    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn create_user(
        &self,
        params: UserCreate,
        actor: Option<Actor>,
    ) -> Result<UserView, UserError> {
        debug!("Sending request");
        self.inner.create(params, actor).await.map_err(Self::map_error)
    }

    #[instrument(skip(self, update))]
    pub async fn update_user(
        &self,
        code: &str,
        update: UserUpdate,
        actor: Option<Actor>,
    ) -> Result<UserView, UserError> {
        debug!(?update, "Sending request");
        self.inner
            .update(code, update, actor)
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ResourceApi<User> for UserClient {
    type Error = UserError;

    fn inner(&self) -> &ResourceClient<User> {
        &self.inner
    }

    fn map_error(e: ResourceError) -> UserError {
        UserError::from(e)
    }
}
