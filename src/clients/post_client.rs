use crate::model::{Post, PostCreate, PostUpdate, PostView};
use crate::post_resource::PostError;
use async_trait::async_trait;
use resource_framework::{Actor, ResourceApi, ResourceClient, ResourceError};
use tracing::{debug, instrument};

/// Client for the posts resource.
#[derive(Clone)]
pub struct PostClient {
    inner: ResourceClient<Post>,
}

impl PostClient {
    pub fn new(inner: ResourceClient<Post>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, params), fields(author = %params.author))]
    pub async fn create_post(
        &self,
        params: PostCreate,
        actor: Option<Actor>,
    ) -> Result<PostView, PostError> {
        debug!("Sending request");
        self.inner.create(params, actor).await.map_err(Self::map_error)
    }

    #[instrument(skip(self, update))]
    pub async fn update_post(
        &self,
        code: &str,
        update: PostUpdate,
        actor: Option<Actor>,
    ) -> Result<PostView, PostError> {
        debug!(?update, "Sending request");
        self.inner
            .update(code, update, actor)
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ResourceApi<Post> for PostClient {
    type Error = PostError;

    fn inner(&self) -> &ResourceClient<Post> {
        &self.inner
    }

    fn map_error(e: ResourceError) -> PostError {
        PostError::from(e)
    }
}
