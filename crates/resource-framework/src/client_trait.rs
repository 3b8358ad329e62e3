//! # ResourceApi Trait
//!
//! Common interface for resource-specific clients: implement `inner` and
//! `map_error`, and `get`, `model`, `list` and `remove` come for free in the
//! resource's own error type.
use crate::{Actor, ListParams, ResourceClient, ResourceEntity, ResourceError};
use async_trait::async_trait;

/// # Example
///
/// ```rust,ignore
/// pub struct UserClient {
///     inner: ResourceClient<User>,
/// }
///
/// #[async_trait]
/// impl ResourceApi<User> for UserClient {
///     type Error = UserError;
///
///     fn inner(&self) -> &ResourceClient<User> {
///         &self.inner
///     }
///
///     fn map_error(e: ResourceError) -> UserError {
///         UserError::from(e)
///     }
/// }
///
/// // get(), model(), list() and remove() are provided.
/// let user = client.get("u1").await?;
/// ```
#[async_trait]
pub trait ResourceApi<T: ResourceEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send + Sync;

    fn inner(&self) -> &ResourceClient<T>;

    fn map_error(e: ResourceError) -> Self::Error;

    #[tracing::instrument(skip(self), fields(resource = T::NAME))]
    async fn get(&self, code: &str) -> Result<T::View, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(code).await.map_err(Self::map_error)
    }

    #[tracing::instrument(skip(self), fields(resource = T::NAME))]
    async fn model(&self, code: &str) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().model(code).await.map_err(Self::map_error)
    }

    #[tracing::instrument(skip(self), fields(resource = T::NAME))]
    async fn list(
        &self,
        params: ListParams,
        actor: Option<Actor>,
    ) -> Result<Vec<T::View>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list(params, actor).await.map_err(Self::map_error)
    }

    #[tracing::instrument(skip(self), fields(resource = T::NAME))]
    async fn remove(&self, code: &str, actor: Option<Actor>) -> Result<T::View, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().remove(code, actor).await.map_err(Self::map_error)
    }
}
