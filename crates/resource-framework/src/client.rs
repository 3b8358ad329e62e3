//! # Resource Client
//!
//! The cloneable handle callers use to reach a
//! [`ResourceActor`](crate::actor::ResourceActor).

use crate::entity::{Actor, ResourceEntity};
use crate::error::ResourceError;
use crate::message::{ResourceRequest, Response};
use crate::query::ListParams;
use tokio::sync::{mpsc, oneshot};

/// Type-safe async API over the request channel. Holds only a sender, so
/// clones are cheap and can be shared across tasks.
pub struct ResourceClient<T: ResourceEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ResourceEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: ResourceEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn list(
        &self,
        params: ListParams,
        actor: Option<Actor>,
    ) -> Result<Vec<T::View>, ResourceError> {
        self.request(|respond_to| ResourceRequest::List {
            params,
            actor,
            respond_to,
        })
        .await
    }

    pub async fn get(&self, code: impl Into<String>) -> Result<T::View, ResourceError> {
        let code = code.into();
        self.request(|respond_to| ResourceRequest::Get { code, respond_to })
            .await
    }

    /// Raw record lookup by code, for resources that reference this one.
    pub async fn model(&self, code: impl Into<String>) -> Result<Option<T>, ResourceError> {
        let code = code.into();
        self.request(|respond_to| ResourceRequest::Model { code, respond_to })
            .await
    }

    pub async fn create(
        &self,
        params: T::Create,
        actor: Option<Actor>,
    ) -> Result<T::View, ResourceError> {
        self.request(|respond_to| ResourceRequest::Create {
            params,
            actor,
            respond_to,
        })
        .await
    }

    pub async fn update(
        &self,
        code: impl Into<String>,
        update: T::Update,
        actor: Option<Actor>,
    ) -> Result<T::View, ResourceError> {
        let code = code.into();
        self.request(|respond_to| ResourceRequest::Update {
            code,
            update,
            actor,
            respond_to,
        })
        .await
    }

    pub async fn remove(
        &self,
        code: impl Into<String>,
        actor: Option<Actor>,
    ) -> Result<T::View, ResourceError> {
        let code = code.into();
        self.request(|respond_to| ResourceRequest::Remove {
            code,
            actor,
            respond_to,
        })
        .await
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, ResourceError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| ResourceError::ActorClosed)?;
        response.await.map_err(|_| ResourceError::ActorDropped)?
    }
}
