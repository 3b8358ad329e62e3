//! # Resource Messages
//!
//! The request vocabulary between a [`ResourceClient`](crate::client::ResourceClient)
//! and its [`ResourceActor`](crate::actor::ResourceActor). One variant per
//! action; every variant carries a one-shot channel for the reply.
//!
//! The enum is generic over `T: ResourceEntity` and uses its associated types,
//! so a `UserCreate` payload cannot be sent to the posts actor.

use crate::entity::{Actor, ResourceEntity};
use crate::error::ResourceError;
use crate::query::ListParams;
use tokio::sync::oneshot;

/// One-shot reply channel used by the actor.
pub type Response<T> = oneshot::Sender<Result<T, ResourceError>>;

#[derive(Debug)]
pub enum ResourceRequest<T: ResourceEntity> {
    List {
        params: ListParams,
        actor: Option<Actor>,
        respond_to: Response<Vec<T::View>>,
    },
    Get {
        code: String,
        respond_to: Response<T::View>,
    },
    Model {
        code: String,
        respond_to: Response<Option<T>>,
    },
    Create {
        params: T::Create,
        actor: Option<Actor>,
        respond_to: Response<T::View>,
    },
    Update {
        code: String,
        update: T::Update,
        actor: Option<Actor>,
        respond_to: Response<T::View>,
    },
    Remove {
        code: String,
        actor: Option<Actor>,
        respond_to: Response<T::View>,
    },
}
