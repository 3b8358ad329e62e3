//! Post resource: entity implementation, errors, runtime context.
//!
//! Posts embed their author, so the post actor needs the users client.

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::{PostClient, UserClient};
use crate::model::Post;
use resource_framework::{
    CacheStore, CollectionAccessor, NotificationEmitter, PipelineConfig, ResourceActor,
};
use std::sync::Arc;

pub struct PostContext {
    users: UserClient,
}

impl PostContext {
    pub fn new(users: UserClient) -> Self {
        Self { users }
    }
}

/// Creates the post actor and its client.
pub fn new(
    collection: Arc<dyn CollectionAccessor<Post>>,
    cache: Arc<dyn CacheStore>,
    emitter: Arc<dyn NotificationEmitter>,
    config: PipelineConfig,
) -> (ResourceActor<Post>, PostClient) {
    let (actor, generic_client) = ResourceActor::new(collection, cache, emitter, config);
    (actor, PostClient::new(generic_client))
}
