//! # Resource Actor
//!
//! `ResourceActor<T>` is the server half of a resource: it owns the receiving
//! end of the request channel and drives a [`ResourcePipeline<T>`] one message
//! at a time.
//!
//! Processing requests sequentially is what makes cache invalidation safe: a
//! `get` queued behind an `update` of the same resource only runs once the
//! update's write and invalidation are both done.
//!
//! # Usage Pattern
//!
//! 1. **Create**: `ResourceActor::new(...)` returns the actor and a cloneable client.
//! 2. **Wire**: hand clients to whichever resources need them in their context.
//! 3. **Run**: spawn `actor.run(context)`.
//!
//! The loop ends when every client has been dropped.

use crate::accessor::CollectionAccessor;
use crate::cache::CacheStore;
use crate::client::ResourceClient;
use crate::config::PipelineConfig;
use crate::entity::ResourceEntity;
use crate::events::NotificationEmitter;
use crate::error::ResourceError;
use crate::message::{ResourceRequest, Response};
use crate::pipeline::ResourcePipeline;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub struct ResourceActor<T: ResourceEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    pipeline: ResourcePipeline<T>,
}

impl<T: ResourceEntity> ResourceActor<T> {
    /// Creates the actor and its client. The channel capacity comes from
    /// `config.channel_capacity`; a full channel makes callers wait.
    pub fn new(
        collection: Arc<dyn CollectionAccessor<T>>,
        cache: Arc<dyn CacheStore>,
        emitter: Arc<dyn NotificationEmitter>,
        config: PipelineConfig,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(config.channel_capacity.max(1));
        let actor = Self {
            receiver,
            pipeline: ResourcePipeline::new(collection, cache, emitter, config),
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the request loop until the channel closes.
    ///
    /// `context` is injected into the resource's hooks. It is bound here
    /// rather than in `new` so resources can depend on each other's clients.
    pub async fn run(mut self, context: T::Context) {
        let resource = self.pipeline.resource();
        let context = Arc::new(context);
        self.pipeline.prepare().await;
        info!(resource, "Actor started");

        let mut handled: u64 = 0;
        while let Some(msg) = self.receiver.recv().await {
            handled += 1;
            match msg {
                ResourceRequest::List {
                    params,
                    actor,
                    respond_to,
                } => {
                    let result = self.pipeline.list(params, actor.as_ref(), &context).await;
                    reply(resource, "list", respond_to, result);
                }
                ResourceRequest::Get { code, respond_to } => {
                    let result = self.pipeline.get(&code, &context).await;
                    reply(resource, "get", respond_to, result);
                }
                ResourceRequest::Model { code, respond_to } => {
                    let result = self.pipeline.model(&code).await;
                    reply(resource, "model", respond_to, result);
                }
                ResourceRequest::Create {
                    params,
                    actor,
                    respond_to,
                } => {
                    let result = self.pipeline.create(params, actor, &context).await;
                    reply(resource, "create", respond_to, result);
                }
                ResourceRequest::Update {
                    code,
                    update,
                    actor,
                    respond_to,
                } => {
                    let result = self.pipeline.update(&code, update, actor, &context).await;
                    reply(resource, "update", respond_to, result);
                }
                ResourceRequest::Remove {
                    code,
                    actor,
                    respond_to,
                } => {
                    let result = self.pipeline.remove(&code, actor, &context).await;
                    reply(resource, "remove", respond_to, result);
                }
            }
        }

        info!(resource, handled, "Shutdown");
    }
}

fn reply<R>(
    resource: &'static str,
    action: &'static str,
    respond_to: Response<R>,
    result: Result<R, ResourceError>,
) {
    if let Err(e) = &result {
        warn!(resource, action, error = %e, "Action failed");
    }
    // The caller may have given up waiting; nothing to do then.
    let _ = respond_to.send(result);
}
