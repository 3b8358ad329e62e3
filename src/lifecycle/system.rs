use crate::clients::{PostClient, UserClient};
use crate::config::ServiceConfig;
use crate::mailer::{Mailer, MemoryMailer, JinjaRenderer, TemplateRenderer};
use crate::model::{Post, User};
use crate::post_resource::PostContext;
use crate::user_resource::UserContext;
use resource_framework::{ChangeEvent, EventBus, MemoryCache, MemoryCollection};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

/// Database name shown in conflict details of the in-memory collections.
const DATABASE: &str = "app";

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("actor task failed: {0}")]
    ActorTask(#[from] JoinError),
}

/// The running service: one actor per resource sharing a cache and an event
/// bus.
///
/// ```ignore
/// let system = ResourceSystem::new(&ServiceConfig::load()?);
/// let mut events = system.subscribe();
///
/// let user = system.users.create_user(params, None).await?;
/// let post = system.posts.create_post(post_params, None).await?;
///
/// system.shutdown().await?;
/// ```
pub struct ResourceSystem {
    pub users: UserClient,
    pub posts: PostClient,
    events: EventBus,
    cache: Arc<MemoryCache>,
    // Dependents first: the post actor holds a users client.
    handles: Vec<JoinHandle<()>>,
}

impl ResourceSystem {
    /// Starts the system with the in-process mail collaborators.
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_mail(
            config,
            Arc::new(JinjaRenderer::default()),
            Arc::new(MemoryMailer::new()),
        )
    }

    /// Starts the system with the given renderer and mailer.
    pub fn with_mail(
        config: &ServiceConfig,
        renderer: Arc<dyn TemplateRenderer>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let events = EventBus::new(config.pipeline.event_capacity);
        let cache = Arc::new(MemoryCache::new());
        let emitter = Arc::new(events.clone());

        // 1. Create actors (no dependencies yet)
        let (user_actor, users) = crate::user_resource::new(
            Arc::new(MemoryCollection::<User>::new(DATABASE)),
            cache.clone(),
            emitter.clone(),
            config.pipeline.clone(),
        );
        let (post_actor, posts) = crate::post_resource::new(
            Arc::new(MemoryCollection::<Post>::new(DATABASE)),
            cache.clone(),
            emitter,
            config.pipeline.clone(),
        );

        // 2. Start actors with their contexts
        let user_context = UserContext::new(
            renderer,
            mailer,
            config.app.clone(),
            config.mail.clone(),
        );
        let user_handle = tokio::spawn(user_actor.run(user_context));
        let post_handle = tokio::spawn(post_actor.run(PostContext::new(users.clone())));

        info!(app = %config.app.name, "Resource system started");
        Self {
            users,
            posts,
            events,
            cache,
            handles: vec![post_handle, user_handle],
        }
    }

    /// Listens to change events of every resource.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    /// Drops the clients and waits for every actor to drain its queue.
    ///
    /// Clones of the clients held elsewhere keep their actor alive, so drop
    /// them before calling this.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");
        drop(self.posts);
        drop(self.users);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Actor task failed");
                return Err(e.into());
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
