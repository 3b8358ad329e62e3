//! # Resource Action Pipeline
//!
//! [`ResourcePipeline<T>`] runs the six actions of a resource (`list`, `get`,
//! `model`, `create`, `update`, `remove`) through the same sequence of
//! cross-cutting steps:
//!
//! | action   | cache        | lookup            | write                | after the write                        |
//! |----------|--------------|-------------------|----------------------|----------------------------------------|
//! | `list`   | read-through | query builder     | –                    | –                                      |
//! | `get`    | read-through | `model`           | –                    | –                                      |
//! | `model`  | read-through | accessor by code  | –                    | –                                      |
//! | `create` | invalidate   | –                 | save + conflict shim | emit `created`, spawn follow-up        |
//! | `update` | invalidate   | `model`           | save + conflict shim | emit `updated`                         |
//! | `remove` | invalidate   | `model`           | delete               | emit `removed`                         |
//!
//! Every result is serialized through the resource's view and populated before
//! it is cached or returned.
//!
//! ## Ordering
//!
//! Invalidation runs right after the accessor confirms the write and before
//! the action returns. The pipeline of one resource is driven by a single
//! [`ResourceActor`](crate::actor::ResourceActor), so reads of the same
//! resource never interleave with its writes. Reads that populate from another
//! resource can: a cache miss records the cache [`Generation`], and the result
//! is only stored if neither this resource nor one it references was
//! invalidated since.
//!
//! ## Failure boundaries
//!
//! - Accessor calls are bounded by `accessor_timeout_ms`.
//! - The post-create follow-up runs in its own task, bounded by
//!   `side_effect_timeout_ms`; whatever happens to it (error, timeout, panic)
//!   ends up as a change event, never in the caller's result.
//! - Emitting events cannot fail an action.

use crate::accessor::CollectionAccessor;
use crate::cache::{CacheKey, CacheStore, Generation};
use crate::config::PipelineConfig;
use crate::conflict::translate_conflict;
use crate::entity::{Actor, ResourceEntity};
use crate::error::{AccessorError, ResourceError, SideEffectError};
use crate::events::{ChangeEvent, ChangeKind, EventPayload, NotificationEmitter};
use crate::query::{build_query, ListParams};
use crate::serialize::{from_value, to_value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

enum Lookup<V> {
    Hit(V),
    Miss(Generation),
}

pub struct ResourcePipeline<T: ResourceEntity> {
    collection: Arc<dyn CollectionAccessor<T>>,
    cache: Arc<dyn CacheStore>,
    emitter: Arc<dyn NotificationEmitter>,
    config: PipelineConfig,
}

impl<T: ResourceEntity> ResourcePipeline<T> {
    pub fn new(
        collection: Arc<dyn CollectionAccessor<T>>,
        cache: Arc<dyn CacheStore>,
        emitter: Arc<dyn NotificationEmitter>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            collection,
            cache,
            emitter,
            config,
        }
    }

    pub fn resource(&self) -> &'static str {
        T::NAME
    }

    /// Registers the resource's references with the cache. Called once before
    /// the first action.
    pub async fn prepare(&self) {
        if !T::REFERENCES.is_empty() {
            self.cache
                .register_dependencies(T::NAME, T::REFERENCES)
                .await;
        }
    }

    // --- Reads ---

    pub async fn list(
        &self,
        params: ListParams,
        actor: Option<&Actor>,
        ctx: &T::Context,
    ) -> Result<Vec<T::View>, ResourceError> {
        let query = build_query(&params, actor, self.config.max_list_limit);
        let key = CacheKey::new(
            T::NAME,
            "list",
            &[
                json!(params.limit),
                json!(params.offset),
                json!(params.sort),
                json!(params.filter),
                json!(query.author),
            ],
        );
        let read_at = match self.cached::<Vec<T::View>>(&key).await {
            Lookup::Hit(views) => return Ok(views),
            Lookup::Miss(read_at) => read_at,
        };

        let records = self
            .guarded("find", self.collection.find(&query))
            .await
            .map_err(ResourceError::Accessor)?;
        let mut views = Vec::with_capacity(records.len());
        for record in &records {
            views.push(T::populate(record.to_view(), ctx).await);
        }
        debug!(resource = T::NAME, count = views.len(), "List");
        self.store(key, &views, read_at).await?;
        Ok(views)
    }

    pub async fn get(&self, code: &str, ctx: &T::Context) -> Result<T::View, ResourceError> {
        let key = CacheKey::new(T::NAME, "get", &[json!(code)]);
        let read_at = match self.cached::<T::View>(&key).await {
            Lookup::Hit(view) => return Ok(view),
            Lookup::Miss(read_at) => read_at,
        };
        let record = self.require(code).await?;
        let view = T::populate(record.to_view(), ctx).await;
        debug!(resource = T::NAME, code, "Get");
        self.store(key, &view, read_at).await?;
        Ok(view)
    }

    /// Model resolver: the raw record for `code`, looked up by external code.
    pub async fn model(&self, code: &str) -> Result<Option<T>, ResourceError> {
        let key = CacheKey::new(T::NAME, "model", &[json!(code)]);
        let read_at = match self.cached::<T>(&key).await {
            Lookup::Hit(record) => return Ok(Some(record)),
            Lookup::Miss(read_at) => read_at,
        };
        let record = self
            .guarded("find_by_code", self.collection.find_by_code(code))
            .await
            .map_err(ResourceError::Accessor)?;
        debug!(resource = T::NAME, code, found = record.is_some(), "Model");
        if let Some(record) = &record {
            self.store(key, record, read_at).await?;
        }
        Ok(record)
    }

    // --- Writes ---

    pub async fn create(
        &self,
        params: T::Create,
        actor: Option<Actor>,
        ctx: &Arc<T::Context>,
    ) -> Result<T::View, ResourceError> {
        debug!(resource = T::NAME, ?params, "Create");
        let record = T::from_create_params(params)?;
        let saved = self
            .guarded("save", self.collection.save(record))
            .await
            .map_err(|e| translate_conflict(T::NAME, "create", e))?;
        self.cache.invalidate_all(T::NAME).await;
        info!(resource = T::NAME, code = saved.code(), "Created");

        let view = T::populate(saved.to_view(), ctx).await;
        self.notify(ChangeKind::Created, &view, actor.clone());
        self.spawn_after_create(saved, view.clone(), Arc::clone(ctx), actor);
        Ok(view)
    }

    /// Partial update: only the fields present in `update` are applied. An
    /// empty update still persists, notifies and invalidates.
    pub async fn update(
        &self,
        code: &str,
        update: T::Update,
        actor: Option<Actor>,
        ctx: &T::Context,
    ) -> Result<T::View, ResourceError> {
        debug!(resource = T::NAME, code, ?update, "Update");
        let mut record = self.require(code).await?;
        let changed = record.apply_update(update)?;
        let saved = self
            .guarded("save", self.collection.save(record))
            .await
            .map_err(|e| translate_conflict(T::NAME, "update", e))?;
        self.cache.invalidate_all(T::NAME).await;
        info!(resource = T::NAME, code, changed, "Updated");

        let view = T::populate(saved.to_view(), ctx).await;
        self.notify(ChangeKind::Updated, &view, actor);
        Ok(view)
    }

    /// Deletes the record and returns its last state.
    pub async fn remove(
        &self,
        code: &str,
        actor: Option<Actor>,
        ctx: &T::Context,
    ) -> Result<T::View, ResourceError> {
        debug!(resource = T::NAME, code, "Remove");
        let record = self.require(code).await?;
        let id = record.id().ok_or_else(|| {
            ResourceError::Accessor(AccessorError::Backend {
                message: format!("{} record {code} has no storage id", T::NAME),
            })
        })?;
        self.guarded("delete_by_id", self.collection.delete_by_id(id))
            .await
            .map_err(ResourceError::Accessor)?;
        self.cache.invalidate_all(T::NAME).await;
        info!(resource = T::NAME, code, "Removed");

        let view = T::populate(record.to_view(), ctx).await;
        self.notify(ChangeKind::Removed, &view, actor);
        Ok(view)
    }

    // --- Steps ---

    async fn require(&self, code: &str) -> Result<T, ResourceError> {
        self.model(code).await?.ok_or_else(|| {
            warn!(resource = T::NAME, code, "Not found");
            ResourceError::NotFound {
                resource: T::NAME,
                code: code.to_string(),
            }
        })
    }

    async fn guarded<R>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<R, AccessorError>>,
    ) -> Result<R, AccessorError> {
        let budget = self.config.accessor_timeout();
        match tokio::time::timeout(budget, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(resource = T::NAME, operation, ?budget, "Accessor timed out");
                Err(AccessorError::Timeout {
                    operation,
                    elapsed: budget,
                })
            }
        }
    }

    async fn cached<V: DeserializeOwned>(&self, key: &CacheKey) -> Lookup<V> {
        if !self.config.cache_enabled {
            return Lookup::Miss(Generation::default());
        }
        let read_at = self.cache.generation().await;
        let Some(value) = self.cache.get(key).await else {
            return Lookup::Miss(read_at);
        };
        match from_value(value) {
            Ok(hit) => Lookup::Hit(hit),
            Err(e) => {
                // Treated as a miss; the entry is overwritten below.
                warn!(resource = T::NAME, key = %key, error = %e, "Unreadable cache entry");
                Lookup::Miss(read_at)
            }
        }
    }

    async fn store<V: Serialize>(
        &self,
        key: CacheKey,
        value: &V,
        read_at: Generation,
    ) -> Result<(), ResourceError> {
        if self.config.cache_enabled && !self.cache.put(key, to_value(value)?, read_at).await {
            debug!(resource = T::NAME, "Result raced an invalidation, not cached");
        }
        Ok(())
    }

    fn notify(&self, kind: ChangeKind, view: &T::View, actor: Option<Actor>) {
        match to_value(view) {
            Ok(payload) => self.emitter.emit(ChangeEvent::new(
                T::NAME,
                kind,
                EventPayload::Record(payload),
                actor,
            )),
            Err(e) => warn!(resource = T::NAME, ?kind, error = %e, "Event payload not serializable"),
        }
    }

    fn spawn_after_create(&self, record: T, view: T::View, ctx: Arc<T::Context>, actor: Option<Actor>) {
        let emitter = Arc::clone(&self.emitter);
        let budget = self.config.side_effect_timeout();
        let code = record.code().to_string();

        tokio::spawn(async move {
            let mut work = tokio::spawn(async move { record.after_create(&view, &ctx).await });
            let outcome = match tokio::time::timeout(budget, &mut work).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(join)) => Err(SideEffectError::new("SideEffectFailed", join.to_string())),
                Err(_) => {
                    work.abort();
                    Err(SideEffectError::new(
                        "SideEffectTimeout",
                        format!("gave up after {budget:?}"),
                    ))
                }
            };

            let event = match outcome {
                Ok(None) => return,
                Ok(Some(message)) => {
                    debug!(resource = T::NAME, code, outcome = %message, "Follow-up done");
                    ChangeEvent::new(T::NAME, ChangeKind::Info, EventPayload::Message(message), actor)
                }
                Err(e) => {
                    warn!(resource = T::NAME, code, error = %e, "Follow-up failed");
                    ChangeEvent::new(T::NAME, ChangeKind::Error, EventPayload::Message(e.code), actor)
                }
            };
            emitter.emit(event);
        });
    }
}
