//! # Resource Framework
//!
//! Building blocks for serving CRUD resources through one shared action
//! pipeline. A resource describes *what* it stores ([`ResourceEntity`]); the
//! framework supplies *how* every action runs: cache lookup and
//! invalidation, listing filters, unique-conflict translation, view
//! serialization, relation population and change notification.
//!
//! ## Architecture Overview
//!
//! 1. **Entity layer** ([`ResourceEntity`]): fields, DTOs, view, hooks.
//! 2. **Pipeline** ([`ResourcePipeline`]): the action steps, written once.
//! 3. **Runtime** ([`ResourceActor`]): one task per resource, sequential
//!    processing, late-bound context.
//! 4. **Interface** ([`ResourceClient`], [`ResourceApi`]): type-safe requests.
//!
//! Collaborators are injected as trait objects:
//!
//! | seam | trait | in-process implementation |
//! |------|-------|---------------------------|
//! | persistence | [`CollectionAccessor`] | [`MemoryCollection`] |
//! | cache | [`CacheStore`] | [`MemoryCache`] |
//! | notifications | [`NotificationEmitter`] | [`EventBus`] |
//!
//! ## Context Injection
//!
//! Hooks receive `T::Context`, passed to [`ResourceActor::run`] rather than to
//! the constructor. Create every actor first, then start each one with the
//! clients it depends on:
//!
//! ```rust,ignore
//! let (user_actor, users) = ResourceActor::<User>::new(user_store, cache.clone(), bus.clone(), config.clone());
//! let (post_actor, posts) = ResourceActor::<Post>::new(post_store, cache, bus, config);
//!
//! tokio::spawn(user_actor.run(UserContext::new(mailer, renderer)));
//! tokio::spawn(post_actor.run(PostContext::new(UserClient::new(users.clone()))));
//! ```
//!
//! ## Errors
//!
//! Every action fails with a [`ResourceError`]; [`ResourceError::status`]
//! gives the transport-facing status code. Failures of the post-create
//! follow-up never reach the caller, they are published as `error` events.
//!
//! ## Testing
//!
//! [`mock::MockClient`] answers a client's requests from scripted
//! expectations, for testing a resource whose hooks call another one.

pub mod accessor;
pub mod actor;
pub mod cache;
pub mod client;
pub mod client_trait;
pub mod config;
pub mod conflict;
pub mod entity;
pub mod error;
pub mod events;
pub mod message;
pub mod mock;
pub mod observability;
pub mod pipeline;
pub mod query;
pub mod serialize;

#[cfg(test)]
mod testing;

pub use accessor::{CollectionAccessor, MemoryCollection};
pub use actor::ResourceActor;
pub use cache::{CacheKey, CacheStore, Generation, MemoryCache};
pub use client::ResourceClient;
pub use client_trait::ResourceApi;
pub use config::PipelineConfig;
pub use entity::{Actor, RecordId, ResourceEntity};
pub use error::{AccessorError, ResourceError, SideEffectError, ValidationError};
pub use events::{ChangeEvent, ChangeKind, EventBus, EventPayload, NotificationEmitter};
pub use message::{ResourceRequest, Response};
pub use pipeline::ResourcePipeline;
pub use query::{CollectionQuery, ListParams, OWN_RECORDS_FILTER};
pub use serialize::Related;
