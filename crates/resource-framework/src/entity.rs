//! # ResourceEntity Trait
//!
//! The `ResourceEntity` trait is the contract every persisted resource (users,
//! posts, …) implements to be served by the generic
//! [`ResourcePipeline`](crate::pipeline::ResourcePipeline). It names the
//! resource, its create/update DTOs, its external view (the static field
//! allow-list), and the runtime context its hooks need.
//!
//! # Architecture Note
//! By defining one contract all resources satisfy, the pipeline (cache,
//! filtering, conflict translation, population, notification) is written
//! *once* and reused everywhere. Associated types keep the DTOs apart: a
//! `UserCreate` can never be sent to the posts resource.
//!
//! # Provided Methods (Hooks)
//! - [`ResourceEntity::author`], [`ResourceEntity::unique_fields`]
//! - [`ResourceEntity::populate`]
//! - [`ResourceEntity::after_create`]
//!
//! The defaults describe a resource without authorship, unique indexes,
//! references or follow-up work.

use crate::error::{SideEffectError, ValidationError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

/// Internal storage identifier assigned by the accessor. Never exposed in
/// views; external references use the record's `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity an action is performed on behalf of.
///
/// Recorded as the actor of change events and used to resolve the "my"
/// listing filter. Authorization is not decided here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub code: String,
}

impl Actor {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

#[async_trait]
pub trait ResourceEntity:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Resource name, used for cache scoping, events and log fields.
    const NAME: &'static str;

    /// Resources whose records are embedded in this resource's views.
    /// Mutating any of them invalidates this resource's cache too.
    const REFERENCES: &'static [&'static str] = &[];

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug + 'static;

    /// Partial update; `None` fields are left unchanged.
    type Update: Send + Sync + Debug + 'static;

    /// External representation. Only the fields of this type ever leave the
    /// pipeline.
    type View: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Runtime dependencies injected into the hooks (other resource clients,
    /// mail collaborators). Use `()` if none are needed.
    type Context: Send + Sync + 'static;

    fn id(&self) -> Option<RecordId>;

    /// Called by the accessor when the record is first stored.
    fn set_id(&mut self, id: RecordId);

    fn code(&self) -> &str;

    /// Author code matched by `author` / "my" listing filters.
    fn author(&self) -> Option<&str> {
        None
    }

    /// `(field, value)` pairs covered by a unique index.
    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Builds a new record, applying resource defaults.
    fn from_create_params(params: Self::Create) -> Result<Self, ValidationError>;

    /// Applies the present fields of `update`. Returns whether anything was
    /// applied.
    fn apply_update(&mut self, update: Self::Update) -> Result<bool, ValidationError>;

    /// Serializer: record → view.
    fn to_view(&self) -> Self::View;

    /// Relation populator: expands reference fields of `view`.
    async fn populate(view: Self::View, _ctx: &Self::Context) -> Self::View {
        view
    }

    /// Best-effort follow-up after a successful create. `Ok(Some(code))`
    /// publishes an `info` event carrying `code`; `Err` publishes an `error`
    /// event. Neither outcome reaches the caller of `create`.
    async fn after_create(
        &self,
        _view: &Self::View,
        _ctx: &Self::Context,
    ) -> Result<Option<String>, SideEffectError> {
        Ok(None)
    }
}
