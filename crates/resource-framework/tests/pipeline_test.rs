use async_trait::async_trait;
use resource_framework::{
    AccessorError, Actor, ChangeEvent, ChangeKind, CollectionAccessor, CollectionQuery, EventBus,
    ListParams, MemoryCache, MemoryCollection, PipelineConfig, RecordId, ResourceActor,
    ResourceClient, ResourceEntity, ResourceError, SideEffectError, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

// --- Test Resource ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Article {
    id: Option<RecordId>,
    code: String,
    title: String,
    author: String,
    body: String,
    edits: u32,
    draft_token: String,
}

#[derive(Debug, Default)]
struct ArticleCreate {
    title: String,
    author: String,
    body: String,
}

#[derive(Debug, Default)]
struct ArticleUpdate {
    title: Option<String>,
    body: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct ArticleView {
    code: String,
    title: String,
    author: String,
    body: String,
    edits: u32,
}

#[derive(Clone, Copy, Debug)]
enum FollowUp {
    Quiet,
    Notice,
    Fail,
    Hang,
    Panic,
}

#[async_trait]
impl ResourceEntity for Article {
    const NAME: &'static str = "articles";
    type Create = ArticleCreate;
    type Update = ArticleUpdate;
    type View = ArticleView;
    type Context = FollowUp;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn author(&self) -> Option<&str> {
        Some(&self.author)
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("title", self.title.clone())]
    }

    fn from_create_params(params: ArticleCreate) -> Result<Self, ValidationError> {
        if params.title.trim().is_empty() {
            return Err(ValidationError::new("title", "must not be blank"));
        }
        Ok(Self {
            id: None,
            code: params.title.to_lowercase().replace(' ', "-"),
            title: params.title,
            author: params.author,
            body: params.body,
            edits: 0,
            draft_token: "internal".into(),
        })
    }

    fn apply_update(&mut self, update: ArticleUpdate) -> Result<bool, ValidationError> {
        let mut changed = false;
        if let Some(title) = update.title {
            self.title = title;
            changed = true;
        }
        if let Some(body) = update.body {
            self.body = body;
            changed = true;
        }
        if changed {
            self.edits += 1;
        }
        Ok(changed)
    }

    fn to_view(&self) -> ArticleView {
        ArticleView {
            code: self.code.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            body: self.body.clone(),
            edits: self.edits,
        }
    }

    async fn after_create(
        &self,
        _view: &ArticleView,
        ctx: &FollowUp,
    ) -> Result<Option<String>, SideEffectError> {
        match ctx {
            FollowUp::Quiet => Ok(None),
            FollowUp::Notice => Ok(Some("articlePublished".into())),
            FollowUp::Fail => Err(SideEffectError::new("UnableToPublish", "feed offline")),
            FollowUp::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(None)
            }
            FollowUp::Panic => panic!("follow-up blew up"),
        }
    }
}

// --- Instrumented accessor ---

/// Counts reads that reach the collection, optionally stalling them.
struct Instrumented {
    inner: MemoryCollection<Article>,
    reads: AtomicUsize,
    stall: Option<Duration>,
}

impl Instrumented {
    fn new(stall: Option<Duration>) -> Self {
        Self {
            inner: MemoryCollection::new("test"),
            reads: AtomicUsize::new(0),
            stall,
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    async fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
    }
}

#[async_trait]
impl CollectionAccessor<Article> for Instrumented {
    async fn find(&self, query: &CollectionQuery) -> Result<Vec<Article>, AccessorError> {
        self.read().await;
        self.inner.find(query).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Article>, AccessorError> {
        self.read().await;
        self.inner.find_by_code(code).await
    }

    async fn save(&self, record: Article) -> Result<Article, AccessorError> {
        self.inner.save(record).await
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<(), AccessorError> {
        self.inner.delete_by_id(id).await
    }
}

// --- Harness ---

struct Harness {
    client: ResourceClient<Article>,
    events: broadcast::Receiver<ChangeEvent>,
    store: Arc<Instrumented>,
}

fn start_with(follow_up: FollowUp, config: PipelineConfig, stall: Option<Duration>) -> Harness {
    let store = Arc::new(Instrumented::new(stall));
    let bus = EventBus::new(config.event_capacity);
    let events = bus.subscribe();
    let (actor, client) = ResourceActor::<Article>::new(
        store.clone(),
        Arc::new(MemoryCache::new()),
        Arc::new(bus),
        config,
    );
    tokio::spawn(actor.run(follow_up));
    Harness {
        client,
        events,
        store,
    }
}

fn start(follow_up: FollowUp) -> Harness {
    start_with(follow_up, PipelineConfig::default(), None)
}

fn article(title: &str, author: &str) -> ArticleCreate {
    ArticleCreate {
        title: title.into(),
        author: author.into(),
        body: format!("{title} body"),
    }
}

async fn next_event(events: &mut broadcast::Receiver<ChangeEvent>) -> ChangeEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

// --- Tests ---

#[tokio::test]
async fn test_create_then_get_returns_created_fields() {
    let h = start(FollowUp::Quiet);
    let created = h
        .client
        .create(article("Hello World", "u1"), None)
        .await
        .unwrap();
    assert_eq!(created.code, "hello-world");

    let fetched = h.client.get("hello-world").await.unwrap();
    assert_eq!(fetched, created);

    // Served from cache the second time.
    let reads = h.store.reads();
    let again = h.client.get("hello-world").await.unwrap();
    assert_eq!(again, created);
    assert_eq!(h.store.reads(), reads);
}

#[tokio::test]
async fn test_views_never_expose_internal_fields() {
    let h = start(FollowUp::Quiet);
    let created = h.client.create(article("Secret", "u1"), None).await.unwrap();
    let value = serde_json::to_value(&created).unwrap();
    assert!(value.get("draft_token").is_none());
    assert!(value.get("id").is_none());
}

#[tokio::test]
async fn test_mutations_invalidate_cached_reads() {
    let h = start(FollowUp::Quiet);
    h.client.create(article("First", "u1"), None).await.unwrap();

    let listed = h.client.list(ListParams::default(), None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(h.client.get("first").await.unwrap().body, "First body");

    h.client
        .update(
            "first",
            ArticleUpdate {
                body: Some("rewritten".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(h.client.get("first").await.unwrap().body, "rewritten");

    h.client.create(article("Second", "u2"), None).await.unwrap();
    let listed = h.client.list(ListParams::default(), None).await.unwrap();
    assert_eq!(listed.len(), 2);

    h.client.remove("first", None).await.unwrap();
    let listed = h.client.list(ListParams::default(), None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].code, "second");
}

#[tokio::test]
async fn test_empty_update_still_notifies_and_invalidates() {
    let mut h = start(FollowUp::Quiet);
    let created = h.client.create(article("Stable", "u1"), None).await.unwrap();
    assert_eq!(next_event(&mut h.events).await.kind, ChangeKind::Created);

    h.client.get("stable").await.unwrap();
    let reads = h.store.reads();

    let updated = h
        .client
        .update("stable", ArticleUpdate::default(), Some(Actor::new("u1")))
        .await
        .unwrap();
    assert_eq!(updated, created);

    let event = next_event(&mut h.events).await;
    assert_eq!(event.kind, ChangeKind::Updated);
    assert_eq!(event.actor, Some(Actor::new("u1")));

    h.client.get("stable").await.unwrap();
    assert!(h.store.reads() > reads, "get after update must miss the cache");
}

#[tokio::test]
async fn test_duplicate_unique_field_names_the_field() {
    let h = start(FollowUp::Quiet);
    h.client.create(article("Taken", "u1"), None).await.unwrap();

    let err = h
        .client
        .create(article("Taken", "u2"), None)
        .await
        .unwrap_err();
    match &err {
        ResourceError::DuplicateField { field, message } => {
            assert_eq!(field, "title");
            assert!(message.contains("title"));
        }
        other => panic!("expected DuplicateField, got {other:?}"),
    }
    assert_eq!(err.status(), 400);

    let original = h.client.get("taken").await.unwrap();
    assert_eq!(original.author, "u1");
    assert_eq!(h.client.list(ListParams::default(), None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_into_taken_value_is_a_duplicate() {
    let h = start(FollowUp::Quiet);
    h.client.create(article("One", "u1"), None).await.unwrap();
    h.client.create(article("Two", "u1"), None).await.unwrap();

    let err = h
        .client
        .update(
            "two",
            ArticleUpdate {
                title: Some("One".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::DuplicateField { ref field, .. } if field == "title"));
    assert_eq!(h.client.get("two").await.unwrap().title, "Two");
}

#[tokio::test]
async fn test_unknown_code_is_not_found() {
    let h = start(FollowUp::Quiet);
    let get = h.client.get("missing").await.unwrap_err();
    let update = h
        .client
        .update("missing", ArticleUpdate::default(), None)
        .await
        .unwrap_err();
    let remove = h.client.remove("missing", None).await.unwrap_err();
    for err in [get, update, remove] {
        assert!(matches!(err, ResourceError::NotFound { resource: "articles", ref code } if code == "missing"));
        assert_eq!(err.status(), 404);
    }
    assert!(h.client.model("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_validation_rejects_before_the_accessor() {
    let h = start(FollowUp::Quiet);
    let err = h.client.create(article("  ", "u1"), None).await.unwrap_err();
    assert!(matches!(err, ResourceError::Validation(ref v) if v.field == "title"));
    assert_eq!(h.client.list(ListParams::default(), None).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_filters_sorting_and_paging() {
    let h = start(FollowUp::Quiet);
    for (title, author) in [("b", "u1"), ("a", "u2"), ("c", "u1")] {
        h.client.create(article(title, author), None).await.unwrap();
    }

    let mine = h
        .client
        .list(
            ListParams {
                filter: Some("my".into()),
                ..Default::default()
            },
            Some(Actor::new("u1")),
        )
        .await
        .unwrap();
    assert_eq!(mine.iter().map(|a| a.code.as_str()).collect::<Vec<_>>(), ["b", "c"]);

    // Same params, different actor: must not be served the first actor's page.
    let theirs = h
        .client
        .list(
            ListParams {
                filter: Some("my".into()),
                ..Default::default()
            },
            Some(Actor::new("u2")),
        )
        .await
        .unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].code, "a");

    let sorted = h
        .client
        .list(
            ListParams {
                sort: Some("-title".into()),
                offset: Some(1),
                limit: Some(1),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(sorted.len(), 1);
    assert_eq!(sorted[0].code, "b");

    let none = h
        .client
        .list(
            ListParams {
                limit: Some(0),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert!(none.is_empty());

    let nobody = h
        .client
        .list(
            ListParams {
                author: Some("u9".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert!(nobody.is_empty());
}

#[tokio::test]
async fn test_max_list_limit_caps_pages() {
    let config = PipelineConfig {
        max_list_limit: Some(2),
        ..Default::default()
    };
    let h = start_with(FollowUp::Quiet, config, None);
    for title in ["a", "b", "c"] {
        h.client.create(article(title, "u1"), None).await.unwrap();
    }
    let page = h.client.list(ListParams::default(), None).await.unwrap();
    assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn test_remove_returns_last_state_and_emits() {
    let mut h = start(FollowUp::Quiet);
    let created = h.client.create(article("Gone", "u1"), None).await.unwrap();
    next_event(&mut h.events).await;

    let removed = h.client.remove("gone", Some(Actor::new("admin"))).await.unwrap();
    assert_eq!(removed, created);

    let event = next_event(&mut h.events).await;
    assert_eq!(event.kind, ChangeKind::Removed);
    assert_eq!(event.actor, Some(Actor::new("admin")));
    assert!(matches!(
        h.client.get("gone").await,
        Err(ResourceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_follow_up_notice_becomes_info_event() {
    let mut h = start(FollowUp::Notice);
    h.client.create(article("Notice", "u1"), None).await.unwrap();

    assert_eq!(next_event(&mut h.events).await.kind, ChangeKind::Created);
    let info = next_event(&mut h.events).await;
    assert_eq!(info.kind, ChangeKind::Info);
    assert_eq!(info.message(), Some("articlePublished"));
}

#[tokio::test]
async fn test_follow_up_failure_keeps_the_record_and_emits_error() {
    let mut h = start(FollowUp::Fail);
    let created = h
        .client
        .create(article("Fragile", "u1"), Some(Actor::new("u1")))
        .await
        .unwrap();
    assert_eq!(created.code, "fragile");

    assert_eq!(next_event(&mut h.events).await.kind, ChangeKind::Created);
    let error = next_event(&mut h.events).await;
    assert_eq!(error.kind, ChangeKind::Error);
    assert_eq!(error.message(), Some("UnableToPublish"));
    assert_eq!(error.actor, Some(Actor::new("u1")));

    assert_eq!(h.client.get("fragile").await.unwrap(), created);
}

#[tokio::test]
async fn test_follow_up_timeout_and_panic_are_contained() {
    let config = PipelineConfig {
        side_effect_timeout_ms: 50,
        ..Default::default()
    };
    let mut hung = start_with(FollowUp::Hang, config, None);
    hung.client.create(article("Slow", "u1"), None).await.unwrap();
    next_event(&mut hung.events).await;
    assert_eq!(
        next_event(&mut hung.events).await.message(),
        Some("SideEffectTimeout")
    );

    let mut crashed = start(FollowUp::Panic);
    crashed.client.create(article("Boom", "u1"), None).await.unwrap();
    next_event(&mut crashed.events).await;
    let error = next_event(&mut crashed.events).await;
    assert_eq!(error.kind, ChangeKind::Error);
    assert_eq!(error.message(), Some("SideEffectFailed"));

    // The actor keeps serving.
    assert!(crashed.client.get("boom").await.is_ok());
}

#[tokio::test]
async fn test_slow_accessor_times_out() {
    let config = PipelineConfig {
        accessor_timeout_ms: 20,
        ..Default::default()
    };
    let h = start_with(FollowUp::Quiet, config, Some(Duration::from_millis(500)));
    let err = h.client.get("anything").await.unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Accessor(AccessorError::Timeout {
            operation: "find_by_code",
            ..
        })
    ));
    assert_eq!(err.status(), 503);
}

#[tokio::test]
async fn test_disabled_cache_always_reads_through() {
    let config = PipelineConfig {
        cache_enabled: false,
        ..Default::default()
    };
    let h = start_with(FollowUp::Quiet, config, None);
    h.client.create(article("Fresh", "u1"), None).await.unwrap();

    let before = h.store.reads();
    h.client.get("fresh").await.unwrap();
    h.client.get("fresh").await.unwrap();
    assert_eq!(h.store.reads(), before + 2);
}

#[tokio::test]
async fn test_closed_actor_reports_actor_closed() {
    let store: Arc<MemoryCollection<Article>> = Arc::new(MemoryCollection::new("test"));
    let (actor, client) = ResourceActor::<Article>::new(
        store,
        Arc::new(MemoryCache::new()),
        Arc::new(EventBus::new(1)),
        PipelineConfig::default(),
    );
    drop(actor);
    let err = client.get("x").await.unwrap_err();
    assert!(matches!(err, ResourceError::ActorClosed));
    assert_eq!(err.status(), 503);
}
