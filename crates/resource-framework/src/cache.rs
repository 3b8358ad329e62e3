//! # Cache Store
//!
//! Injected key → value store for serialized action results.
//!
//! Keys are [`CacheKey`] fingerprints: SHA-256 over the resource name, the
//! action name and the ordered values of the action's cache parameters, so the
//! same request always lands on the same entry and no parameter outside the
//! declared list can split or poison it.
//!
//! Entries have no TTL. They live until [`CacheStore::invalidate_all`] drops
//! every entry of their resource, which every mutation does after its write
//! commits. A resource that embeds records of another resource registers that
//! dependency, and is invalidated along with it.
//!
//! A result computed from reads that raced an invalidation must not be stored.
//! Readers take a [`Generation`] before reading and hand it back to
//! [`CacheStore::put`], which refuses the value when the key's resource was
//! invalidated in between.

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio::sync::RwLock;
use tracing::debug;

/// Deterministic cache address for one action invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: &'static str,
    action: &'static str,
    fingerprint: String,
}

impl CacheKey {
    /// Fingerprints `values`, which must be listed in the action's declared
    /// parameter order.
    pub fn new(resource: &'static str, action: &'static str, values: &[Value]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(resource.as_bytes());
        hasher.update([0]);
        hasher.update(action.as_bytes());
        hasher.update([0]);
        // A JSON array of values is an unambiguous encoding of the tuple.
        hasher.update(Value::Array(values.to_vec()).to_string().as_bytes());
        Self {
            resource,
            action,
            fingerprint: hex::encode(hasher.finalize()),
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn action(&self) -> &'static str {
        self.action
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.resource, self.action, self.fingerprint)
    }
}

/// Position in a cache's invalidation history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<Value>;

    /// The current generation. Take it before the reads a cached value is
    /// built from.
    async fn generation(&self) -> Generation;

    /// Stores `value` unless the key's resource was invalidated after
    /// `read_at`. Returns whether the value was stored.
    async fn put(&self, key: CacheKey, value: Value, read_at: Generation) -> bool;

    /// Drops every entry of `resource` and of the resources that declared a
    /// dependency on it. Completes before returning: no later `get` sees a
    /// dropped entry.
    async fn invalidate_all(&self, resource: &str);

    /// Declares that `resource` embeds records of each of `references`.
    async fn register_dependencies(&self, resource: &'static str, references: &[&'static str]);
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<&'static str, HashMap<CacheKey, Value>>,
    // referenced resource -> resources embedding it
    dependents: HashMap<String, HashSet<&'static str>>,
    generation: u64,
    // resource -> generation of its last invalidation
    invalidated_at: HashMap<String, u64>,
}

/// Process-local [`CacheStore`] bucketed per resource.
#[derive(Default)]
pub struct MemoryCache {
    state: RwLock<CacheState>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries for `resource`.
    pub async fn len(&self, resource: &str) -> usize {
        self.state
            .read()
            .await
            .entries
            .get(resource)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        let state = self.state.read().await;
        let hit = state
            .entries
            .get(key.resource())
            .and_then(|bucket| bucket.get(key))
            .cloned();
        debug!(key = %key, hit = hit.is_some(), "cache get");
        hit
    }

    async fn generation(&self) -> Generation {
        Generation(self.state.read().await.generation)
    }

    async fn put(&self, key: CacheKey, value: Value, read_at: Generation) -> bool {
        let mut state = self.state.write().await;
        let last = state.invalidated_at.get(key.resource()).copied().unwrap_or(0);
        if last > read_at.0 {
            debug!(key = %key, ?read_at, invalidated_at = last, "cache put refused");
            return false;
        }
        state
            .entries
            .entry(key.resource())
            .or_default()
            .insert(key, value);
        true
    }

    async fn invalidate_all(&self, resource: &str) {
        let mut state = self.state.write().await;
        state.generation += 1;
        let generation = state.generation;
        let mut pending = vec![resource.to_string()];
        let mut cleared = HashSet::new();
        while let Some(next) = pending.pop() {
            if !cleared.insert(next.clone()) {
                continue;
            }
            if let Some(bucket) = state.entries.get_mut(next.as_str()) {
                bucket.clear();
            }
            state.invalidated_at.insert(next.clone(), generation);
            if let Some(dependents) = state.dependents.get(&next) {
                pending.extend(dependents.iter().map(|d| d.to_string()));
            }
        }
        debug!(resource, cleared = cleared.len(), generation, "cache invalidated");
    }

    async fn register_dependencies(&self, resource: &'static str, references: &[&'static str]) {
        let mut state = self.state.write().await;
        for reference in references {
            state
                .dependents
                .entry(reference.to_string())
                .or_default()
                .insert(resource);
        }
    }
}
