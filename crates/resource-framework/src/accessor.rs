//! # Collection Accessor
//!
//! The persistence seam of the pipeline. A [`CollectionAccessor`] finds
//! records by query or code, saves (insert or overwrite) and deletes them, and
//! is the sole arbiter of uniqueness: a violated unique index surfaces as
//! [`AccessorError::Conflict`] carrying the index name, and leaves no partial
//! record behind.
//!
//! [`MemoryCollection`] is the in-process implementation used by the service
//! and the tests.

use crate::entity::{RecordId, ResourceEntity};
use crate::error::AccessorError;
use crate::query::CollectionQuery;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

#[async_trait]
pub trait CollectionAccessor<T: ResourceEntity>: Send + Sync {
    async fn find(&self, query: &CollectionQuery) -> Result<Vec<T>, AccessorError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<T>, AccessorError>;

    /// Inserts `record` when it has no id yet, overwrites it otherwise.
    /// Returns the stored record (with its id).
    async fn save(&self, record: T) -> Result<T, AccessorError>;

    async fn delete_by_id(&self, id: RecordId) -> Result<(), AccessorError>;
}

struct Store<T> {
    records: BTreeMap<RecordId, T>,
    next_id: u64,
}

/// In-memory collection with unique-index enforcement.
///
/// Records are keyed by a monotonically increasing [`RecordId`], so iteration
/// order is insertion order. Conflict details use the Mongo wording that
/// [`crate::conflict`] knows how to parse.
pub struct MemoryCollection<T: ResourceEntity> {
    namespace: String,
    store: RwLock<Store<T>>,
}

impl<T: ResourceEntity> MemoryCollection<T> {
    /// `database` only shows up in conflict details (`database.resource`).
    pub fn new(database: &str) -> Self {
        Self {
            namespace: format!("{database}.{}", T::NAME),
            store: RwLock::new(Store {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_unique(&self, store: &Store<T>, record: &T) -> Result<(), AccessorError> {
        for (field, value) in record.unique_fields() {
            let taken = store.records.iter().any(|(id, other)| {
                Some(*id) != record.id()
                    && other
                        .unique_fields()
                        .iter()
                        .any(|(f, v)| *f == field && *v == value)
            });
            if taken {
                return Err(AccessorError::Conflict {
                    detail: format!(
                        "E11000 duplicate key error collection: {} index: {field}_1 dup key: {{ : {value:?} }}",
                        self.namespace
                    ),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: ResourceEntity> CollectionAccessor<T> for MemoryCollection<T> {
    async fn find(&self, query: &CollectionQuery) -> Result<Vec<T>, AccessorError> {
        if query.limit == Some(0) {
            return Ok(Vec::new());
        }
        let store = self.store.read().await;
        let mut matches: Vec<T> = store
            .records
            .values()
            .filter(|record| match &query.author {
                Some(author) => record.author() == Some(author.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        drop(store);

        if let Some(sort) = &query.sort {
            sort_records(&mut matches, sort)?;
        }
        let limit = query.limit.unwrap_or(usize::MAX);
        let page: Vec<T> = matches.into_iter().skip(query.offset).take(limit).collect();
        debug!(resource = T::NAME, found = page.len(), "find");
        Ok(page)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<T>, AccessorError> {
        let store = self.store.read().await;
        Ok(store.records.values().find(|r| r.code() == code).cloned())
    }

    async fn save(&self, mut record: T) -> Result<T, AccessorError> {
        let mut store = self.store.write().await;
        self.check_unique(&store, &record)?;
        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = RecordId(store.next_id);
                store.next_id += 1;
                record.set_id(id);
                id
            }
        };
        store.records.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<(), AccessorError> {
        let mut store = self.store.write().await;
        store.records.remove(&id);
        Ok(())
    }
}

/// Sorts by a raw expression: field names separated by commas or spaces, a
/// leading `-` for descending. Field names are those of the resource's view,
/// so internal fields cannot order results; naming one is a no-op. The sort
/// is stable, so ties keep insertion order.
fn sort_records<T: ResourceEntity>(records: &mut Vec<T>, expression: &str) -> Result<(), AccessorError> {
    let keys: Vec<(String, bool)> = expression
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('-') {
            Some(field) => (field.to_string(), true),
            None => (s.trim_start_matches('+').to_string(), false),
        })
        .collect();
    if keys.is_empty() {
        return Ok(());
    }

    let mut rows = Vec::with_capacity(records.len());
    for record in records.drain(..) {
        let value = serde_json::to_value(record.to_view()).map_err(|e| AccessorError::Backend {
            message: format!("cannot read sort fields: {e}"),
        })?;
        rows.push((value, record));
    }
    rows.sort_by(|(a, _), (b, _)| {
        for (field, descending) in &keys {
            let ordering = compare_values(a.get(field), b.get(field));
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    records.extend(rows.into_iter().map(|(_, record)| record));
    Ok(())
}

// Missing and null sort first, like the document stores this mimics.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Note, NoteCreate};

    async fn seeded() -> MemoryCollection<Note> {
        let collection = MemoryCollection::<Note>::new("test");
        for (slug, author, rank) in [("b", "u1", 2), ("a", "u2", 3), ("c", "u1", 1)] {
            let note = Note::from_create_params(NoteCreate {
                slug: slug.into(),
                author: author.into(),
                rank,
            })
            .unwrap();
            collection.save(note).await.unwrap();
        }
        collection
    }

    fn slugs(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn find_defaults_to_insertion_order() {
        let collection = seeded().await;
        let all = collection.find(&CollectionQuery::default()).await.unwrap();
        assert_eq!(slugs(&all), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn find_sorts_filters_and_pages() {
        let collection = seeded().await;
        let query = CollectionQuery {
            sort: Some("-rank".into()),
            ..Default::default()
        };
        assert_eq!(slugs(&collection.find(&query).await.unwrap()), vec!["a", "b", "c"]);

        let query = CollectionQuery {
            author: Some("u1".into()),
            sort: Some("slug".into()),
            offset: 1,
            limit: Some(5),
        };
        assert_eq!(slugs(&collection.find(&query).await.unwrap()), vec!["c"]);

        let query = CollectionQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert!(collection.find(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn internal_fields_do_not_order_results() {
        let collection = seeded().await;
        for (code, secret) in [("note-b", "z"), ("note-a", "m"), ("note-c", "a")] {
            let mut note = collection.find_by_code(code).await.unwrap().unwrap();
            note.secret = secret.into();
            collection.save(note).await.unwrap();
        }

        let query = CollectionQuery {
            sort: Some("secret".into()),
            ..Default::default()
        };
        assert_eq!(slugs(&collection.find(&query).await.unwrap()), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn unique_violation_leaves_no_partial_record() {
        let collection = seeded().await;
        let clash = Note::from_create_params(NoteCreate {
            slug: "a".into(),
            author: "u9".into(),
            ..Default::default()
        })
        .unwrap();
        let err = collection.save(clash).await.unwrap_err();
        match err {
            AccessorError::Conflict { detail } => {
                assert!(detail.contains("index: slug_1 dup key"), "{detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(collection.len().await, 3);
    }

    #[tokio::test]
    async fn overwrite_keeps_id_and_allows_own_unique_values() {
        let collection = seeded().await;
        let mut note = collection.find_by_code("note-a").await.unwrap().unwrap();
        let id = note.id();
        note.rank = 10;
        let saved = collection.save(note).await.unwrap();
        assert_eq!(saved.id(), id);
        assert_eq!(collection.len().await, 3);

        collection.delete_by_id(id.unwrap()).await.unwrap();
        assert!(collection.find_by_code("note-a").await.unwrap().is_none());
    }
}
