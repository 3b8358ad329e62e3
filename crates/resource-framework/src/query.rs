//! # Query Filter Builder
//!
//! Translates the allow-listed `list` parameters into a [`CollectionQuery`]
//! the accessor understands. Anything outside `limit`, `offset`, `sort`,
//! `filter` and `author` is dropped on the way in.

use crate::entity::Actor;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named filter that scopes a listing to the caller's own records.
pub const OWN_RECORDS_FILTER: &str = "my";

/// The allow-listed parameters of a `list` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub author: Option<String>,
}

impl ListParams {
    /// Parses raw request parameters, ignoring unknown keys.
    pub fn from_request(params: &Value) -> Result<Self, ValidationError> {
        let Some(map) = params.as_object() else {
            return Err(ValidationError::new("params", "expected an object"));
        };
        let mut out = Self::default();
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                "limit" => out.limit = Some(non_negative(key, value)?),
                "offset" => out.offset = Some(non_negative(key, value)?),
                "sort" => out.sort = Some(text(key, value)?),
                "filter" => out.filter = Some(text(key, value)?),
                "author" => out.author = Some(text(key, value)?),
                _ => {}
            }
        }
        Ok(out)
    }
}

fn non_negative(key: &str, value: &Value) -> Result<usize, ValidationError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| ValidationError::new(key, "expected a non-negative integer"))
}

fn text(key: &str, value: &Value) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::new(key, "expected a string"))
}

/// Query descriptor handed to the accessor.
///
/// `sort` stays a raw expression; its grammar belongs to the accessor. It
/// names view fields: records are never ordered by fields the view omits.
/// Without `sort` the accessor returns records in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionQuery {
    pub author: Option<String>,
    pub sort: Option<String>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Builds the accessor query for a `list` call.
///
/// `filter = "my"` restricts the listing to records authored by `actor`; an
/// anonymous caller asking for "my" records gets an empty scope rather than
/// everything. Otherwise an explicit `author` restricts the listing.
/// `max_limit` caps the page size when configured.
pub fn build_query(
    params: &ListParams,
    actor: Option<&Actor>,
    max_limit: Option<usize>,
) -> CollectionQuery {
    let author = match params.filter.as_deref() {
        Some(OWN_RECORDS_FILTER) => Some(actor.map(|a| a.code.clone()).unwrap_or_default()),
        _ => params.author.clone(),
    };
    let limit = match (params.limit, max_limit) {
        (Some(limit), Some(max)) => Some(limit.min(max)),
        (None, Some(max)) => Some(max),
        (limit, None) => limit,
    };
    CollectionQuery {
        author,
        sort: params.sort.clone().filter(|s| !s.trim().is_empty()),
        offset: params.offset.unwrap_or(0),
        limit,
    }
}
