//! # Duplicate-Key Translation
//!
//! Boundary shim between a collection backend's raw uniqueness-violation
//! message and the pipeline's [`ResourceError::DuplicateField`].
//!
//! The only format understood today is the Mongo-style detail also produced by
//! [`MemoryCollection`](crate::accessor::MemoryCollection):
//!
//! ```text
//! E11000 duplicate key error collection: app.users index: email_1 dup key: { : "a@b.c" }
//! ```
//!
//! The field is the index name (`email_1`) with its trailing `_<n>` suffix
//! removed. The format belongs to the backend and may change: anything that
//! does not match yields a generic [`ResourceError::Conflict`] instead of a
//! guessed field name.

use crate::error::{AccessorError, ResourceError};

const INDEX_MARKER: &str = "index: ";
const DUP_KEY_MARKER: &str = " dup key";

/// Extracts the offending field from a raw conflict detail.
pub fn duplicate_field(detail: &str) -> Option<String> {
    let (_, after_index) = detail.split_once(INDEX_MARKER)?;
    let (index, _) = after_index.split_once(DUP_KEY_MARKER)?;
    let index = index.trim();
    let field = match index.rfind('_') {
        Some(pos) => &index[..pos],
        None => index,
    };
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

/// Rewrites an accessor error raised during `action` (e.g. "create") on
/// `resource` into the error the caller sees.
pub fn translate_conflict(resource: &str, action: &str, error: AccessorError) -> ResourceError {
    match error {
        AccessorError::Conflict { detail } => match duplicate_field(&detail) {
            Some(field) => ResourceError::DuplicateField {
                message: format!("Unable to {action} {resource}, duplicate field: {field}"),
                field,
            },
            None => ResourceError::Conflict {
                message: format!("Unable to {action} {resource}, a unique field is already taken"),
            },
        },
        other => ResourceError::Accessor(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_field_from_index_name() {
        let detail =
            r#"E11000 duplicate key error collection: app.users index: email_1 dup key: { : "a@b.c" }"#;
        assert_eq!(duplicate_field(detail).as_deref(), Some("email"));
    }

    #[test]
    fn keeps_underscores_inside_field_names() {
        let detail = "E11000 duplicate key error index: api_key_1 dup key: { : \"k\" }";
        assert_eq!(duplicate_field(detail).as_deref(), Some("api_key"));
    }

    #[test]
    fn translates_into_duplicate_field() {
        let err = translate_conflict(
            "users",
            "create",
            AccessorError::Conflict {
                detail: "E11000 duplicate key error index: username_1 dup key: { : \"bob\" }"
                    .into(),
            },
        );
        match err {
            ResourceError::DuplicateField { field, message } => {
                assert_eq!(field, "username");
                assert!(message.contains("duplicate field: username"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_detail_degrades_to_generic_conflict() {
        let err = translate_conflict(
            "users",
            "update",
            AccessorError::Conflict {
                detail: "unique violation".into(),
            },
        );
        assert!(matches!(err, ResourceError::Conflict { .. }));
    }

    #[test]
    fn other_accessor_errors_pass_through() {
        let err = translate_conflict(
            "users",
            "create",
            AccessorError::Unavailable {
                message: "down".into(),
            },
        );
        assert!(matches!(
            err,
            ResourceError::Accessor(AccessorError::Unavailable { .. })
        ));
    }
}
