//! Per-record acceptance checks for cache loads, pulls and imports.
//!
//! Validation never fails a whole batch: each candidate is accepted or
//! rejected on its own and the caller aggregates the rejected count.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::models::{Bookmark, DockItem};

/// Why a single candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("candidate is not a JSON object")]
    NotAnObject,
    #[error("id must be a non-empty string")]
    MissingId,
    #[error("name must be a non-empty string")]
    MissingName,
    #[error("url is not a well-formed absolute URL: {0}")]
    InvalidUrl(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Outcome of validating a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T> {
    pub accepted: Vec<T>,
    pub rejected: usize,
}

impl<T> Default for Validated<T> {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            rejected: 0,
        }
    }
}

/// Parse `raw` as a well-formed absolute URL.
pub fn validate_url(raw: &str) -> Result<Url, Rejection> {
    Url::parse(raw.trim()).map_err(|error| Rejection::InvalidUrl(format!("{raw:?} ({error})")))
}

/// Accept a bookmark candidate or say why not.
pub fn validate_bookmark(candidate: &Value) -> Result<Bookmark, Rejection> {
    let object = candidate.as_object().ok_or(Rejection::NotAnObject)?;
    check_common_fields(object)?;
    decode(candidate)
}

/// Accept a dock item candidate or say why not.
pub fn validate_dock_item(candidate: &Value) -> Result<DockItem, Rejection> {
    let object = candidate.as_object().ok_or(Rejection::NotAnObject)?;
    check_common_fields(object)?;
    decode(candidate)
}

/// Run every candidate through `validate`, keeping the accepted ones in order.
pub fn validate_all<T>(
    candidates: &[Value],
    validate: impl Fn(&Value) -> Result<T, Rejection>,
) -> Validated<T> {
    let mut batch = Validated::default();
    for (index, candidate) in candidates.iter().enumerate() {
        match validate(candidate) {
            Ok(record) => batch.accepted.push(record),
            Err(rejection) => {
                tracing::debug!("Rejected candidate #{index}: {rejection}");
                batch.rejected += 1;
            }
        }
    }
    batch
}

fn check_common_fields(object: &Map<String, Value>) -> Result<(), Rejection> {
    if !non_empty_str(object.get("id")) {
        return Err(Rejection::MissingId);
    }
    if !non_empty_str(object.get("name").or_else(|| object.get("title"))) {
        return Err(Rejection::MissingName);
    }
    let url = object
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| Rejection::InvalidUrl("missing".to_string()))?;
    validate_url(url)?;
    Ok(())
}

fn non_empty_str(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|text| !text.trim().is_empty())
}

fn decode<T: DeserializeOwned>(candidate: &Value) -> Result<T, Rejection> {
    serde_json::from_value(candidate.clone()).map_err(|error| Rejection::Malformed(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_bookmark() {
        let bookmark = validate_bookmark(&json!({
            "id": "1",
            "name": "Rust",
            "url": "https://www.rust-lang.org",
            "updatedAt": 100
        }))
        .unwrap();
        assert_eq!(bookmark.id, "1");
        assert_eq!(bookmark.updated_at, 100);
    }

    #[test]
    fn rejects_missing_or_blank_id() {
        assert_eq!(
            validate_bookmark(&json!({"name": "x", "url": "https://x.io"})),
            Err(Rejection::MissingId)
        );
        assert_eq!(
            validate_bookmark(&json!({"id": "  ", "name": "x", "url": "https://x.io"})),
            Err(Rejection::MissingId)
        );
        assert_eq!(
            validate_bookmark(&json!({"id": 7, "name": "x", "url": "https://x.io"})),
            Err(Rejection::MissingId)
        );
    }

    #[test]
    fn rejects_blank_name() {
        assert_eq!(
            validate_bookmark(&json!({"id": "1", "name": "", "url": "https://x.io"})),
            Err(Rejection::MissingName)
        );
    }

    #[test]
    fn accepts_legacy_title_field() {
        let item = validate_dock_item(&json!({"id": "d", "title": "Mail", "url": "https://mail.example"}))
            .unwrap();
        assert_eq!(item.name, "Mail");
    }

    #[test]
    fn rejects_relative_and_garbage_urls() {
        for url in ["/relative/path", "not a url", "example.com", ""] {
            let result = validate_bookmark(&json!({"id": "1", "name": "x", "url": url}));
            assert!(
                matches!(result, Err(Rejection::InvalidUrl(_))),
                "{url:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_objects_and_mistyped_fields() {
        assert_eq!(validate_bookmark(&json!("nope")), Err(Rejection::NotAnObject));
        let result = validate_bookmark(&json!({
            "id": "1",
            "name": "x",
            "url": "https://x.io",
            "visitCount": "many"
        }));
        assert!(matches!(result, Err(Rejection::Malformed(_))));
    }

    #[test]
    fn validate_all_counts_rejections_without_failing_batch() {
        let candidates = vec![
            json!({"id": "1", "name": "a", "url": "https://a.io"}),
            json!({"id": "2", "name": "b", "url": "b.io"}),
            json!({"id": "3", "name": "c", "url": "https://c.io"}),
            json!(null),
        ];
        let batch = validate_all(&candidates, validate_bookmark);
        assert_eq!(batch.accepted.len(), 2);
        assert_eq!(batch.rejected, 2);
        assert_eq!(batch.accepted[1].id, "3");
    }
}
