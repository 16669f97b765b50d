//! Bookmark model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{timestamp_or_zero, Identified, Record};

/// A bookmark card on the start page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Stable caller-assigned identifier, immutable once created
    pub id: String,
    /// Display name
    #[serde(alias = "title")]
    pub name: String,
    /// Absolute target URL
    pub url: String,
    /// Favicon reference (URL or data URI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub visit_count: u64,
    /// Last visit timestamp (Unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visited: Option<i64>,
    /// Last mutation timestamp (Unix ms), the only conflict-resolution signal
    #[serde(default, deserialize_with = "timestamp_or_zero")]
    pub updated_at: i64,
    /// Soft delete flag for sync
    #[serde(default)]
    pub deleted: bool,
}

/// Fields supplied by the UI when creating a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkDraft {
    /// Caller-assigned id; a UUID v7 is generated when absent
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    pub favicon: Option<String>,
    pub tags: Vec<String>,
    pub note: Option<String>,
}

impl BookmarkDraft {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }
}

/// A partial edit. `None` leaves the field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub favicon: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub note: Option<Option<String>>,
}

impl Bookmark {
    /// Create a live bookmark from a draft, stamped at `now_ms`.
    #[must_use]
    pub fn from_draft(draft: BookmarkDraft, now_ms: i64) -> Self {
        Self {
            id: draft
                .id
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            name: draft.name.trim().to_string(),
            url: draft.url.trim().to_string(),
            favicon: draft.favicon,
            tags: normalize_tags(draft.tags),
            note: draft.note,
            visit_count: 0,
            last_visited: None,
            updated_at: now_ms,
            deleted: false,
        }
    }

    /// Apply a patch to a copy of this bookmark without touching `updated_at`.
    #[must_use]
    pub fn patched(&self, patch: BookmarkPatch) -> Self {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(url) = patch.url {
            next.url = url.trim().to_string();
        }
        if let Some(favicon) = patch.favicon {
            next.favicon = favicon;
        }
        if let Some(tags) = patch.tags {
            next.tags = normalize_tags(tags);
        }
        if let Some(note) = patch.note {
            next.note = note;
        }
        next
    }
}

impl Identified for Bookmark {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Bookmark {
    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Trim, drop empties and deduplicate tags (case-insensitive), keeping first-seen order.
#[must_use]
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}
