//! Dock shortcut model
//!
//! Dock items carry no timestamp and no tombstone. They merge by plain
//! `id`-keyed union with the remote copy winning collisions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::Identified;

/// A shortcut pinned to the dock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockItem {
    pub id: String,
    #[serde(alias = "title")]
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockItemPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub icon: Option<Option<String>>,
}

impl DockItem {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into().trim().to_string(),
            url: url.into().trim().to_string(),
            icon: None,
        }
    }

    #[must_use]
    pub fn patched(&self, patch: DockItemPatch) -> Self {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(url) = patch.url {
            next.url = url.trim().to_string();
        }
        if let Some(icon) = patch.icon {
            next.icon = icon;
        }
        next
    }
}

impl Identified for DockItem {
    fn id(&self) -> &str {
        &self.id
    }
}
