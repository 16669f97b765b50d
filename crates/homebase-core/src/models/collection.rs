//! Named collections kept in the local cache and the remote store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One independently synced blob per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Bookmarks,
    Dock,
    Settings,
}

impl Collection {
    pub const ALL: [Self; 3] = [Self::Bookmarks, Self::Dock, Self::Settings];

    /// Fixed key of this collection in the local cache.
    #[must_use]
    pub const fn cache_key(self) -> &'static str {
        match self {
            Self::Bookmarks => "homebase.bookmarks",
            Self::Dock => "homebase.dock",
            Self::Settings => "homebase.settings",
        }
    }

    /// Remote table holding one row per user for this collection.
    #[must_use]
    pub const fn remote_table(self) -> &'static str {
        match self {
            Self::Bookmarks => "user_bookmarks",
            Self::Dock => "user_dock_items",
            Self::Settings => "user_settings",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bookmarks => "bookmarks",
            Self::Dock => "dock",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
