//! In-process publish/subscribe channel between the pull path and the
//! component owning the local store.

use serde_json::Value;
use tokio::sync::broadcast;

use crate::fingerprint::fingerprint;
use crate::models::{Bookmark, Collection, DockItem, Settings};
use crate::validate::{validate_all, validate_bookmark, validate_dock_item};

const DEFAULT_CAPACITY: usize = 64;

/// A validated copy of one remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSnapshot {
    Bookmarks(Vec<Bookmark>),
    Dock(Vec<DockItem>),
    Settings(Settings),
}

impl RemoteSnapshot {
    #[must_use]
    pub const fn collection(&self) -> Collection {
        match self {
            Self::Bookmarks(_) => Collection::Bookmarks,
            Self::Dock(_) => Collection::Dock,
            Self::Settings(_) => Collection::Settings,
        }
    }

    /// Decode a raw remote payload, dropping records the validator rejects.
    ///
    /// Returns the snapshot and the number of rejected records. A record
    /// array of the wrong shape decodes as an empty collection. A settings
    /// blob that does not parse yields `None`: there is nothing usable
    /// remote and the local settings must stay.
    pub fn decode(collection: Collection, payload: &Value) -> Option<(Self, usize)> {
        let items = payload.as_array().map_or(&[][..], Vec::as_slice);
        match collection {
            Collection::Bookmarks => {
                let batch = validate_all(items, validate_bookmark);
                Some((Self::Bookmarks(batch.accepted), batch.rejected))
            }
            Collection::Dock => {
                let batch = validate_all(items, validate_dock_item);
                Some((Self::Dock(batch.accepted), batch.rejected))
            }
            Collection::Settings => match serde_json::from_value::<Settings>(payload.clone()) {
                Ok(settings) => Some((Self::Settings(settings), 0)),
                Err(error) => {
                    tracing::warn!("Ignoring malformed remote settings blob: {error}");
                    None
                }
            },
        }
    }

    pub fn fingerprint(&self) -> serde_json::Result<String> {
        match self {
            Self::Bookmarks(records) => fingerprint(records),
            Self::Dock(items) => fingerprint(items),
            Self::Settings(settings) => fingerprint(settings),
        }
    }
}

/// Notifications published on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A pull produced data that differs from the local state.
    RemoteUpdated(RemoteSnapshot),
    /// The store owner merged a remote snapshot.
    Merged {
        collection: Collection,
        changed: bool,
    },
}

/// Broadcast bus; every subscriber sees every event published after it subscribed.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it.
    pub fn publish(&self, event: SyncEvent) -> usize {
        // No subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
