//! homebase-core - Core library for Homebase
//!
//! This crate contains the record models, the local cache, the merge
//! engine and the debounced sync scheduler behind the Homebase start page.
//! UI clients talk to a [`SyncSession`] and never to the remote store
//! directly.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod export;
pub mod fingerprint;
pub mod gateway;
pub mod merge;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod store;
pub mod util;
pub mod validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, RemoteConfig, SyncConfig};
pub use error::{Error, Result};
pub use events::{EventBus, RemoteSnapshot, SyncEvent};
pub use gateway::{GatewayError, MemoryGateway, RemoteGateway, SupabaseGateway};
pub use merge::MergePolicy;
pub use models::{Bookmark, BookmarkDraft, BookmarkPatch, Collection, DockItem, Settings};
pub use services::SyncSession;
pub use state::{SyncState, SyncStatus};
pub use store::LocalStore;
