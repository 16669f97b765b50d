//! Data models for Homebase

mod bookmark;
mod collection;
mod dock;
mod record;
mod settings;
mod sync_conflict;

pub use bookmark::{normalize_tags, Bookmark, BookmarkDraft, BookmarkPatch};
pub use collection::Collection;
pub use dock::{DockItem, DockItemPatch};
pub use record::{visible, Identified, Record};
pub use settings::{Settings, ThemeMode, DEFAULT_DEBOUNCE_MS, MAX_DEBOUNCE_MS, MIN_DEBOUNCE_MS};
pub use sync_conflict::{ConflictWinner, SyncConflict};
