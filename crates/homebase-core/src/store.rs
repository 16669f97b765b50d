//! Persisted local cache and the in-memory canonical record sets.
//!
//! Every accepted mutation is applied in memory first and then written
//! through to the cache synchronously. Storage failures never undo an
//! in-memory change: without persistence consent, or after a permission
//! failure, the store keeps running memory-only for the session.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::clock::Clock;
use crate::db::{CacheRepository, Database, SqliteCacheRepository};
use crate::error::{Error, Result};
use crate::events::RemoteSnapshot;
use crate::fingerprint::fingerprint;
use crate::merge::{merge_last_write_wins_with_report, merge_remote_wins, MergePolicy};
use crate::models::{
    visible, Bookmark, BookmarkDraft, BookmarkPatch, Collection, DockItem, DockItemPatch,
    Settings, SyncConflict,
};
use crate::validate::{validate_all, validate_bookmark, validate_dock_item, validate_url};

const MAX_RECENT_CONFLICTS: usize = 50;

enum Persistence {
    Durable(Database),
    MemoryOnly { reason: String },
}

/// Records dropped while loading the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rejected_bookmarks: usize,
    pub rejected_dock_items: usize,
}

/// Result of merging one remote snapshot into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub collection: Collection,
    /// Local state changed.
    pub changed: bool,
    /// Merged state equals the incoming snapshot, so the remote is up to date.
    pub matches_remote: bool,
    /// Fingerprint of the merged local state.
    pub fingerprint: String,
}

/// The owner of the canonical bookmark, dock and settings state.
pub struct LocalStore {
    persistence: Persistence,
    clock: Arc<dyn Clock>,
    bookmarks: Vec<Bookmark>,
    dock: Vec<DockItem>,
    settings: Settings,
    conflicts: VecDeque<SyncConflict>,
    load_report: LoadReport,
    write_warning: Option<String>,
}

impl LocalStore {
    /// Open the cache file at `path`.
    ///
    /// Never fails: without `consent`, or when the file cannot be opened,
    /// the store runs memory-only and reports why.
    pub fn open(path: impl AsRef<Path>, consent: bool, clock: Arc<dyn Clock>) -> Self {
        if !consent {
            return Self::memory_only(clock, "persistence consent not granted");
        }

        let path = path.as_ref();
        let opened = path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .map_err(Error::from)
            .and_then(|()| Database::open(path));

        match opened {
            Ok(db) => Self::with_database(db, clock),
            Err(error) => {
                tracing::warn!(
                    "Failed to open local cache at {}: {}. Continuing in memory only.",
                    path.display(),
                    error
                );
                Self::memory_only(clock, format!("cache unavailable: {error}"))
            }
        }
    }

    /// Open a store backed by an in-memory `SQLite` cache.
    pub fn open_in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self::with_database(Database::open_in_memory()?, clock))
    }

    /// A store that never touches disk.
    pub fn memory_only(clock: Arc<dyn Clock>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::info!("Local store running memory-only: {reason}");
        Self::empty(Persistence::MemoryOnly { reason }, clock)
    }

    fn with_database(db: Database, clock: Arc<dyn Clock>) -> Self {
        let mut store = Self::empty(Persistence::Durable(db), clock);
        store.load();
        store
    }

    fn empty(persistence: Persistence, clock: Arc<dyn Clock>) -> Self {
        Self {
            persistence,
            clock,
            bookmarks: Vec::new(),
            dock: Vec::new(),
            settings: Settings::default(),
            conflicts: VecDeque::new(),
            load_report: LoadReport::default(),
            write_warning: None,
        }
    }

    /// Read every collection from the cache. Missing or corrupt entries load as empty.
    fn load(&mut self) {
        let bookmarks = self.read_array(Collection::Bookmarks);
        let batch = validate_all(&bookmarks, validate_bookmark);
        self.bookmarks = batch.accepted;
        self.load_report.rejected_bookmarks = batch.rejected;

        let dock = self.read_array(Collection::Dock);
        let batch = validate_all(&dock, validate_dock_item);
        self.dock = batch.accepted;
        self.load_report.rejected_dock_items = batch.rejected;

        self.settings = self
            .read_raw(Collection::Settings)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(settings) => Some(settings),
                Err(error) => {
                    tracing::warn!("Ignoring corrupt cached settings: {error}");
                    None
                }
            })
            .unwrap_or_default();

        if self.load_report != LoadReport::default() {
            tracing::warn!(
                "Dropped invalid cached records: {} bookmarks, {} dock items",
                self.load_report.rejected_bookmarks,
                self.load_report.rejected_dock_items
            );
        }
        tracing::debug!(
            "Loaded local cache: {} bookmarks, {} dock items",
            self.bookmarks.len(),
            self.dock.len()
        );
    }

    fn read_raw(&self, collection: Collection) -> Option<String> {
        let Persistence::Durable(db) = &self.persistence else {
            return None;
        };
        match SqliteCacheRepository::new(db.connection()).get(collection.cache_key()) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!("Failed to read cached {collection}: {error}");
                None
            }
        }
    }

    fn read_array(&self, collection: Collection) -> Vec<Value> {
        let Some(raw) = self.read_raw(collection) else {
            return Vec::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!("Cached {collection} is not an array; treating as empty");
                Vec::new()
            }
            Err(error) => {
                tracing::warn!("Cached {collection} is not valid JSON ({error}); treating as empty");
                Vec::new()
            }
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Visible bookmarks, tombstones filtered out.
    pub fn bookmarks(&self) -> Vec<&Bookmark> {
        visible(&self.bookmarks).collect()
    }

    /// Every bookmark including tombstones, as pushed to the remote.
    pub fn all_bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// A visible bookmark by id.
    pub fn bookmark(&self, id: &str) -> Option<&Bookmark> {
        visible(&self.bookmarks).find(|bookmark| bookmark.id == id)
    }

    pub fn dock_items(&self) -> &[DockItem] {
        &self.dock
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn load_report(&self) -> LoadReport {
        self.load_report
    }

    /// Most recent merge conflicts, oldest first.
    pub fn recent_conflicts(&self) -> impl Iterator<Item = &SyncConflict> {
        self.conflicts.iter()
    }

    pub const fn is_durable(&self) -> bool {
        matches!(self.persistence, Persistence::Durable(_))
    }

    /// Why the store is not persisting (or why the last write failed).
    pub fn persistence_warning(&self) -> Option<&str> {
        match &self.persistence {
            Persistence::MemoryOnly { reason } => Some(reason),
            Persistence::Durable(_) => self.write_warning.as_deref(),
        }
    }

    /// Whether `collection` still holds nothing the user created.
    pub fn is_empty(&self, collection: Collection) -> bool {
        match collection {
            Collection::Bookmarks => self.bookmarks.is_empty(),
            Collection::Dock => self.dock.is_empty(),
            Collection::Settings => self.settings == Settings::default(),
        }
    }

    /// Serialized state of one collection, tombstones included.
    pub fn snapshot(&self, collection: Collection) -> Result<Value> {
        let value = match collection {
            Collection::Bookmarks => serde_json::to_value(&self.bookmarks)?,
            Collection::Dock => serde_json::to_value(&self.dock)?,
            Collection::Settings => serde_json::to_value(&self.settings)?,
        };
        Ok(value)
    }

    pub fn fingerprint(&self, collection: Collection) -> Result<String> {
        let fingerprint = match collection {
            Collection::Bookmarks => fingerprint(&self.bookmarks)?,
            Collection::Dock => fingerprint(&self.dock)?,
            Collection::Settings => fingerprint(&self.settings)?,
        };
        Ok(fingerprint)
    }

    // ------------------------------------------------------------------
    // Bookmark mutations
    // ------------------------------------------------------------------

    pub fn create_bookmark(&mut self, draft: BookmarkDraft) -> Result<Bookmark> {
        let bookmark = Bookmark::from_draft(draft, self.clock.now_ms());
        check_fields(&bookmark.id, &bookmark.name, &bookmark.url)?;
        if self.bookmarks.iter().any(|existing| existing.id == bookmark.id) {
            return Err(Error::InvalidInput(format!(
                "bookmark id already exists: {}",
                bookmark.id
            )));
        }

        self.bookmarks.push(bookmark.clone());
        self.persist(Collection::Bookmarks);
        Ok(bookmark)
    }

    /// Edit a visible bookmark. An edit that changes nothing keeps `updated_at`.
    pub fn update_bookmark(&mut self, id: &str, patch: BookmarkPatch) -> Result<Bookmark> {
        let slot = self.live_bookmark_slot(id)?;
        let current = &self.bookmarks[slot];
        let mut next = current.patched(patch);
        if next == *current {
            return Ok(next);
        }
        check_fields(&next.id, &next.name, &next.url)?;

        next.updated_at = self.stamp(current.updated_at);
        self.bookmarks[slot] = next.clone();
        self.persist(Collection::Bookmarks);
        Ok(next)
    }

    /// Soft delete: the tombstone is kept so the deletion propagates.
    pub fn delete_bookmark(&mut self, id: &str) -> Result<()> {
        let slot = self.live_bookmark_slot(id)?;
        let updated_at = self.stamp(self.bookmarks[slot].updated_at);
        let bookmark = &mut self.bookmarks[slot];
        bookmark.deleted = true;
        bookmark.updated_at = updated_at;
        self.persist(Collection::Bookmarks);
        Ok(())
    }

    /// Bump the visit counter and last-visit date.
    pub fn record_visit(&mut self, id: &str) -> Result<Bookmark> {
        let slot = self.live_bookmark_slot(id)?;
        let now = self.clock.now_ms();
        let updated_at = self.stamp(self.bookmarks[slot].updated_at);
        let bookmark = &mut self.bookmarks[slot];
        bookmark.visit_count = bookmark.visit_count.saturating_add(1);
        bookmark.last_visited = Some(now);
        bookmark.updated_at = updated_at;
        let bookmark = bookmark.clone();
        self.persist(Collection::Bookmarks);
        Ok(bookmark)
    }

    fn live_bookmark_slot(&self, id: &str) -> Result<usize> {
        self.bookmarks
            .iter()
            .position(|bookmark| bookmark.id == id && !bookmark.deleted)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// `updated_at` never moves backwards for one record.
    fn stamp(&self, previous: i64) -> i64 {
        self.clock.now_ms().max(previous)
    }

    // ------------------------------------------------------------------
    // Dock and settings mutations
    // ------------------------------------------------------------------

    pub fn add_dock_item(&mut self, item: DockItem) -> Result<DockItem> {
        check_fields(&item.id, &item.name, &item.url)?;
        if self.dock.iter().any(|existing| existing.id == item.id) {
            return Err(Error::InvalidInput(format!(
                "dock item id already exists: {}",
                item.id
            )));
        }
        self.dock.push(item.clone());
        self.persist(Collection::Dock);
        Ok(item)
    }

    pub fn update_dock_item(&mut self, id: &str, patch: DockItemPatch) -> Result<DockItem> {
        let slot = self
            .dock
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let next = self.dock[slot].patched(patch);
        if next == self.dock[slot] {
            return Ok(next);
        }
        check_fields(&next.id, &next.name, &next.url)?;
        self.dock[slot] = next.clone();
        self.persist(Collection::Dock);
        Ok(next)
    }

    /// Dock items have no tombstones and are removed outright.
    pub fn remove_dock_item(&mut self, id: &str) -> Result<()> {
        let before = self.dock.len();
        self.dock.retain(|item| item.id != id);
        if self.dock.len() == before {
            return Err(Error::NotFound(id.to_string()));
        }
        self.persist(Collection::Dock);
        Ok(())
    }

    /// Replace settings, returning whether anything changed.
    pub fn update_settings(&mut self, settings: Settings) -> bool {
        if settings == self.settings {
            return false;
        }
        self.settings = settings;
        self.persist(Collection::Settings);
        true
    }

    // ------------------------------------------------------------------
    // Remote merges
    // ------------------------------------------------------------------

    /// Merge a remote (or imported) snapshot using the collection's policy.
    pub fn apply_remote(&mut self, snapshot: RemoteSnapshot) -> Result<ApplyOutcome> {
        let collection = snapshot.collection();
        let incoming = snapshot.fingerprint()?;
        let before = self.fingerprint(collection)?;
        tracing::debug!(
            "Merging incoming {collection} with {:?}",
            MergePolicy::for_collection(collection)
        );

        match snapshot {
            RemoteSnapshot::Bookmarks(remote) => {
                let outcome = merge_last_write_wins_with_report(&self.bookmarks, &remote);
                for conflict in outcome.conflicts {
                    tracing::debug!(
                        "Resolved conflict for {} ({} vs {}): {:?} wins",
                        conflict.record_id,
                        conflict.local_updated_at,
                        conflict.incoming_updated_at,
                        conflict.winner
                    );
                    if self.conflicts.len() == MAX_RECENT_CONFLICTS {
                        self.conflicts.pop_front();
                    }
                    self.conflicts.push_back(conflict);
                }
                self.bookmarks = outcome.records;
            }
            RemoteSnapshot::Dock(remote) => {
                self.dock = merge_remote_wins(&self.dock, &remote);
            }
            RemoteSnapshot::Settings(remote) => {
                self.settings = remote;
            }
        }

        let after = self.fingerprint(collection)?;
        let changed = after != before;
        if changed {
            self.persist(collection);
        }

        Ok(ApplyOutcome {
            collection,
            changed,
            matches_remote: after == incoming,
            fingerprint: after,
        })
    }

    // ------------------------------------------------------------------
    // Write-through
    // ------------------------------------------------------------------

    fn persist(&mut self, collection: Collection) {
        let Persistence::Durable(db) = &self.persistence else {
            return;
        };

        let result = self.fingerprint(collection).and_then(|json| {
            SqliteCacheRepository::new(db.connection()).put(
                collection.cache_key(),
                &json,
                self.clock.now_ms(),
            )
        });

        match result {
            Ok(()) => self.write_warning = None,
            Err(error) if is_permission_error(&error) => {
                tracing::warn!(
                    "Cache write for {collection} was refused ({error}); continuing in memory only"
                );
                self.persistence = Persistence::MemoryOnly {
                    reason: format!("cache write refused: {error}"),
                };
            }
            Err(error) => {
                tracing::warn!("Failed to write cached {collection}: {error}");
                self.write_warning = Some(format!("failed to write {collection}: {error}"));
            }
        }
    }
}

fn check_fields(id: &str, name: &str, url: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidInput("id must not be empty".to_string()));
    }
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("name must not be empty".to_string()));
    }
    validate_url(url).map_err(|rejection| Error::InvalidInput(rejection.to_string()))?;
    Ok(())
}

fn is_permission_error(error: &Error) -> bool {
    use rusqlite::ErrorCode;

    matches!(
        error,
        Error::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
            if matches!(
                failure.code,
                ErrorCode::ReadOnly
                    | ErrorCode::PermissionDenied
                    | ErrorCode::CannotOpen
                    | ErrorCode::AuthorizationForStatementDenied
            )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn clock(at: i64) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(at))
    }

    fn store_at(clock: &Arc<ManualClock>) -> LocalStore {
        LocalStore::open_in_memory(clock.clone()).unwrap()
    }

    fn draft(id: &str) -> BookmarkDraft {
        BookmarkDraft {
            id: Some(id.to_string()),
            ..BookmarkDraft::new(format!("site {id}"), format!("https://{id}.example"))
        }
    }

    #[test]
    fn create_stamps_and_lists() {
        let clock = clock(1_000);
        let mut store = store_at(&clock);

        let bookmark = store.create_bookmark(draft("a")).unwrap();
        assert_eq!(bookmark.updated_at, 1_000);
        assert_eq!(store.bookmarks().len(), 1);
    }

    #[test]
    fn create_rejects_bad_input_and_duplicate_ids() {
        let clock = clock(1);
        let mut store = store_at(&clock);

        assert!(matches!(
            store.create_bookmark(BookmarkDraft::new("x", "not a url")),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.create_bookmark(BookmarkDraft::new("  ", "https://x.example")),
            Err(Error::InvalidInput(_))
        ));

        store.create_bookmark(draft("a")).unwrap();
        assert!(matches!(
            store.create_bookmark(draft("a")),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn update_bumps_timestamp_only_on_change() {
        let clock = clock(100);
        let mut store = store_at(&clock);
        store.create_bookmark(draft("a")).unwrap();

        clock.set(200);
        let same = store
            .update_bookmark(
                "a",
                BookmarkPatch {
                    name: Some("site a".to_string()),
                    ..BookmarkPatch::default()
                },
            )
            .unwrap();
        assert_eq!(same.updated_at, 100);

        let renamed = store
            .update_bookmark(
                "a",
                BookmarkPatch {
                    name: Some("renamed".to_string()),
                    ..BookmarkPatch::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.updated_at, 200);
    }

    #[test]
    fn timestamps_never_move_backwards() {
        let clock = clock(500);
        let mut store = store_at(&clock);
        store.create_bookmark(draft("a")).unwrap();

        clock.set(100);
        let edited = store.record_visit("a").unwrap();
        assert_eq!(edited.updated_at, 500);
        assert_eq!(edited.visit_count, 1);
        assert_eq!(edited.last_visited, Some(100));
    }

    #[test]
    fn delete_keeps_tombstone_but_hides_it() {
        let clock = clock(10);
        let mut store = store_at(&clock);
        store.create_bookmark(draft("a")).unwrap();

        clock.set(20);
        store.delete_bookmark("a").unwrap();

        assert!(store.bookmarks().is_empty());
        assert!(store.bookmark("a").is_none());
        assert_eq!(store.all_bookmarks().len(), 1);
        assert!(store.all_bookmarks()[0].deleted);
        assert_eq!(store.all_bookmarks()[0].updated_at, 20);

        assert!(matches!(store.delete_bookmark("a"), Err(Error::NotFound(_))));
        assert!(matches!(
            store.update_bookmark("a", BookmarkPatch::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn cache_round_trips_through_disk() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("cache.db");
        let clock = clock(1);

        {
            let mut store = LocalStore::open(&path, true, clock.clone());
            assert!(store.is_durable());
            store.create_bookmark(draft("a")).unwrap();
            store.create_bookmark(draft("b")).unwrap();
            store.delete_bookmark("b").unwrap();
            store
                .add_dock_item(DockItem::new("Mail", "https://mail.example"))
                .unwrap();
            store.update_settings(Settings {
                open_in_new_tab: true,
                ..Settings::default()
            });
        }

        let reopened = LocalStore::open(&path, true, clock);
        assert_eq!(reopened.all_bookmarks().len(), 2);
        assert_eq!(reopened.bookmarks().len(), 1);
        assert_eq!(reopened.dock_items().len(), 1);
        assert!(reopened.settings().open_in_new_tab);
    }

    #[test]
    fn corrupt_cache_loads_as_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("cache.db");
        {
            let db = Database::open(&path).unwrap();
            let repo = SqliteCacheRepository::new(db.connection());
            repo.put(Collection::Bookmarks.cache_key(), "{not json", 1)
                .unwrap();
            repo.put(Collection::Dock.cache_key(), r#"{"id":"x"}"#, 1)
                .unwrap();
            repo.put(Collection::Settings.cache_key(), "[]", 1).unwrap();
        }

        let store = LocalStore::open(&path, true, clock(1));
        assert!(store.all_bookmarks().is_empty());
        assert!(store.dock_items().is_empty());
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn invalid_cached_records_are_dropped_and_counted() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("cache.db");
        {
            let db = Database::open(&path).unwrap();
            SqliteCacheRepository::new(db.connection())
                .put(
                    Collection::Bookmarks.cache_key(),
                    r#"[
                        {"id":"1","name":"ok","url":"https://ok.example","updatedAt":1},
                        {"id":"","name":"no id","url":"https://x.example"},
                        {"id":"3","name":"bad url","url":"ok.example"}
                    ]"#,
                    1,
                )
                .unwrap();
        }

        let store = LocalStore::open(&path, true, clock(1));
        assert_eq!(store.all_bookmarks().len(), 1);
        assert_eq!(store.load_report().rejected_bookmarks, 2);
    }

    #[test]
    fn no_consent_runs_memory_only() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("cache.db");

        let mut store = LocalStore::open(&path, false, clock(1));
        assert!(!store.is_durable());
        assert!(store.persistence_warning().is_some());

        store.create_bookmark(draft("a")).unwrap();
        assert_eq!(store.bookmarks().len(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn refused_cache_write_degrades_to_memory_only() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("cache.db");

        let mut store = LocalStore::open(&path, true, clock(1));
        assert!(store.is_durable());
        let Persistence::Durable(db) = &store.persistence else {
            panic!("expected a durable store");
        };
        db.connection()
            .execute_batch("PRAGMA query_only = ON")
            .unwrap();

        store.create_bookmark(draft("a")).unwrap();
        assert_eq!(store.bookmarks().len(), 1);
        assert!(!store.is_durable());
        assert!(store
            .persistence_warning()
            .is_some_and(|reason| reason.contains("refused")));

        // Later mutations keep working in memory
        store.create_bookmark(draft("b")).unwrap();
        assert_eq!(store.bookmarks().len(), 2);

        let reopened = LocalStore::open(&path, true, clock(2));
        assert!(reopened.bookmarks().is_empty());
    }

    #[test]
    fn apply_remote_merges_bookmarks_with_lww() {
        let clock = clock(100);
        let mut store = store_at(&clock);
        store.create_bookmark(draft("a")).unwrap();

        let mut newer = store.all_bookmarks()[0].clone();
        newer.name = "from elsewhere".to_string();
        newer.updated_at = 150;
        let other = Bookmark::from_draft(draft("b"), 90);

        let outcome = store
            .apply_remote(RemoteSnapshot::Bookmarks(vec![newer, other]))
            .unwrap();
        assert!(outcome.changed);
        assert!(outcome.matches_remote);
        assert_eq!(store.bookmark("a").unwrap().name, "from elsewhere");
        assert_eq!(store.bookmarks().len(), 2);
        assert_eq!(store.recent_conflicts().count(), 1);
    }

    #[test]
    fn apply_remote_reports_local_only_changes() {
        let clock = clock(100);
        let mut store = store_at(&clock);
        store.create_bookmark(draft("a")).unwrap();

        let outcome = store
            .apply_remote(RemoteSnapshot::Bookmarks(Vec::new()))
            .unwrap();
        assert!(!outcome.changed);
        assert!(!outcome.matches_remote);
    }

    #[test]
    fn apply_remote_dock_and_settings_use_remote_wins() {
        let clock = clock(1);
        let mut store = store_at(&clock);
        let mut item = store
            .add_dock_item(DockItem::new("Mail", "https://mail.example"))
            .unwrap();

        item.name = "Inbox".to_string();
        let outcome = store
            .apply_remote(RemoteSnapshot::Dock(vec![item]))
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(store.dock_items()[0].name, "Inbox");

        let remote_settings = Settings {
            search_engine: "duckduckgo".to_string(),
            ..Settings::default()
        };
        store
            .apply_remote(RemoteSnapshot::Settings(remote_settings.clone()))
            .unwrap();
        assert_eq!(store.settings(), &remote_settings);
    }

    #[test]
    fn dock_remove_is_hard_delete() {
        let clock = clock(1);
        let mut store = store_at(&clock);
        let item = store
            .add_dock_item(DockItem::new("Mail", "https://mail.example"))
            .unwrap();

        store.remove_dock_item(&item.id).unwrap();
        assert!(store.dock_items().is_empty());
        assert!(matches!(
            store.remove_dock_item(&item.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn update_settings_reports_change() {
        let mut store = store_at(&clock(1));
        assert!(!store.update_settings(Settings::default()));
        assert!(store.update_settings(Settings {
            show_dock: false,
            ..Settings::default()
        }));
    }
}
