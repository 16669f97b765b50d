//! One signed-in user's sync session.
//!
//! The session is the explicit owner of everything that used to be ambient
//! state: the local store, the scheduler, the event bus and the background
//! tasks. It is constructed at login and torn down with [`SyncSession::close`]
//! at logout.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::config::{clamp_debounce, AppConfig, SyncConfig};
use crate::error::{Error, Result};
use crate::events::{EventBus, RemoteSnapshot, SyncEvent};
use crate::export::{parse_import, render_export, ExportDocument, ExportFormat, ImportReport};
use crate::gateway::{ErrorClass, MemoryGateway, RemoteGateway, SupabaseGateway};
use crate::models::{
    Bookmark, BookmarkDraft, BookmarkPatch, Collection, DockItem, DockItemPatch, Settings,
    SyncConflict,
};
use crate::scheduler::{SharedStore, SyncScheduler};
use crate::state::SyncState;
use crate::store::{LoadReport, LocalStore};

/// State shared between the session and its background tasks.
#[derive(Clone)]
struct Shared {
    user_id: Arc<str>,
    store: SharedStore,
    gateway: Arc<dyn RemoteGateway>,
    scheduler: Arc<SyncScheduler>,
    bus: EventBus,
}

/// Thread-safe handle over a user's records and their sync machinery.
pub struct SyncSession {
    shared: Shared,
    clock: Arc<dyn Clock>,
    listener: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl SyncSession {
    /// Start a session: spawn the scheduler and bus listener, pull and merge
    /// every collection, then start the periodic pull if configured.
    ///
    /// A failed initial pull is logged and recorded in the sync state; the
    /// session still starts with the local data.
    pub async fn start(
        user_id: impl Into<String>,
        store: LocalStore,
        gateway: Arc<dyn RemoteGateway>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        let user_id: Arc<str> = Arc::from(user_id.into());
        // Knobs the user saved win over configured defaults
        let config = if store.is_empty(Collection::Settings) {
            config
        } else {
            config.with_settings(store.settings())
        };
        let store = Arc::new(Mutex::new(store));
        let scheduler = Arc::new(SyncScheduler::spawn(
            &*user_id,
            store.clone(),
            gateway.clone(),
            clock.clone(),
            &config,
        ));

        let shared = Shared {
            user_id,
            store,
            gateway,
            scheduler,
            bus: EventBus::new(config.event_capacity),
        };

        let listener = tokio::spawn(listen(shared.clone(), shared.bus.subscribe()));

        if let Err(error) = shared.pull_all().await {
            tracing::warn!("Initial pull for {} failed: {error}", shared.user_id);
        }

        let poller = config
            .pull_interval
            .map(|period| tokio::spawn(poll(shared.clone(), period)));

        tracing::info!("Sync session started for {}", shared.user_id);
        Self {
            shared,
            clock,
            listener: Some(listener),
            poller,
        }
    }

    /// Build the store and gateway described by `config` and start a session.
    ///
    /// Without a remote configuration the session runs against an
    /// in-process gateway, which keeps the app fully usable offline.
    pub async fn from_config(
        config: &AppConfig,
        user_id: impl Into<String>,
        access_token: Option<&str>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = match &config.cache_path {
            Some(path) => LocalStore::open(path, config.persistence_consent, clock.clone()),
            None => LocalStore::memory_only(clock.clone(), "no cache path configured"),
        };

        let gateway: Arc<dyn RemoteGateway> = match &config.remote {
            Some(remote) => {
                let mut gateway = SupabaseGateway::new(remote)?;
                if let Some(token) = access_token {
                    gateway.set_access_token(token);
                }
                Arc::new(gateway)
            }
            None => {
                tracing::info!("Running in local-only mode (no remote config)");
                Arc::new(MemoryGateway::new())
            }
        };

        Ok(Self::start(user_id, store, gateway, clock, config.sync.clone()).await)
    }

    pub fn user_id(&self) -> &str {
        &self.shared.user_id
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Visible bookmarks in display order.
    pub async fn bookmarks(&self) -> Vec<Bookmark> {
        let store = self.shared.store.lock().await;
        store.bookmarks().into_iter().cloned().collect()
    }

    pub async fn bookmark(&self, id: &str) -> Option<Bookmark> {
        self.shared.store.lock().await.bookmark(id).cloned()
    }

    pub async fn dock_items(&self) -> Vec<DockItem> {
        self.shared.store.lock().await.dock_items().to_vec()
    }

    pub async fn settings(&self) -> Settings {
        self.shared.store.lock().await.settings().clone()
    }

    /// Conflicts resolved by recent merges, oldest first.
    pub async fn recent_conflicts(&self) -> Vec<SyncConflict> {
        let store = self.shared.store.lock().await;
        store.recent_conflicts().cloned().collect()
    }

    pub async fn load_report(&self) -> LoadReport {
        self.shared.store.lock().await.load_report()
    }

    /// Why local data is not being persisted, if it is not.
    pub async fn persistence_warning(&self) -> Option<String> {
        let store = self.shared.store.lock().await;
        store.persistence_warning().map(str::to_string)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn create_bookmark(&self, draft: BookmarkDraft) -> Result<Bookmark> {
        self.mutate(Collection::Bookmarks, |store| store.create_bookmark(draft))
            .await
    }

    pub async fn update_bookmark(&self, id: &str, patch: BookmarkPatch) -> Result<Bookmark> {
        self.mutate(Collection::Bookmarks, |store| store.update_bookmark(id, patch))
            .await
    }

    pub async fn delete_bookmark(&self, id: &str) -> Result<()> {
        self.mutate(Collection::Bookmarks, |store| store.delete_bookmark(id))
            .await
    }

    pub async fn record_visit(&self, id: &str) -> Result<Bookmark> {
        self.mutate(Collection::Bookmarks, |store| store.record_visit(id))
            .await
    }

    pub async fn add_dock_item(&self, item: DockItem) -> Result<DockItem> {
        self.mutate(Collection::Dock, |store| store.add_dock_item(item))
            .await
    }

    pub async fn update_dock_item(&self, id: &str, patch: DockItemPatch) -> Result<DockItem> {
        self.mutate(Collection::Dock, |store| store.update_dock_item(id, patch))
            .await
    }

    pub async fn remove_dock_item(&self, id: &str) -> Result<()> {
        self.mutate(Collection::Dock, |store| store.remove_dock_item(id))
            .await
    }

    /// Replace the settings blob. Sync knobs take effect immediately.
    pub async fn update_settings(&self, settings: Settings) -> bool {
        let changed = self
            .shared
            .store
            .lock()
            .await
            .update_settings(settings.clone());
        if changed {
            self.shared.apply_settings(&settings);
            self.shared.scheduler.on_mutation(Collection::Settings);
        }
        changed
    }

    async fn mutate<T>(
        &self,
        collection: Collection,
        apply: impl FnOnce(&mut LocalStore) -> Result<T>,
    ) -> Result<T> {
        let result = {
            let mut store = self.shared.store.lock().await;
            apply(&mut *store)?
        };
        self.shared.scheduler.on_mutation(collection);
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Push pending changes now instead of waiting for the debounce window.
    pub async fn flush_now(&self) -> Result<()> {
        self.shared.scheduler.flush_now().await
    }

    /// Pull every collection and wait until changed ones are merged.
    ///
    /// Returns how many collections differed from the local state.
    pub async fn pull_now(&self) -> Result<usize> {
        self.shared.pull_all().await
    }

    pub fn state(&self) -> SyncState {
        self.shared.scheduler.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.shared.scheduler.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.shared.bus.subscribe()
    }

    pub fn dismiss_error(&self) {
        self.shared.scheduler.dismiss_error();
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    pub async fn export_document(&self) -> ExportDocument {
        let store = self.shared.store.lock().await;
        ExportDocument::new(
            store.all_bookmarks(),
            store.dock_items(),
            store.settings(),
            self.clock.now_ms(),
        )
    }

    pub async fn export(&self, format: ExportFormat) -> Result<String> {
        let document = self.export_document().await;
        Ok(render_export(&document, format)?)
    }

    /// Merge an import file into the local data.
    ///
    /// Imported records are treated as the incoming side of a merge, so a
    /// newer local edit is never overwritten by an older backup.
    pub async fn import_json(&self, input: &str) -> Result<ImportReport> {
        let batch = parse_import(input);
        if !batch.report.success {
            return Ok(batch.report);
        }

        let mut snapshots = Vec::new();
        if !batch.bookmarks.is_empty() {
            snapshots.push(RemoteSnapshot::Bookmarks(batch.bookmarks));
        }
        if !batch.dock_items.is_empty() {
            snapshots.push(RemoteSnapshot::Dock(batch.dock_items));
        }
        if let Some(settings) = batch.settings {
            snapshots.push(RemoteSnapshot::Settings(settings));
        }

        let (touched, settings) = {
            let mut store = self.shared.store.lock().await;
            let mut touched = Vec::new();
            for snapshot in snapshots {
                let outcome = store.apply_remote(snapshot)?;
                if outcome.changed {
                    touched.push(outcome.collection);
                }
            }
            (touched, store.settings().clone())
        };

        for collection in touched {
            if collection == Collection::Settings {
                self.shared.apply_settings(&settings);
            }
            self.shared.scheduler.on_mutation(collection);
        }

        tracing::info!(
            "Imported {} records ({} rejected)",
            batch.report.imported_count,
            batch.report.rejected_count
        );
        Ok(batch.report)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Flush pending changes and stop every background task.
    ///
    /// The flush result is returned after shutdown completes, so a failed
    /// final push is still reported.
    pub async fn close(mut self) -> Result<()> {
        let flushed = self.shared.scheduler.flush_now().await;

        for task in [self.poller.take(), self.listener.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
            let _ = task.await;
        }
        self.shared.scheduler.shutdown().await;

        tracing::info!("Sync session closed for {}", self.shared.user_id);
        flushed
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        for task in [self.poller.take(), self.listener.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

impl Shared {
    fn apply_settings(&self, settings: &Settings) {
        self.scheduler
            .set_window(clamp_debounce(settings.sync_debounce_ms));
        self.scheduler.set_auto_sync(settings.auto_sync);
    }

    async fn pull_all(&self) -> Result<usize> {
        // Subscribe before publishing so no merge notification is missed
        let mut events = self.bus.subscribe();
        let mut awaiting = BTreeSet::new();
        let mut first_error: Option<Error> = None;

        for collection in Collection::ALL {
            match self.pull_collection(collection).await {
                Ok(true) => {
                    awaiting.insert(collection);
                }
                Ok(false) => {}
                Err(Error::Gateway(error)) if error.class() == ErrorClass::SchemaDrift => {
                    tracing::warn!("Ignoring schema drift while pulling {collection}: {error}");
                }
                Err(error) => {
                    tracing::warn!("Pull of {collection} failed: {error}");
                    first_error.get_or_insert(error);
                }
            }
        }

        let updated = awaiting.len();
        while !awaiting.is_empty() {
            match events.recv().await {
                Ok(SyncEvent::Merged { collection, .. }) => {
                    awaiting.remove(&collection);
                }
                Ok(SyncEvent::RemoteUpdated(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Stopped waiting for merges after missing {skipped} events");
                    break;
                }
                Err(RecvError::Closed) => break,
            }
        }

        if let Some(error) = first_error {
            let message = error.to_string();
            self.scheduler
                .update_state(|state| state.sync_error = Some(message));
            return Err(error);
        }

        let now = self.scheduler.now_ms();
        self.scheduler
            .update_state(|state| state.last_sync_time = Some(now));
        Ok(updated)
    }

    /// Pull one collection. Returns whether a snapshot was published for merging.
    async fn pull_collection(&self, collection: Collection) -> Result<bool> {
        let Some(payload) = self.gateway.pull(&self.user_id, collection).await? else {
            // Nothing remote yet; upload what this device has
            if !self.store.lock().await.is_empty(collection) {
                self.scheduler.on_mutation(collection);
            }
            return Ok(false);
        };

        let Some((snapshot, rejected)) = RemoteSnapshot::decode(collection, &payload) else {
            // Unusable remote copy; keep local data untouched
            return Ok(false);
        };
        if rejected > 0 {
            tracing::warn!("Dropped {rejected} invalid remote {collection} records");
        }

        let incoming = snapshot.fingerprint()?;
        let local = self.store.lock().await.fingerprint(collection)?;
        if incoming == local {
            self.scheduler.note_remote_state(collection, incoming);
            return Ok(false);
        }

        self.bus.publish(SyncEvent::RemoteUpdated(snapshot));
        Ok(true)
    }

    /// Merge a remote snapshot into the store and announce the result.
    async fn merge_remote(&self, snapshot: RemoteSnapshot) {
        let collection = snapshot.collection();
        let merged = {
            let mut store = self.store.lock().await;
            store
                .apply_remote(snapshot)
                .map(|outcome| (outcome, store.settings().clone()))
        };

        let changed = match merged {
            Ok((outcome, settings)) => {
                if outcome.matches_remote {
                    self.scheduler
                        .note_remote_state(collection, outcome.fingerprint);
                } else {
                    // Local records survived the merge; the remote needs them
                    self.scheduler.on_mutation(collection);
                }
                if collection == Collection::Settings && outcome.changed {
                    self.apply_settings(&settings);
                }
                tracing::debug!("Merged remote {collection} (changed: {})", outcome.changed);
                outcome.changed
            }
            Err(error) => {
                tracing::error!("Failed to merge remote {collection}: {error}");
                let message = error.to_string();
                self.scheduler
                    .update_state(|state| state.sync_error = Some(message));
                false
            }
        };

        self.bus.publish(SyncEvent::Merged { collection, changed });
    }
}

async fn listen(shared: Shared, mut events: broadcast::Receiver<SyncEvent>) {
    loop {
        match events.recv().await {
            Ok(SyncEvent::RemoteUpdated(snapshot)) => shared.merge_remote(snapshot).await,
            Ok(SyncEvent::Merged { .. }) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Sync listener skipped {skipped} events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn poll(shared: Shared, period: Duration) {
    let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        if let Err(error) = shared.pull_all().await {
            tracing::warn!("Periodic pull failed: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gateway::GatewayError;
    use crate::state::SyncStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const USER: &str = "user-1";

    struct Fixture {
        clock: Arc<ManualClock>,
        gateway: Arc<MemoryGateway>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                clock: Arc::new(ManualClock::new(20)),
                gateway: Arc::new(MemoryGateway::new()),
            }
        }

        fn store(&self) -> LocalStore {
            LocalStore::open_in_memory(self.clock.clone()).unwrap()
        }

        async fn start(&self, store: LocalStore, config: SyncConfig) -> SyncSession {
            SyncSession::start(
                USER,
                store,
                self.gateway.clone(),
                self.clock.clone(),
                config,
            )
            .await
        }

        fn stored_bookmarks(&self) -> Vec<serde_json::Value> {
            self.gateway
                .stored(USER, Collection::Bookmarks)
                .and_then(|value| value.as_array().cloned())
                .unwrap_or_default()
        }
    }

    fn draft(id: &str, name: &str) -> BookmarkDraft {
        BookmarkDraft {
            id: Some(id.to_string()),
            ..BookmarkDraft::new(name, format!("https://{id}.example"))
        }
    }

    async fn sleep_ms(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_merges_remote_data_without_pushing_it_back() {
        let fixture = Fixture::new();
        fixture.gateway.seed(
            USER,
            Collection::Bookmarks,
            json!([{"id": "a", "name": "Remote", "url": "https://a.example", "updatedAt": 10}]),
        );

        let session = fixture.start(fixture.store(), SyncConfig::default()).await;

        let bookmarks = session.bookmarks().await;
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].name, "Remote");
        assert_eq!(session.state().status(), SyncStatus::Synced);

        sleep_ms(10_000).await;
        assert_eq!(fixture.gateway.push_count(Collection::Bookmarks), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_local_record_survives_and_is_pushed() {
        let fixture = Fixture::new();
        fixture.gateway.seed(
            USER,
            Collection::Bookmarks,
            json!([
                {"id": "a", "name": "Old", "url": "https://a.example", "updatedAt": 10},
                {"id": "b", "name": "Other", "url": "https://b.example", "updatedAt": 5}
            ]),
        );
        let mut store = fixture.store();
        store.create_bookmark(draft("a", "New")).unwrap();

        let session = fixture.start(store, SyncConfig::default()).await;
        assert_eq!(session.bookmarks().await.len(), 2);
        assert_eq!(session.bookmark("a").await.unwrap().name, "New");

        sleep_ms(2_500).await;
        assert_eq!(fixture.gateway.push_count(Collection::Bookmarks), 1);
        let stored = fixture.stored_bookmarks();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["name"], json!("New"));
    }

    #[tokio::test(start_paused = true)]
    async fn local_data_is_uploaded_when_remote_is_empty() {
        let fixture = Fixture::new();
        let mut store = fixture.store();
        store.create_bookmark(draft("a", "Local")).unwrap();

        let _session = fixture.start(store, SyncConfig::default()).await;
        sleep_ms(2_500).await;

        assert_eq!(fixture.gateway.push_count(Collection::Bookmarks), 1);
        assert_eq!(fixture.gateway.push_count(Collection::Dock), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pull_publishes_remote_update_then_merge() {
        let fixture = Fixture::new();
        let session = fixture.start(fixture.store(), SyncConfig::default()).await;
        let mut events = session.subscribe_events();

        fixture.gateway.seed(
            USER,
            Collection::Dock,
            json!([{"id": "d1", "name": "Mail", "url": "https://mail.example"}]),
        );
        assert_eq!(session.pull_now().await.unwrap(), 1);

        let first = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(first, SyncEvent::RemoteUpdated(RemoteSnapshot::Dock(_))));

        let second = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            second,
            SyncEvent::Merged {
                collection: Collection::Dock,
                changed: true,
            }
        );
        assert_eq!(session.dock_items().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn mutations_are_debounced_into_one_push() {
        let fixture = Fixture::new();
        let session = fixture.start(fixture.store(), SyncConfig::default()).await;

        session.create_bookmark(draft("a", "A")).await.unwrap();
        session.create_bookmark(draft("b", "B")).await.unwrap();
        session
            .update_bookmark(
                "a",
                BookmarkPatch {
                    name: Some("A2".to_string()),
                    ..BookmarkPatch::default()
                },
            )
            .await
            .unwrap();
        session.delete_bookmark("b").await.unwrap();
        assert_eq!(session.state().pending_changes, 4);

        sleep_ms(2_500).await;
        assert_eq!(fixture.gateway.push_count(Collection::Bookmarks), 1);

        let stored = fixture.stored_bookmarks();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1]["deleted"], json!(true));
        assert_eq!(session.bookmarks().await.len(), 1);
        assert_eq!(session.state().pending_changes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn settings_change_the_debounce_window() {
        let fixture = Fixture::new();
        let session = fixture.start(fixture.store(), SyncConfig::default()).await;

        let changed = session
            .update_settings(Settings {
                sync_debounce_ms: 5_000,
                ..Settings::default()
            })
            .await;
        assert!(changed);
        session.create_bookmark(draft("a", "A")).await.unwrap();

        sleep_ms(3_000).await;
        assert_eq!(fixture.gateway.push_count(Collection::Bookmarks), 0);

        sleep_ms(3_000).await;
        assert_eq!(fixture.gateway.push_count(Collection::Bookmarks), 1);
        assert_eq!(fixture.gateway.push_count(Collection::Settings), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn import_merges_and_schedules_push() {
        let fixture = Fixture::new();
        let session = fixture.start(fixture.store(), SyncConfig::default()).await;
        session.create_bookmark(draft("a", "Mine")).await.unwrap();

        let input = json!({
            "records": [
                {"id": "a", "name": "Backup", "url": "https://a.example", "updatedAt": 1},
                {"id": "b", "name": "New", "url": "https://b.example", "updatedAt": 1},
                {"id": "c", "name": "Broken", "url": "::"}
            ],
            "version": 1
        })
        .to_string();

        let report = session.import_json(&input).await.unwrap();
        assert_eq!(
            report,
            ImportReport {
                success: true,
                imported_count: 2,
                rejected_count: 1,
            }
        );
        assert_eq!(session.bookmark("a").await.unwrap().name, "Mine");
        assert_eq!(session.bookmarks().await.len(), 2);

        sleep_ms(2_500).await;
        assert_eq!(fixture.stored_bookmarks().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn export_skips_tombstones() {
        let fixture = Fixture::new();
        let session = fixture.start(fixture.store(), SyncConfig::default()).await;
        session.create_bookmark(draft("a", "Keep")).await.unwrap();
        session.create_bookmark(draft("b", "Drop")).await.unwrap();
        session.delete_bookmark("b").await.unwrap();

        let document = session.export_document().await;
        assert_eq!(document.records.len(), 1);
        assert_eq!(document.export_time, 20);

        let markdown = session.export(ExportFormat::Markdown).await.unwrap();
        assert!(markdown.contains("[Keep]"));
        assert!(!markdown.contains("[Drop]"));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_remote_settings_keep_local_settings() {
        let fixture = Fixture::new();
        fixture.gateway.seed(
            USER,
            Collection::Settings,
            json!({"theme": "dark", "syncDebounceMs": "fast"}),
        );
        let mine = Settings {
            search_engine: "duckduckgo".to_string(),
            open_in_new_tab: true,
            ..Settings::default()
        };
        let mut store = fixture.store();
        assert!(store.update_settings(mine.clone()));

        let session = fixture.start(store, SyncConfig::default()).await;

        assert_eq!(session.settings().await, mine);
        assert_eq!(session.state().sync_error, None);
        sleep_ms(10_000).await;
        assert_eq!(session.settings().await, mine);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_initial_pull_keeps_local_data() {
        let fixture = Fixture::new();
        fixture
            .gateway
            .fail_next_pull(GatewayError::Unavailable("offline".to_string()));
        let mut store = fixture.store();
        store.create_bookmark(draft("a", "Local")).unwrap();

        let session = fixture.start(store, SyncConfig::default()).await;

        assert_eq!(session.bookmarks().await.len(), 1);
        assert_eq!(session.state().status(), SyncStatus::Error);

        session.dismiss_error();
        assert_eq!(session.state().sync_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_pull_picks_up_remote_changes() {
        let fixture = Fixture::new();
        let config = SyncConfig::default().with_pull_interval(Duration::from_secs(60));
        let session = fixture.start(fixture.store(), config).await;
        assert!(session.bookmarks().await.is_empty());

        fixture.gateway.seed(
            USER,
            Collection::Bookmarks,
            json!([{"id": "a", "name": "Elsewhere", "url": "https://a.example", "updatedAt": 50}]),
        );
        sleep_ms(61_000).await;

        assert_eq!(session.bookmarks().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_flushes_pending_changes() {
        let fixture = Fixture::new();
        let session = fixture.start(fixture.store(), SyncConfig::default()).await;
        session.create_bookmark(draft("a", "A")).await.unwrap();
        assert_eq!(fixture.gateway.push_count(Collection::Bookmarks), 0);

        session.close().await.unwrap();
        assert_eq!(fixture.gateway.push_count(Collection::Bookmarks), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn from_config_without_remote_runs_local_only() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1));
        let session = SyncSession::from_config(&AppConfig::default(), USER, None, clock)
            .await
            .unwrap();

        session.create_bookmark(draft("a", "A")).await.unwrap();
        assert!(session.persistence_warning().await.is_some());
        assert_eq!(session.user_id(), USER);
        session.close().await.unwrap();
    }
}
