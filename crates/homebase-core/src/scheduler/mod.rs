//! Debounced push scheduling.
//!
//! Every accepted local mutation calls [`SyncScheduler::on_mutation`], which
//! marks the collection dirty and re-arms the debounce timer. When the timer
//! fires, each dirty collection is snapshotted, fingerprinted, and pushed
//! only if the fingerprint differs from the last successful push. Pushes
//! never overlap: a mutation that lands while a push is running re-arms the
//! timer and the next push starts after the current one finishes.
//!
//! Failed pushes are not retried automatically. The collection stays dirty
//! and `pending_changes` stays non-zero until the next cycle or an explicit
//! [`SyncScheduler::flush_now`].

mod timer;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::fingerprint::ChangeDetector;
use crate::gateway::{ErrorClass, RemoteGateway};
use crate::models::Collection;
use crate::state::SyncState;
use crate::store::LocalStore;

pub use timer::DebounceTimer;

/// Shared handle to the store owned by a session.
pub type SharedStore = Arc<AsyncMutex<LocalStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PushOutcome {
    Pushed,
    Unchanged,
}

#[derive(Debug)]
struct Control {
    timer: DebounceTimer,
    dirty: BTreeSet<Collection>,
    window: Duration,
    auto_sync: bool,
    closed: bool,
}

struct Inner {
    user_id: String,
    store: SharedStore,
    gateway: Arc<dyn RemoteGateway>,
    clock: Arc<dyn Clock>,
    control: Mutex<Control>,
    detector: Mutex<ChangeDetector>,
    push_lock: AsyncMutex<()>,
    wake: Notify,
    state: watch::Sender<SyncState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of the debounce loop for one signed-in user.
pub struct SyncScheduler {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncScheduler {
    /// Start the scheduler loop on the current tokio runtime.
    pub fn spawn(
        user_id: impl Into<String>,
        store: SharedStore,
        gateway: Arc<dyn RemoteGateway>,
        clock: Arc<dyn Clock>,
        config: &SyncConfig,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        let inner = Arc::new(Inner {
            user_id: user_id.into(),
            store,
            gateway,
            clock,
            control: Mutex::new(Control {
                timer: DebounceTimer::new(),
                dirty: BTreeSet::new(),
                window: config.debounce,
                auto_sync: config.auto_sync,
                closed: false,
            }),
            detector: Mutex::new(ChangeDetector::new()),
            push_lock: AsyncMutex::new(()),
            wake: Notify::new(),
            state,
        });

        let task = tokio::spawn(run(inner.clone()));
        Self {
            inner,
            task: Mutex::new(Some(task)),
        }
    }

    /// Record an accepted local mutation and restart the debounce window.
    pub fn on_mutation(&self, collection: Collection) {
        {
            let mut control = self.inner.control();
            control.dirty.insert(collection);
            if control.auto_sync {
                let window = control.window;
                control.timer.arm(Instant::now(), window);
            }
        }
        self.inner
            .state
            .send_modify(|state| state.pending_changes += 1);
        self.inner.wake.notify_one();
    }

    /// Cancel the pending timer and push every dirty collection now.
    pub async fn flush_now(&self) -> Result<()> {
        self.inner.control().timer.cancel();
        self.inner.wake.notify_one();
        self.inner.push_cycle().await
    }

    /// Change the debounce window; a pending timer keeps its current deadline.
    pub fn set_window(&self, window: Duration) {
        self.inner.control().window = window;
    }

    /// Enable or disable automatic pushes.
    pub fn set_auto_sync(&self, enabled: bool) {
        {
            let mut control = self.inner.control();
            control.auto_sync = enabled;
            if !enabled {
                control.timer.cancel();
            } else if !control.dirty.is_empty() && !control.timer.is_armed() {
                let window = control.window;
                control.timer.arm(Instant::now(), window);
            }
        }
        self.inner.wake.notify_one();
    }

    /// Remember that the remote already holds `fingerprint` for `collection`.
    pub fn note_remote_state(&self, collection: Collection, fingerprint: String) {
        self.inner.detector().mark_pushed(collection, fingerprint);
    }

    #[must_use]
    pub fn has_pending_timer(&self) -> bool {
        self.inner.control().timer.is_armed()
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// Clear the user-visible error (the banner was dismissed).
    pub fn dismiss_error(&self) {
        self.inner.state.send_modify(|state| state.sync_error = None);
    }

    pub(crate) fn update_state(&self, update: impl FnOnce(&mut SyncState)) {
        self.inner.state.send_modify(update);
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.inner.clock.now_ms()
    }

    /// Stop the loop. A push already running is allowed to finish.
    pub async fn shutdown(&self) {
        self.inner.close();
        let task = lock(&self.task).take();
        if let Some(task) = task {
            if let Err(error) = task.await {
                tracing::warn!("Sync scheduler task ended abnormally: {error}");
            }
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl Inner {
    fn control(&self) -> MutexGuard<'_, Control> {
        lock(&self.control)
    }

    fn detector(&self) -> MutexGuard<'_, ChangeDetector> {
        lock(&self.detector)
    }

    fn close(&self) {
        self.control().closed = true;
        self.wake.notify_one();
    }

    async fn push_cycle(&self) -> Result<()> {
        let _in_flight = self.push_lock.lock().await;

        let collections: Vec<Collection> =
            std::mem::take(&mut self.control().dirty).into_iter().collect();
        if collections.is_empty() {
            return Ok(());
        }

        let covered = self.state.borrow().pending_changes;
        self.state.send_modify(|state| state.sync_in_progress = true);

        let mut pushed_any = false;
        let mut failed = Vec::new();
        let mut first_error: Option<Error> = None;

        for collection in collections {
            match self.push_collection(collection).await {
                Ok(PushOutcome::Pushed) => pushed_any = true,
                Ok(PushOutcome::Unchanged) => {
                    tracing::debug!("Skipping push of {collection}: no change since last push");
                }
                Err(error) if error_class(&error) == ErrorClass::SchemaDrift => {
                    tracing::warn!("Remote schema rejected part of {collection}: {error}");
                }
                Err(error) => {
                    tracing::warn!("Push of {collection} failed: {error}");
                    failed.push(collection);
                    first_error.get_or_insert(error);
                }
            }
        }

        if !failed.is_empty() {
            self.control().dirty.extend(failed);
        }

        let now = self.clock.now_ms();
        self.state.send_modify(|state| {
            state.sync_in_progress = false;
            match &first_error {
                Some(error) => state.sync_error = Some(error.to_string()),
                None => {
                    state.sync_error = None;
                    state.pending_changes = state.pending_changes.saturating_sub(covered);
                    if pushed_any {
                        state.last_sync_time = Some(now);
                    }
                }
            }
        });

        first_error.map_or(Ok(()), Err)
    }

    async fn push_collection(&self, collection: Collection) -> Result<PushOutcome> {
        // Snapshot at fire time, not at arm time
        let (payload, fingerprint) = {
            let store = self.store.lock().await;
            (store.snapshot(collection)?, store.fingerprint(collection)?)
        };

        if !self.detector().should_push(collection, &fingerprint) {
            return Ok(PushOutcome::Unchanged);
        }

        self.gateway
            .push(&self.user_id, collection, &payload)
            .await?;
        self.detector().mark_pushed(collection, fingerprint);
        tracing::debug!("Pushed {collection}");
        Ok(PushOutcome::Pushed)
    }
}

fn error_class(error: &Error) -> ErrorClass {
    match error {
        Error::Gateway(error) => error.class(),
        _ => ErrorClass::Fatal,
    }
}

async fn run(inner: Arc<Inner>) {
    loop {
        let deadline = {
            let control = inner.control();
            if control.closed {
                break;
            }
            control.timer.deadline()
        };

        match deadline {
            Some(deadline) => {
                tokio::select! {
                    () = tokio::time::sleep_until(deadline) => {
                        let due = inner.control().timer.fire(Instant::now());
                        if due {
                            // Errors are recorded in the sync state
                            let _ = inner.push_cycle().await;
                        }
                    }
                    () = inner.wake.notified() => {}
                }
            }
            None => inner.wake.notified().await,
        }
    }
    tracing::debug!("Sync scheduler for {} stopped", inner.user_id);
}
