//! Ephemeral sync status shown by the status indicator.
//!
//! Nothing here is persisted or consulted by merging.

/// Summary used for the indicator icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Offline,
    Syncing,
    Synced,
    Pending,
    Error,
}

/// Live sync bookkeeping for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncState {
    pub sync_in_progress: bool,
    /// Unix ms of the last successful push or pull
    pub last_sync_time: Option<i64>,
    /// User-visible, dismissible error message
    pub sync_error: Option<String>,
    /// Mutations not yet covered by a successful push
    pub pending_changes: u64,
}

impl SyncState {
    #[must_use]
    pub const fn status(&self) -> SyncStatus {
        if self.sync_in_progress {
            SyncStatus::Syncing
        } else if self.sync_error.is_some() {
            SyncStatus::Error
        } else if self.pending_changes > 0 {
            SyncStatus::Pending
        } else if self.last_sync_time.is_some() {
            SyncStatus::Synced
        } else {
            SyncStatus::Offline
        }
    }
}
