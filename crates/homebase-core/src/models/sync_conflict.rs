//! Sync conflict model

use serde::{Deserialize, Serialize};

/// Which replica's copy survived a last-write-wins comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictWinner {
    Local,
    Remote,
}

/// Recorded sync conflict resolved by last-write-wins
///
/// Only ids present on both sides with differing content are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    /// Record involved in the conflict
    pub record_id: String,
    /// Local copy's timestamp
    pub local_updated_at: i64,
    /// Incoming copy's timestamp
    pub incoming_updated_at: i64,
    pub winner: ConflictWinner,
}
