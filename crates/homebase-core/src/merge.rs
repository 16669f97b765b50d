//! Deterministic reconciliation of local and remote record sets.
//!
//! Two policies coexist and are kept apart on purpose:
//!
//! - [`merge_last_write_wins`] for bookmarks: per-`id` whole-record
//!   comparison of `updated_at`, strictly greater remote wins, ties stay
//!   local, tombstones compete like live records.
//! - [`merge_remote_wins`] for dock items: plain `id`-keyed union where
//!   the remote copy replaces a local one with the same id.
//!
//! Both are pure. Output order is local order followed by remote-only
//! records in remote order, so repeated merges are stable.

use std::collections::HashMap;

use crate::models::{Collection, ConflictWinner, Identified, Record, SyncConflict};

/// Named merge strategy applied to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Timestamp comparison with tombstones, local wins ties.
    LastWriteWins,
    /// Id union, remote wins collisions, no timestamps or tombstones.
    RemoteWinsUnion,
    /// Single blob, a present remote copy replaces the local one.
    RemoteReplaces,
}

impl MergePolicy {
    #[must_use]
    pub const fn for_collection(collection: Collection) -> Self {
        match collection {
            Collection::Bookmarks => Self::LastWriteWins,
            Collection::Dock => Self::RemoteWinsUnion,
            Collection::Settings => Self::RemoteReplaces,
        }
    }
}

/// Merged set plus every id where both sides held different content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome<T> {
    pub records: Vec<T>,
    pub conflicts: Vec<SyncConflict>,
}

/// Last-write-wins merge of `remote` into `local`.
#[must_use]
pub fn merge_last_write_wins<T>(local: &[T], remote: &[T]) -> Vec<T>
where
    T: Record + Clone + PartialEq,
{
    merge_last_write_wins_with_report(local, remote).records
}

/// Same as [`merge_last_write_wins`] but also reports differing pairs.
#[must_use]
pub fn merge_last_write_wins_with_report<T>(local: &[T], remote: &[T]) -> MergeOutcome<T>
where
    T: Record + Clone + PartialEq,
{
    let mut records: Vec<T> = Vec::with_capacity(local.len() + remote.len());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(local.len() + remote.len());
    let mut conflicts = Vec::new();

    // A duplicated id inside `local` resolves by the same rule.
    for record in local {
        match slots.get(record.id()) {
            Some(&slot) => {
                if record.updated_at() > records[slot].updated_at() {
                    records[slot] = record.clone();
                }
            }
            None => {
                slots.insert(record.id().to_string(), records.len());
                records.push(record.clone());
            }
        }
    }

    for incoming in remote {
        let Some(&slot) = slots.get(incoming.id()) else {
            slots.insert(incoming.id().to_string(), records.len());
            records.push(incoming.clone());
            continue;
        };

        let current = &records[slot];
        if current == incoming {
            continue;
        }

        let remote_wins = incoming.updated_at() > current.updated_at();
        conflicts.push(SyncConflict {
            record_id: incoming.id().to_string(),
            local_updated_at: current.updated_at(),
            incoming_updated_at: incoming.updated_at(),
            winner: if remote_wins {
                ConflictWinner::Remote
            } else {
                ConflictWinner::Local
            },
        });
        if remote_wins {
            records[slot] = incoming.clone();
        }
    }

    MergeOutcome { records, conflicts }
}

/// Id-keyed union where the remote copy wins every collision.
#[must_use]
pub fn merge_remote_wins<T>(local: &[T], remote: &[T]) -> Vec<T>
where
    T: Identified + Clone,
{
    let mut records: Vec<T> = Vec::with_capacity(local.len() + remote.len());
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in local.iter().chain(remote) {
        if let Some(&slot) = slots.get(record.id()) {
            records[slot] = record.clone();
        } else {
            slots.insert(record.id().to_string(), records.len());
            records.push(record.clone());
        }
    }

    records
}
