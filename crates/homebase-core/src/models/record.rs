//! Traits shared by every synced record type.

use serde::{Deserialize, Deserializer};

/// Anything stored in an `id`-keyed collection.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A record that participates in last-write-wins merging.
pub trait Record: Identified {
    /// Last mutation time in Unix ms. Missing timestamps read as 0.
    fn updated_at(&self) -> i64;

    /// Tombstone flag.
    fn is_deleted(&self) -> bool;
}

/// Records that should appear in any user-facing listing (tombstones hidden).
pub fn visible<T: Record>(records: &[T]) -> impl Iterator<Item = &T> {
    records.iter().filter(|record| !record.is_deleted())
}

/// Deserialize an optional/null timestamp as 0 so old data loses every tie-break.
pub(crate) fn timestamp_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}
