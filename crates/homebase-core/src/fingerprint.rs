//! Change fingerprints used to skip redundant pushes.
//!
//! A fingerprint is the compact JSON serialization of a collection's full
//! state, tombstones included. Struct fields serialize in declaration order
//! and `serde_json::Map` keeps keys sorted, so one logical state always
//! produces the same string.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Collection;

/// Stable serialization of `value`.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// A push is needed unless the state matches the last pushed fingerprint.
#[must_use]
pub fn should_push(current: &str, last_pushed: Option<&str>) -> bool {
    last_pushed != Some(current)
}

/// Last successfully pushed (or observed remote) fingerprint per collection.
#[derive(Debug, Default, Clone)]
pub struct ChangeDetector {
    last_pushed: HashMap<Collection, String>,
}

impl ChangeDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn should_push(&self, collection: Collection, current: &str) -> bool {
        should_push(current, self.last_pushed(collection))
    }

    #[must_use]
    pub fn last_pushed(&self, collection: Collection) -> Option<&str> {
        self.last_pushed.get(&collection).map(String::as_str)
    }

    pub fn mark_pushed(&mut self, collection: Collection, fingerprint: String) {
        self.last_pushed.insert(collection, fingerprint);
    }

    /// Forget everything, e.g. after switching users.
    pub fn reset(&mut self) {
        self.last_pushed.clear();
    }
}
