//! In-process remote store.
//!
//! Backs local-only sessions and tests: it counts pushes, can simulate
//! latency, and can be told to fail the next calls.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{GatewayError, GatewayResult, RemoteGateway};
use crate::models::Collection;

#[derive(Debug, Default)]
pub struct MemoryGateway {
    rows: Mutex<HashMap<(String, Collection), Value>>,
    push_counts: Mutex<HashMap<Collection, usize>>,
    push_failures: Mutex<VecDeque<GatewayError>>,
    pull_failures: Mutex<VecDeque<GatewayError>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every push by `latency` (tokio time, so paused clocks apply).
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Store a document as if another device had pushed it.
    pub fn seed(&self, user_id: &str, collection: Collection, payload: Value) {
        lock(&self.rows).insert((user_id.to_string(), collection), payload);
    }

    #[must_use]
    pub fn stored(&self, user_id: &str, collection: Collection) -> Option<Value> {
        lock(&self.rows)
            .get(&(user_id.to_string(), collection))
            .cloned()
    }

    /// Successful pushes so far for `collection`.
    #[must_use]
    pub fn push_count(&self, collection: Collection) -> usize {
        lock(&self.push_counts)
            .get(&collection)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of pushes that were running at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn fail_next_push(&self, error: GatewayError) {
        lock(&self.push_failures).push_back(error);
    }

    pub fn fail_next_pull(&self, error: GatewayError) {
        lock(&self.pull_failures).push_back(error);
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn pull(&self, user_id: &str, collection: Collection) -> GatewayResult<Option<Value>> {
        if let Some(error) = lock(&self.pull_failures).pop_front() {
            return Err(error);
        }
        Ok(self.stored(user_id, collection))
    }

    async fn push(
        &self,
        user_id: &str,
        collection: Collection,
        payload: &Value,
    ) -> GatewayResult<()> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failure = lock(&self.push_failures).pop_front();
        let result = match failure {
            Some(error) => Err(error),
            None => {
                self.seed(user_id, collection, payload.clone());
                *lock(&self.push_counts).entry(collection).or_insert(0) += 1;
                Ok(())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
