//! Runtime configuration for the sync engine.
//!
//! Values come from the embedding app or from environment variables. Only
//! public endpoints and keys live here; the user's access token is supplied
//! by the identity provider at login.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Settings, DEFAULT_DEBOUNCE_MS, MAX_DEBOUNCE_MS, MIN_DEBOUNCE_MS};
use crate::util::{is_http_url, normalize_text_option, parse_flag};

const DEFAULT_EVENT_CAPACITY: usize = 64;

const ENV_CACHE_PATH: &str = "HOMEBASE_CACHE_PATH";
const ENV_PERSIST: &str = "HOMEBASE_PERSIST";
const ENV_DEBOUNCE_MS: &str = "HOMEBASE_DEBOUNCE_MS";
const ENV_AUTO_SYNC: &str = "HOMEBASE_AUTO_SYNC";
const ENV_PULL_INTERVAL_SECS: &str = "HOMEBASE_PULL_INTERVAL_SECS";
const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";

/// Scheduler and session tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period after the last mutation before a push
    pub debounce: Duration,
    /// Push automatically when the debounce window elapses
    pub auto_sync: bool,
    /// Periodic pull cadence; `None` pulls only on demand
    pub pull_interval: Option<Duration>,
    /// Event bus buffer size
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            auto_sync: true,
            pull_interval: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Set the debounce window, clamped to the supported range.
    #[must_use]
    pub fn with_debounce_ms(mut self, millis: u64) -> Self {
        self.debounce = clamp_debounce(millis);
        self
    }

    #[must_use]
    pub const fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval = Some(interval);
        self
    }

    #[must_use]
    pub const fn without_auto_sync(mut self) -> Self {
        self.auto_sync = false;
        self
    }

    /// Take the user-adjustable knobs from synced settings.
    #[must_use]
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.debounce = Duration::from_millis(settings.clamped_debounce_ms());
        self.auto_sync = settings.auto_sync;
        self
    }
}

/// Clamp a debounce window to `[MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS]`.
#[must_use]
pub fn clamp_debounce(millis: u64) -> Duration {
    Duration::from_millis(millis.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS))
}

/// Public endpoint of the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub supabase_url: String,
    pub anon_key: String,
}

impl RemoteConfig {
    pub fn new(supabase_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
        let supabase_url = normalize_text_option(Some(supabase_url.into()))
            .ok_or_else(|| Error::Config("Supabase URL must not be empty".to_string()))?;
        if !is_http_url(&supabase_url) {
            return Err(Error::Config(
                "Supabase URL must include http:// or https://".to_string(),
            ));
        }
        let anon_key = normalize_text_option(Some(anon_key.into()))
            .ok_or_else(|| Error::Config("Supabase anon key must not be empty".to_string()))?;

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    /// `PostgREST` base URL.
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }
}

/// Everything needed to start a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Cache file location; `None` keeps the store in memory
    pub cache_path: Option<PathBuf>,
    /// Whether the user granted persistent storage
    pub persistence_consent: bool,
    /// Remote store; `None` runs local-only
    pub remote: Option<RemoteConfig>,
    pub sync: SyncConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| normalize_text_option(lookup(name));

        let cache_path = read(ENV_CACHE_PATH).map(PathBuf::from);
        let persistence_consent = read(ENV_PERSIST).is_some_and(|value| parse_flag(&value));

        let mut sync = SyncConfig::default();
        if let Some(raw) = read(ENV_DEBOUNCE_MS) {
            let millis = parse_number(ENV_DEBOUNCE_MS, &raw)?;
            sync = sync.with_debounce_ms(millis);
        }
        if let Some(raw) = read(ENV_AUTO_SYNC) {
            sync.auto_sync = parse_flag(&raw);
        }
        if let Some(raw) = read(ENV_PULL_INTERVAL_SECS) {
            let secs = parse_number(ENV_PULL_INTERVAL_SECS, &raw)?;
            if secs > 0 {
                sync = sync.with_pull_interval(Duration::from_secs(secs));
            }
        }

        let remote = match (read(ENV_SUPABASE_URL), read(ENV_SUPABASE_ANON_KEY)) {
            (Some(url), Some(key)) => Some(RemoteConfig::new(url, key)?),
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::Config(format!(
                    "{ENV_SUPABASE_URL} is set but {ENV_SUPABASE_ANON_KEY} is missing"
                )))
            }
            (None, Some(_)) => {
                return Err(Error::Config(format!(
                    "{ENV_SUPABASE_ANON_KEY} is set but {ENV_SUPABASE_URL} is missing"
                )))
            }
        };

        Ok(Self {
            cache_path,
            persistence_consent,
            remote,
            sync,
        })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| Error::Config(format!("{name} must be a non-negative integer, got {raw:?}")))
}
