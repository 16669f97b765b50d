//! Start page settings model

use serde::{Deserialize, Serialize};

/// Lower bound for the user-adjustable push debounce window.
pub const MIN_DEBOUNCE_MS: u64 = 500;
/// Upper bound for the user-adjustable push debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 30_000;
/// Push debounce window used until the user picks one.
pub const DEFAULT_DEBOUNCE_MS: u64 = 2_000;

/// Theme mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
    /// Follow system preference
    #[default]
    System,
}

/// Lightweight settings blob, synced as its own collection.
///
/// Unknown or missing fields fall back to defaults so older and newer
/// clients can share one blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub theme: ThemeMode,
    /// Search engine key used by the search box (e.g. "google", "duckduckgo")
    pub search_engine: String,
    pub open_in_new_tab: bool,
    pub show_dock: bool,
    /// Push local changes automatically after the debounce window
    pub auto_sync: bool,
    /// Debounce window for automatic pushes, in milliseconds
    pub sync_debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::System,
            search_engine: "google".to_string(),
            open_in_new_tab: false,
            show_dock: true,
            auto_sync: true,
            sync_debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Settings {
    /// Debounce window clamped to the supported range.
    #[must_use]
    pub fn clamped_debounce_ms(&self) -> u64 {
        self.sync_debounce_ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS)
    }
}
