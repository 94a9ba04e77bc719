//! Engine configuration
//!
//! Optional overrides live in the same storage backend as the stats, as a
//! JSON object. Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StorageError};
use crate::persistence::Storage;
use crate::stats::DEFAULT_LEADERBOARD_CAPACITY;
use crate::titles::GameTitle;

/// Default frame gate (one callback per ~60 Hz refresh)
pub const DEFAULT_MIN_INTERVAL_MS: f64 = 16.0;

/// Per-session engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Minimum ms between frame callbacks (> 0)
    pub min_interval_ms: f64,
    /// Leaderboard entries kept per title (>= 1)
    pub leaderboard_capacity: usize,
    /// Name recorded on the leaderboard
    pub player_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            leaderboard_capacity: DEFAULT_LEADERBOARD_CAPACITY,
            player_name: "Player".to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults with the title's own frame pacing
    pub fn for_title(title: GameTitle) -> Self {
        Self {
            min_interval_ms: title.min_interval_ms(),
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if !self.min_interval_ms.is_finite() || self.min_interval_ms <= 0.0 {
            return Err(ConfigError::MinInterval(self.min_interval_ms));
        }
        if self.leaderboard_capacity == 0 {
            return Err(ConfigError::LeaderboardCapacity);
        }
        Ok(self)
    }

    /// Parse and validate a JSON override
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(json)
            .map_err(|e| ConfigError::Parse(e.to_string()))?
            .validate()
    }

    /// Load overrides from storage, falling back to `fallback`
    pub fn load(storage: &impl Storage, key: &str, fallback: Self) -> Self {
        match storage.get_item(key) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded engine config from {key}");
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring engine config in {key}: {e}");
                    fallback
                }
            },
            Ok(None) => fallback,
            Err(e) => {
                log::warn!("Could not read engine config: {e}");
                fallback
            }
        }
    }

    /// Save to storage (best effort)
    pub fn save(&self, storage: &mut impl Storage, key: &str) {
        match serde_json::to_string(self) {
            Ok(json) => match storage.set_item(key, &json) {
                Ok(()) => log::info!("Engine config saved"),
                Err(e) => log::warn!("Engine config not saved: {e}"),
            },
            Err(e) => log::warn!("Engine config not encoded: {e}"),
        }
    }

    /// Drop stored overrides so the next `load` returns its fallback
    pub fn reset(storage: &mut impl Storage, key: &str) -> Result<(), StorageError> {
        storage.remove_item(key)?;
        log::info!("Engine config overrides cleared from {key}");
        Ok(())
    }
}
