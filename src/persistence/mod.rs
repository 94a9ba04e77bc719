//! Best-effort persistence of player statistics
//!
//! Features:
//! - One JSON blob per title, written in a single `set_item`
//! - Missing/corrupt/unreadable blobs load as defaults
//! - Leaderboards from storage are re-sorted before use
//! - Write failures are reported to the event sink, never raised to the game

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StorageError};
use crate::events::{EngineEvent, EventSink, LogSink};
use crate::stats::PlayerStats;
use crate::titles::GameTitle;

/// Key/value string storage (browser localStorage or equivalent)
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Delete `key`. Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Where a gateway keeps its blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub storage_key: String,
}

impl PersistenceConfig {
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
        }
    }

    pub fn for_title(title: GameTitle) -> Self {
        Self::new(title.storage_key())
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(self)
    }
}

/// Sole reader/writer of one title's stats blob
pub struct PersistenceGateway<S: Storage> {
    config: PersistenceConfig,
    storage: S,
    sink: Rc<dyn EventSink>,
}

impl<S: Storage> PersistenceGateway<S> {
    /// Create a gateway reporting failures to the log
    pub fn init(config: PersistenceConfig, storage: S) -> Result<Self, ConfigError> {
        Self::with_sink(config, storage, Rc::new(LogSink))
    }

    pub fn with_sink(
        config: PersistenceConfig,
        storage: S,
        sink: Rc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            config: config.validate()?,
            storage,
            sink,
        })
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn set_sink(&mut self, sink: Rc<dyn EventSink>) {
        self.sink = sink;
    }

    /// Load the stats blob. Never fails: anything unusable becomes defaults.
    pub fn load(&self) -> PlayerStats {
        let key = &self.config.storage_key;
        let json = match self.storage.get_item(key) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("No stats for {key}, starting fresh");
                return PlayerStats::default();
            }
            Err(e) => {
                log::warn!("Could not read stats for {key}: {e}");
                return PlayerStats::default();
            }
        };

        match serde_json::from_str::<PlayerStats>(&json) {
            Ok(mut stats) => {
                stats.leaderboard.tidy();
                log::info!("Loaded stats for {key} ({} games)", stats.total_games);
                stats
            }
            Err(e) => {
                log::warn!("Discarding corrupt stats for {key}: {e}");
                PlayerStats::default()
            }
        }
    }

    /// Write the whole blob. Failures are reported to the sink and returned.
    pub fn save(&mut self, stats: &PlayerStats) -> Result<(), StorageError> {
        let result = serde_json::to_string(stats)
            .map_err(|e| StorageError::Encode(e.to_string()))
            .and_then(|json| self.storage.set_item(&self.config.storage_key, &json));

        match &result {
            Ok(()) => log::debug!("Stats saved for {}", self.config.storage_key),
            Err(e) => self.sink.notify(&EngineEvent::PersistenceFailed(e.clone())),
        }
        result
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Release the gateway, handing back the storage backend
    pub fn teardown(self) -> S {
        self.storage
    }
}
