//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Ticks (requestAnimationFrame on web, manual stepping elsewhere)
//! - Storage (LocalStorage on web, in-memory elsewhere)
//! - Mounting a session into the browser frame loop

use std::collections::HashMap;

use crate::error::{StorageError, TimingError};
use crate::persistence::Storage;
use crate::scheduler::TickSource;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Tick source stepped by the host itself
///
/// Headless hosts and tests request nothing from a display; they call
/// [`GameSession::on_frame`](crate::session::GameSession::on_frame) with their
/// own timestamps. This source only tracks what the scheduler asked for.
#[derive(Debug, Default)]
pub struct ManualTickSource {
    next_handle: u64,
    outstanding: Option<u64>,
    requested: u64,
    cancelled: u64,
    refuse: bool,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse all further tick requests (simulates a broken host primitive)
    pub fn set_refuse(&mut self, refuse: bool) {
        self.refuse = refuse;
    }

    /// Whether a requested tick has not been cancelled
    pub fn has_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Total ticks requested
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Total ticks cancelled
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl TickSource for ManualTickSource {
    type Handle = u64;

    fn request_tick(&mut self) -> Result<u64, TimingError> {
        if self.refuse {
            return Err(TimingError::Request("tick source refused".into()));
        }
        self.next_handle += 1;
        self.requested += 1;
        self.outstanding = Some(self.next_handle);
        Ok(self.next_handle)
    }

    fn cancel_tick(&mut self, handle: u64) {
        if self.outstanding == Some(handle) {
            self.outstanding = None;
            self.cancelled += 1;
        }
    }
}

/// Volatile key/value storage
///
/// Used on native builds and in tests. Writes can be made to fail to
/// exercise quota/disabled-storage paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Raw stored value, bypassing failure simulation
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Read("simulated read failure".into()));
        }
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Write("simulated quota exceeded".into()));
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Write("simulated storage lock".into()));
        }
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_source_cancel_only_outstanding() {
        let mut src = ManualTickSource::new();
        let first = src.request_tick().unwrap();
        let second = src.request_tick().unwrap();
        src.cancel_tick(first);
        assert!(src.has_outstanding());
        assert_eq!(src.cancelled(), 0);
        src.cancel_tick(second);
        assert!(!src.has_outstanding());
        assert_eq!(src.cancelled(), 1);
    }

    #[test]
    fn test_memory_storage_failures() {
        let mut storage = MemoryStorage::new();
        storage.set_item("k", "v").unwrap();
        storage.set_fail_writes(true);
        assert!(matches!(storage.set_item("k", "w"), Err(StorageError::Write(_))));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        storage.set_fail_reads(true);
        assert!(storage.get_item("k").is_err());
        assert_eq!(storage.raw("k"), Some("v"));
    }

    #[test]
    fn test_memory_storage_remove() {
        let mut storage = MemoryStorage::new();
        storage.set_item("k", "v").unwrap();
        storage.set_fail_writes(true);
        assert!(storage.remove_item("k").is_err());
        assert_eq!(storage.raw("k"), Some("v"));

        storage.set_fail_writes(false);
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
        // Already gone
        storage.remove_item("k").unwrap();
    }
}
