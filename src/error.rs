//! Error types for the engine substrate
//!
//! None of these ever reach the player. The session turns each of them into
//! an [`EngineEvent`](crate::events::EngineEvent) and keeps going.

use thiserror::Error;

use crate::lifecycle::{LifecycleState, Transition};

/// A lifecycle transition that is not in the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {transition:?} while {from:?}")]
pub struct TransitionError {
    pub from: LifecycleState,
    pub transition: Transition,
}

/// Failures of a storage backend or of (de)serializing the stats blob
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No storage exists on this host (e.g. localStorage disabled)
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage read failed: {0}")]
    Read(String),
    /// Quota exceeded, private mode, ...
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("could not encode stats: {0}")]
    Encode(String),
}

/// Failures of the host's per-refresh scheduling primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    /// The host has no scheduling primitive at all. This is the only fatal case.
    #[error("no timing primitive available")]
    Unavailable,
    /// A single tick request was refused; the loop degrades to a no-op
    #[error("tick request failed: {0}")]
    Request(String),
}

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("minimum frame interval must be a positive number of ms, got {0}")]
    MinInterval(f64),
    #[error("leaderboard capacity must be at least 1")]
    LeaderboardCapacity,
    #[error("storage key must not be empty")]
    EmptyStorageKey,
    #[error("invalid config JSON: {0}")]
    Parse(String),
}
