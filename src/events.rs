//! Notifications emitted by a running session
//!
//! Hosts plug in an [`EventSink`] to drive their UI (score display,
//! achievement toasts). [`LogSink`] is the default and just logs.

use std::cell::RefCell;

use crate::error::{StorageError, TimingError, TransitionError};
use crate::stats::RoundSummary;

/// Something the surrounding page may want to know about
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ScoreChanged { score: u64 },
    RoundFinished { summary: RoundSummary },
    AchievementUnlocked { id: &'static str, name: &'static str },
    /// A rejected lifecycle transition (state unchanged)
    TransitionRejected(TransitionError),
    /// Stats could not be written; in-memory stats remain authoritative
    PersistenceFailed(StorageError),
    /// Ticks can no longer be scheduled; the loop is a no-op
    TimingDegraded(TimingError),
}

/// Receiver of engine events
///
/// Takes `&self`: sinks are shared between the session and its persistence
/// gateway on a single thread, so recording sinks use interior mutability.
pub trait EventSink {
    fn notify(&self, event: &EngineEvent);
}

/// Writes events through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&self, event: &EngineEvent) {
        match event {
            EngineEvent::ScoreChanged { score } => log::trace!("score: {score}"),
            EngineEvent::RoundFinished { summary } => log::info!(
                "Round finished: {} points (rank {:?}, new high: {})",
                summary.score,
                summary.rank,
                summary.new_high_score
            ),
            EngineEvent::AchievementUnlocked { id, name } => {
                log::info!("Achievement unlocked: {name} ({id})")
            }
            EngineEvent::TransitionRejected(e) => log::warn!("Transition rejected: {e}"),
            EngineEvent::PersistenceFailed(e) => log::warn!("Stats not saved: {e}"),
            EngineEvent::TimingDegraded(e) => log::warn!("Frame loop degraded: {e}"),
        }
    }
}

/// Keeps every event in memory (tests, replay tooling)
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: &EngineEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
