//! Game lifecycle state machine
//!
//! ```text
//! Idle --start--> Running --pause--> Paused
//!                    ^  \               |
//!                    |   \--finish--> Finished --restart--> Idle
//!                    +-----resume-------+
//! ```
//!
//! The machine only tracks state. Keeping the frame scheduler in step with it
//! (active iff `Running`) is the job of [`GameSession`](crate::session::GameSession).

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Where a game instance is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Mounted, showing the menu
    #[default]
    Idle,
    /// Frames are being delivered
    Running,
    Paused,
    /// Round over; terminal until restarted
    Finished,
}

/// A requested change of state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Start,
    Pause,
    Resume,
    Finish,
    Restart,
}

impl LifecycleState {
    /// Target state of `transition`, or `None` if the table forbids it
    pub fn target(self, transition: Transition) -> Option<LifecycleState> {
        use LifecycleState::*;
        match (self, transition) {
            (Idle, Transition::Start) => Some(Running),
            (Running, Transition::Pause) => Some(Paused),
            (Paused, Transition::Resume) => Some(Running),
            (Running, Transition::Finish) => Some(Finished),
            (Finished, Transition::Restart) => Some(Idle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Running => "running",
            LifecycleState::Paused => "paused",
            LifecycleState::Finished => "finished",
        }
    }
}

/// Lifecycle of one mounted game instance
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// Check a transition without applying it
    pub fn check(&self, transition: Transition) -> Result<LifecycleState, TransitionError> {
        self.state.target(transition).ok_or(TransitionError {
            from: self.state,
            transition,
        })
    }

    /// Apply a transition. Rejected transitions leave the state untouched.
    pub fn apply(&mut self, transition: Transition) -> Result<LifecycleState, TransitionError> {
        let next = self.check(transition)?;
        log::debug!("lifecycle: {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
        Ok(next)
    }
}
