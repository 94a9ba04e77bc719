//! Arcade Core - shared engine substrate for browser arcade games
//!
//! Core modules:
//! - `scheduler`: Threshold-gated frame scheduler
//! - `lifecycle`: Idle/Running/Paused/Finished state machine
//! - `progression`: Achievement evaluation from lifetime stats
//! - `persistence`: Best-effort stats storage
//! - `session`: One mounted game tying the above together
//! - `platform`: Browser/native tick sources and storage backends

pub mod config;
pub mod demo;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod titles;

pub use config::EngineConfig;
pub use error::{ConfigError, StorageError, TimingError, TransitionError};
pub use events::{EngineEvent, EventSink, LogSink};
pub use lifecycle::{Lifecycle, LifecycleState, Transition};
pub use persistence::{PersistenceConfig, PersistenceGateway, Storage};
pub use progression::{AchievementDefinition, AchievementState, Category, DEFAULT_ACHIEVEMENTS};
pub use scheduler::{FrameScheduler, LoopTiming, TickSource};
pub use session::{FrameOutcome, Game, GameSession};
pub use stats::{Leaderboard, LeaderboardEntry, PlayerStats, RoundSummary};
pub use titles::GameTitle;
