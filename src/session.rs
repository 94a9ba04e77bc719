//! One mounted game widget
//!
//! [`GameSession`] owns the lifecycle, the frame scheduler, the lifetime stats
//! and the persistence gateway for a single game instance, and keeps them in
//! step:
//! - The scheduler is active iff the lifecycle is `Running`
//! - Leaving `Running` stops the scheduler before the new state is applied
//! - A round ended by the game inside a frame is recorded there but saved
//!   later, by [`GameSession::flush_pending`], `restart` or `teardown`.
//!   Storage is never written from inside a frame callback.
//! - Every failure becomes an [`EngineEvent`]; nothing is raised to the host

use std::rc::Rc;

use crate::config::EngineConfig;
use crate::error::{ConfigError, TransitionError};
use crate::events::{EngineEvent, EventSink, LogSink};
use crate::lifecycle::{Lifecycle, LifecycleState, Transition};
use crate::persistence::{PersistenceGateway, Storage};
use crate::progression::{self, AchievementDefinition, AchievementState, DEFAULT_ACHIEVEMENTS};
use crate::scheduler::{FrameScheduler, TickSource};
use crate::stats::{PlayerStats, RoundSummary};

/// What one frame of game logic produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Points earned this frame
    pub score_delta: u64,
    /// Terminating condition reached (lives lost, board cleared, ...)
    pub finished: bool,
}

impl FrameOutcome {
    pub fn scored(points: u64) -> Self {
        Self {
            score_delta: points,
            finished: false,
        }
    }

    pub fn finished() -> Self {
        Self {
            score_delta: 0,
            finished: true,
        }
    }
}

/// Per-title game rules plugged into the substrate
pub trait Game {
    /// Put the game back to its opening position
    fn reset(&mut self);

    /// Advance by `elapsed_ms` of real time
    fn update(&mut self, elapsed_ms: f64) -> FrameOutcome;
}

/// A game instance mounted into a host page
pub struct GameSession<G: Game, T: TickSource, S: Storage> {
    game: G,
    lifecycle: Lifecycle,
    scheduler: FrameScheduler<T>,
    gateway: PersistenceGateway<S>,
    stats: PlayerStats,
    catalog: &'static [AchievementDefinition],
    config: EngineConfig,
    sink: Rc<dyn EventSink>,
    score: u64,
    last_round: Option<RoundSummary>,
    /// Stats changed since the last successful save
    unsaved: bool,
}

impl<G: Game, T: TickSource, S: Storage> GameSession<G, T, S> {
    /// Mount a game. Loads the lifetime stats through the gateway.
    pub fn new(
        game: G,
        source: T,
        gateway: PersistenceGateway<S>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let stats = gateway.load();
        log::info!(
            "Mounted {} (high score {}, {} games)",
            gateway.config().storage_key,
            stats.high_score,
            stats.total_games
        );

        Ok(Self {
            game,
            lifecycle: Lifecycle::new(),
            scheduler: FrameScheduler::new(source, config.min_interval_ms)?,
            gateway,
            stats,
            catalog: DEFAULT_ACHIEVEMENTS,
            config,
            sink: Rc::new(LogSink),
            score: 0,
            last_round: None,
            unsaved: false,
        })
    }

    /// Route events (including persistence failures) to `sink`
    pub fn with_sink(mut self, sink: Rc<dyn EventSink>) -> Self {
        self.gateway.set_sink(sink.clone());
        self.sink = sink;
        self
    }

    /// Evaluate against a title-specific catalog instead of the default one
    pub fn with_catalog(mut self, catalog: &'static [AchievementDefinition]) -> Self {
        self.catalog = catalog;
        self
    }

    // === Lifecycle ===

    /// Idle -> Running: reset the game and begin delivering frames
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.apply(Transition::Start)?;
        self.game.reset();
        self.score = 0;
        self.last_round = None;
        self.scheduler.start();
        self.report_timing();
        Ok(())
    }

    /// Running -> Paused
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.check(Transition::Pause)?;
        self.scheduler.stop();
        self.apply(Transition::Pause)?;
        Ok(())
    }

    /// Paused -> Running. The first frame after resuming re-syncs the clock.
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        self.apply(Transition::Resume)?;
        self.scheduler.start();
        self.report_timing();
        Ok(())
    }

    /// Running -> Finished: record the round, evaluate achievements, save
    ///
    /// For hosts ending a round from outside the frame loop (quit button,
    /// time limit). Rounds the game ends itself are saved later.
    pub fn finish(&mut self) -> Result<RoundSummary, TransitionError> {
        let summary = self.end_round()?;
        self.flush_pending();
        Ok(summary)
    }

    /// Write stats changed since the last successful save
    ///
    /// Hosts call this outside the frame callback once a round has ended.
    /// Returns whether a save was attempted. A failed save leaves the stats
    /// marked unsaved for the next flush.
    pub fn flush_pending(&mut self) -> bool {
        if !self.unsaved {
            return false;
        }
        self.flush();
        true
    }

    /// Quiesce before the host lets go: pause a running round and save
    /// anything pending. Other states are left as they are.
    pub fn suspend(&mut self) {
        if self.lifecycle.is_running() {
            let _ = self.pause();
        }
        self.flush_pending();
    }

    /// Whether stats changed since the last successful save
    pub fn has_unsaved_stats(&self) -> bool {
        self.unsaved
    }

    fn end_round(&mut self) -> Result<RoundSummary, TransitionError> {
        self.check(Transition::Finish)?;
        self.scheduler.stop();
        self.apply(Transition::Finish)?;

        let before = self.stats.clone();
        let summary = self.stats.record_round(
            &self.config.player_name,
            self.score,
            self.config.leaderboard_capacity,
        );
        self.sink.notify(&EngineEvent::RoundFinished {
            summary: summary.clone(),
        });
        for def in progression::newly_unlocked(self.catalog, &before, &self.stats) {
            self.sink.notify(&EngineEvent::AchievementUnlocked {
                id: def.id,
                name: def.name,
            });
        }

        self.unsaved = true;
        self.last_round = Some(summary.clone());
        Ok(summary)
    }

    /// Finished -> Idle, flushing stats first
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        self.check(Transition::Restart)?;
        self.flush();
        self.apply(Transition::Restart)?;
        self.score = 0;
        Ok(())
    }

    /// Unmount: cancel the outstanding tick, save anything pending, then
    /// release the storage backend
    pub fn teardown(mut self) -> S {
        self.scheduler.stop();
        self.flush_pending();
        let Self { gateway, .. } = self;
        log::info!("Unmounted {}", gateway.config().storage_key);
        gateway.teardown()
    }

    // === Frames ===

    /// Deliver a host tick at `timestamp` (ms)
    ///
    /// Returns the elapsed time handed to the game, if the tick passed the gate.
    pub fn on_frame(&mut self, timestamp: f64) -> Option<f64> {
        if !self.lifecycle.is_running() {
            return None;
        }

        let game = &mut self.game;
        let mut outcome = FrameOutcome::default();
        let elapsed = self
            .scheduler
            .on_tick(timestamp, |elapsed| outcome = game.update(elapsed));
        self.report_timing();

        if outcome.score_delta > 0 {
            self.score = self.score.saturating_add(outcome.score_delta);
            self.sink.notify(&EngineEvent::ScoreChanged { score: self.score });
        }
        if outcome.finished {
            // Running is the only state on_frame acts in, so this cannot be rejected
            let _ = self.end_round();
        }
        elapsed
    }

    // === Queries ===

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Score of the current (or just finished) round
    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn last_round(&self) -> Option<&RoundSummary> {
        self.last_round.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn achievements(&self) -> Vec<AchievementState<'static>> {
        progression::evaluate(self.catalog, &self.stats)
    }

    pub fn unlocked_achievements(&self) -> Vec<&'static AchievementDefinition> {
        progression::unlocked(self.catalog, &self.stats)
    }

    pub fn unlock_percentage(&self) -> u32 {
        progression::unlock_percentage(self.catalog, &self.stats)
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn scheduler(&self) -> &FrameScheduler<T> {
        &self.scheduler
    }

    pub fn tick_source_mut(&mut self) -> &mut T {
        self.scheduler.source_mut()
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut PersistenceGateway<S> {
        &mut self.gateway
    }

    // === Internals ===

    fn check(&self, transition: Transition) -> Result<(), TransitionError> {
        self.lifecycle.check(transition).map(|_| ()).map_err(|e| {
            self.sink.notify(&EngineEvent::TransitionRejected(e));
            e
        })
    }

    fn apply(&mut self, transition: Transition) -> Result<LifecycleState, TransitionError> {
        self.check(transition)?;
        self.lifecycle.apply(transition)
    }

    /// Refresh the advisory achievement ids and write the blob
    fn flush(&mut self) {
        self.stats.achievements = self
            .unlocked_achievements()
            .iter()
            .map(|def| def.id.to_string())
            .collect();
        // Failures were already reported by the gateway; memory stays authoritative
        self.unsaved = self.gateway.save(&self.stats).is_err();
    }

    fn report_timing(&mut self) {
        if let Some(e) = self.scheduler.take_error() {
            self.sink.notify(&EngineEvent::TimingDegraded(e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::persistence::PersistenceConfig;
    use crate::platform::{ManualTickSource, MemoryStorage};
    use crate::titles::GameTitle;

    /// Scores `points` per frame and ends after `frames` frames
    #[derive(Debug, Default)]
    struct ScriptedGame {
        frames: u32,
        points: u64,
        played: u32,
        elapsed: Vec<f64>,
        resets: u32,
    }

    impl Game for ScriptedGame {
        fn reset(&mut self) {
            self.played = 0;
            self.elapsed.clear();
            self.resets += 1;
        }

        fn update(&mut self, elapsed_ms: f64) -> FrameOutcome {
            self.played += 1;
            self.elapsed.push(elapsed_ms);
            FrameOutcome {
                score_delta: self.points,
                finished: self.played >= self.frames,
            }
        }
    }

    type TestSession = GameSession<ScriptedGame, ManualTickSource, MemoryStorage>;

    fn session(frames: u32, points: u64) -> (TestSession, Rc<RecordingSink>) {
        let gateway = PersistenceGateway::init(
            PersistenceConfig::for_title(GameTitle::StarShooter),
            MemoryStorage::new(),
        )
        .unwrap();
        let game = ScriptedGame {
            frames,
            points,
            ..Default::default()
        };
        let config = EngineConfig {
            min_interval_ms: 100.0,
            ..Default::default()
        };
        let sink = Rc::new(RecordingSink::new());
        let session = GameSession::new(game, ManualTickSource::new(), gateway, config)
            .unwrap()
            .with_sink(sink.clone());
        (session, sink)
    }

    /// Feed 16ms ticks from `from` to `to` inclusive
    fn drive(s: &mut TestSession, from: f64, to: f64) {
        let mut t = from;
        while t <= to {
            s.on_frame(t);
            t += 16.0;
        }
    }

    #[test]
    fn test_scheduler_follows_lifecycle() {
        let (mut s, _) = session(1000, 1);
        assert!(!s.scheduler().is_active());
        s.start().unwrap();
        assert!(s.scheduler().is_active());
        s.pause().unwrap();
        assert!(!s.scheduler().is_active());
        assert!(!s.scheduler().source().has_outstanding());
        s.resume().unwrap();
        assert!(s.scheduler().is_active());
        s.finish().unwrap();
        assert!(!s.scheduler().is_active());
        s.restart().unwrap();
        assert!(!s.scheduler().is_active());
        assert_eq!(s.state(), LifecycleState::Idle);
    }

    #[test]
    fn test_frames_are_gated() {
        let (mut s, _) = session(1000, 1);
        s.start().unwrap();
        drive(&mut s, 0.0, 1000.0);
        assert_eq!(s.game().played, 8);
        assert_eq!(s.score(), 8);
    }

    #[test]
    fn test_no_frames_while_paused_and_no_catch_up() {
        let (mut s, _) = session(1000, 1);
        s.start().unwrap();
        drive(&mut s, 0.0, 240.0);
        assert_eq!(s.game().played, 2);

        s.pause().unwrap();
        drive(&mut s, 256.0, 5000.0);
        assert_eq!(s.game().played, 2);

        s.resume().unwrap();
        drive(&mut s, 9000.0, 9240.0);
        assert_eq!(s.game().played, 4);
        assert!(s.game().elapsed.iter().all(|dt| *dt < 200.0));
    }

    #[test]
    fn test_round_end_records_and_saves() {
        let (mut s, sink) = session(3, 100);
        s.start().unwrap();
        drive(&mut s, 0.0, 1000.0);

        assert_eq!(s.state(), LifecycleState::Finished);
        // Ended on the third accepted frame; later ticks were ignored
        assert_eq!(s.game().played, 3);
        assert_eq!(s.score(), 300);
        assert!(!s.scheduler().source().has_outstanding());

        assert_eq!(s.stats().high_score, 300);
        assert_eq!(s.stats().total_games, 1);
        assert_eq!(s.stats().leaderboard.top_score(), Some(300));
        assert_eq!(s.stats().achievements, vec!["score_50", "score_100", "score_250"]);
        assert_eq!(s.last_round().and_then(|r| r.rank), Some(1));

        // Nothing written from the finishing frame
        assert!(s.has_unsaved_stats());
        assert_eq!(s.gateway().storage().raw("starShooter"), None);

        assert!(s.flush_pending());
        assert!(!s.has_unsaved_stats());
        let saved = s.gateway().load();
        assert_eq!(&saved, s.stats());
        assert!(!s.flush_pending());

        let events = sink.events();
        let unlocked: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::AchievementUnlocked { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(unlocked, vec!["score_50", "score_100", "score_250"]);
        assert!(events.contains(&EngineEvent::ScoreChanged { score: 200 }));
    }

    #[test]
    fn test_rejected_transition_reported_and_ignored() {
        let (mut s, sink) = session(10, 1);
        let err = s.pause().unwrap_err();
        assert_eq!(err.from, LifecycleState::Idle);
        assert_eq!(s.state(), LifecycleState::Idle);
        assert!(matches!(sink.events().as_slice(), [EngineEvent::TransitionRejected(_)]));

        s.start().unwrap();
        assert!(s.start().is_err());
        assert!(s.restart().is_err());
        assert_eq!(s.state(), LifecycleState::Running);
        assert!(s.scheduler().is_active());
    }

    #[test]
    fn test_save_failure_does_not_stop_play() {
        let (mut s, sink) = session(2, 60);
        s.gateway_mut().storage_mut().set_fail_writes(true);
        s.start().unwrap();
        drive(&mut s, 0.0, 500.0);

        assert_eq!(s.state(), LifecycleState::Finished);
        assert_eq!(s.stats().high_score, 120);

        assert!(s.flush_pending());
        assert!(
            sink.events()
                .iter()
                .any(|e| matches!(e, EngineEvent::PersistenceFailed(_)))
        );
        assert!(s.has_unsaved_stats());
        assert_eq!(s.gateway().load(), PlayerStats::default());

        // Storage recovers; restart flushes the same stats
        s.gateway_mut().storage_mut().set_fail_writes(false);
        s.restart().unwrap();
        assert!(!s.has_unsaved_stats());
        assert_eq!(s.gateway().load().high_score, 120);
    }

    #[test]
    fn test_host_finish_saves_immediately() {
        let (mut s, _) = session(1000, 5);
        s.start().unwrap();
        drive(&mut s, 0.0, 300.0);
        let summary = s.finish().unwrap();
        assert_eq!(summary.score, 10);
        assert!(!s.has_unsaved_stats());
        assert_eq!(s.gateway().load().total_games, 1);
    }

    #[test]
    fn test_teardown_saves_pending_round() {
        let (mut s, _) = session(1, 70);
        s.start().unwrap();
        drive(&mut s, 0.0, 200.0);
        assert_eq!(s.state(), LifecycleState::Finished);
        assert!(s.has_unsaved_stats());

        let storage = s.teardown();
        let json = storage.raw("starShooter").unwrap();
        let stats: PlayerStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.high_score, 70);
    }

    #[test]
    fn test_suspend_cancels_frames_and_saves() {
        let (mut s, _) = session(1000, 1);
        s.start().unwrap();
        drive(&mut s, 0.0, 120.0);
        s.suspend();
        assert_eq!(s.state(), LifecycleState::Paused);
        assert!(!s.scheduler().source().has_outstanding());
        assert_eq!(s.gateway().storage().raw("starShooter"), None);

        let (mut s, _) = session(1, 30);
        s.start().unwrap();
        drive(&mut s, 0.0, 200.0);
        s.suspend();
        assert_eq!(s.state(), LifecycleState::Finished);
        assert!(!s.has_unsaved_stats());
        assert_eq!(s.gateway().load().high_score, 30);
    }

    #[test]
    fn test_stored_board_is_ranked_after_tidy() {
        let mut storage = MemoryStorage::new();
        let blob = r#"{"leaderboard": [{"player": "a", "score": 10}, {"player": "b", "score": 500}]}"#;
        storage.set_item("starShooter", blob).unwrap();
        let gateway = PersistenceGateway::init(PersistenceConfig::for_title(GameTitle::StarShooter), storage)
            .unwrap();
        let config = EngineConfig {
            min_interval_ms: 100.0,
            ..Default::default()
        };
        let game = ScriptedGame {
            frames: 1,
            points: 100,
            ..Default::default()
        };
        let mut s: TestSession = GameSession::new(game, ManualTickSource::new(), gateway, config).unwrap();
        s.start().unwrap();
        drive(&mut s, 0.0, 200.0);

        assert_eq!(s.last_round().and_then(|r| r.rank), Some(2));
        let scores: Vec<u64> = s.stats().leaderboard.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![500, 100, 10]);
    }

    #[test]
    fn test_oversized_stored_board_respects_capacity() {
        let entries: Vec<String> = (1..=12)
            .rev()
            .map(|n| format!(r#"{{"player": "p{n}", "score": {}}}"#, n * 10))
            .collect();
        let mut storage = MemoryStorage::new();
        storage
            .set_item("starShooter", &format!(r#"{{"leaderboard": [{}]}}"#, entries.join(",")))
            .unwrap();
        let gateway = PersistenceGateway::init(PersistenceConfig::for_title(GameTitle::StarShooter), storage)
            .unwrap();
        let config = EngineConfig {
            min_interval_ms: 100.0,
            ..Default::default()
        };
        let game = ScriptedGame {
            frames: 1,
            points: 15,
            ..Default::default()
        };
        let mut s: TestSession = GameSession::new(game, ManualTickSource::new(), gateway, config).unwrap();
        s.start().unwrap();
        drive(&mut s, 0.0, 200.0);

        assert_eq!(s.last_round().and_then(|r| r.rank), None);
        assert_eq!(s.stats().leaderboard.len(), 10);
    }

    #[test]
    fn test_stats_survive_remount() {
        let (mut s, _) = session(1, 40);
        for _ in 0..5 {
            s.start().unwrap();
            drive(&mut s, 0.0, 200.0);
            s.restart().unwrap();
        }
        assert_eq!(s.stats().total_games, 5);
        let storage = s.teardown();

        let gateway = PersistenceGateway::init(PersistenceConfig::for_title(GameTitle::StarShooter), storage)
            .unwrap();
        let again: TestSession = GameSession::new(
            ScriptedGame::default(),
            ManualTickSource::new(),
            gateway,
            EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(again.stats().total_games, 5);
        assert_eq!(again.stats().total_score, 200);
        // games_5 only
        assert_eq!(again.unlock_percentage(), 13);
    }

    #[test]
    fn test_degraded_timing_reported() {
        let (mut s, sink) = session(10, 1);
        s.tick_source_mut().set_refuse(true);
        s.start().unwrap();
        assert_eq!(s.state(), LifecycleState::Running);
        assert!(
            sink.events()
                .iter()
                .any(|e| matches!(e, EngineEvent::TimingDegraded(_)))
        );
        assert_eq!(s.on_frame(500.0), None);
        assert_eq!(s.game().played, 0);
    }

    #[test]
    fn test_start_resets_game() {
        let (mut s, _) = session(1, 10);
        s.start().unwrap();
        drive(&mut s, 0.0, 200.0);
        s.restart().unwrap();
        s.start().unwrap();
        assert_eq!(s.game().resets, 2);
        assert_eq!(s.score(), 0);
        assert!(s.last_round().is_none());
    }
}
