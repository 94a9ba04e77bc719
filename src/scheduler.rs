//! Threshold-gated frame scheduler
//!
//! The host offers one tick per display refresh. Every tick is requested, but
//! the frame callback only runs once at least `min_interval_ms` has passed
//! since the last *accepted* tick:
//! - Variable timestep: the callback receives the real elapsed time
//! - The reference timestamp moves to the accepted tick's timestamp, so
//!   sub-threshold time carries over to the next check
//! - `stop()` cancels the outstanding tick; `start()` re-syncs the reference
//!   on its first tick, so paused time is never delivered as elapsed time

use crate::error::{ConfigError, TimingError};

/// Host primitive that delivers one tick per display refresh
///
/// Implemented by `requestAnimationFrame` in the browser and by
/// [`ManualTickSource`](crate::platform::ManualTickSource) for headless hosts.
pub trait TickSource {
    type Handle: Copy + PartialEq + std::fmt::Debug;

    /// Ask for a single tick at the next refresh
    fn request_tick(&mut self) -> Result<Self::Handle, TimingError>;

    /// Cancel a previously requested tick. Unknown handles are ignored.
    fn cancel_tick(&mut self, handle: Self::Handle);
}

/// Elapsed-time gate for one game loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopTiming {
    /// Timestamp (ms) of the last accepted tick
    pub previous: Option<f64>,
    pub min_interval_ms: f64,
}

impl LoopTiming {
    /// The gate must be a positive, finite number of milliseconds
    pub fn new(min_interval_ms: f64) -> Result<Self, ConfigError> {
        if !min_interval_ms.is_finite() || min_interval_ms <= 0.0 {
            return Err(ConfigError::MinInterval(min_interval_ms));
        }
        Ok(Self {
            previous: None,
            min_interval_ms,
        })
    }

    /// Forget the reference timestamp; the next tick becomes the new origin
    pub fn resync(&mut self) {
        self.previous = None;
    }

    /// Gate a tick. Returns the elapsed ms if the frame callback should run.
    pub fn accept(&mut self, timestamp: f64) -> Option<f64> {
        let Some(previous) = self.previous else {
            self.previous = Some(timestamp);
            return None;
        };

        let elapsed = timestamp - previous;
        if elapsed >= self.min_interval_ms {
            self.previous = Some(timestamp);
            Some(elapsed)
        } else {
            None
        }
    }
}

/// Per-instance frame scheduler
///
/// The owner hands the frame callback to [`on_tick`](Self::on_tick), which
/// keeps game state out of the scheduler and lets the callback borrow the
/// owner's fields directly.
#[derive(Debug)]
pub struct FrameScheduler<T: TickSource> {
    source: T,
    timing: LoopTiming,
    pending: Option<T::Handle>,
    active: bool,
    last_error: Option<TimingError>,
}

impl<T: TickSource> FrameScheduler<T> {
    pub fn new(source: T, min_interval_ms: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            source,
            timing: LoopTiming::new(min_interval_ms)?,
            pending: None,
            active: false,
            last_error: None,
        })
    }

    /// Begin requesting ticks. Calling `start` while active does nothing.
    ///
    /// The first tick after starting only sets the reference timestamp.
    /// A refused tick request leaves the scheduler active but idle (no-op
    /// loop); the error is kept for [`take_error`](Self::take_error).
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.timing.resync();
        self.active = true;
        self.request();
    }

    /// Cancel the outstanding tick. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.source.cancel_tick(handle);
        }
        self.active = false;
        self.timing.resync();
    }

    /// Deliver a tick from the host
    ///
    /// Ticks arriving while stopped (or with nothing requested) are stale and
    /// dropped. The next tick is requested only after `frame` returns, so
    /// callbacks never overlap.
    pub fn on_tick(&mut self, timestamp: f64, frame: impl FnOnce(f64)) -> Option<f64> {
        if !self.active || self.pending.take().is_none() {
            log::trace!("dropping stale tick at {timestamp:.1}");
            return None;
        }

        let elapsed = self.timing.accept(timestamp);
        if let Some(elapsed) = elapsed {
            frame(elapsed);
        }
        self.request();
        elapsed
    }

    fn request(&mut self) {
        match self.source.request_tick() {
            Ok(handle) => self.pending = Some(handle),
            Err(e) => {
                log::warn!("Frame loop degraded to no-op: {e}");
                self.pending = None;
                self.last_error = Some(e);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a tick is currently requested from the host
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn timing(&self) -> &LoopTiming {
        &self.timing
    }

    /// Take the last tick request failure, if any
    pub fn take_error(&mut self) -> Option<TimingError> {
        self.last_error.take()
    }

    pub fn source(&self) -> &T {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut T {
        &mut self.source
    }
}

impl<T: TickSource> Drop for FrameScheduler<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
