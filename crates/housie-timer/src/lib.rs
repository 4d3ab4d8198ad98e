//! Cancellable draw timer for timed-mode rooms.
//!
//! A [`DrawTimer`] owns at most one pending deadline. Arming it again
//! replaces the deadline, so a room can never have two draw timers
//! racing each other.
//!
//! # Integration
//!
//! The timer sits inside a room actor's `tokio::select!` loop, next to
//! the command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* may pause or cancel the timer */ }
//!         _tick = timer.wait_for_draw() => { /* draw one number */ }
//!     }
//! }
//! ```
//!
//! Because the actor handles one branch at a time, a `cancel()` or
//! `pause()` issued while handling a command takes effect before the
//! next poll of `wait_for_draw`. A draw can't slip in after a stop.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Shortest interval a timer accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
/// Longest interval a timer accepts.
pub const MAX_INTERVAL: Duration = Duration::from_secs(120);

/// Clamps `interval` into [`MIN_INTERVAL`]`..=`[`MAX_INTERVAL`].
pub fn clamp_interval(interval: Duration) -> Duration {
    let clamped = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
    if clamped != interval {
        warn!(
            requested_ms = interval.as_millis() as u64,
            clamped_ms = clamped.as_millis() as u64,
            "draw interval out of range, clamping"
        );
    }
    clamped
}

/// Returned by [`DrawTimer::wait_for_draw`] each time the deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawTick {
    /// Fires since the timer was last armed, starting at 1.
    pub fire: u64,
    /// How late the actor got round to the deadline.
    pub late_by: Duration,
}

/// A per-room repeating timer that can be armed, paused, and cancelled.
#[derive(Debug, Default)]
pub struct DrawTimer {
    interval: Option<Duration>,
    next_draw: Option<Instant>,
    paused: bool,
    fires: u64,
}

impl DrawTimer {
    /// A disarmed timer. `wait_for_draw` pends forever until [`arm`](Self::arm).
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts firing every `interval` (clamped), first fire one interval
    /// from now. Replaces any previous deadline and clears a pause.
    pub fn arm(&mut self, interval: Duration) {
        let interval = clamp_interval(interval);
        self.interval = Some(interval);
        self.next_draw = Some(Instant::now() + interval);
        self.paused = false;
        self.fires = 0;
        debug!(interval_ms = interval.as_millis() as u64, "draw timer armed");
    }

    /// Drops the deadline entirely. Idempotent.
    pub fn cancel(&mut self) {
        if self.interval.take().is_some() {
            debug!(fires = self.fires, "draw timer cancelled");
        }
        self.next_draw = None;
        self.paused = false;
    }

    /// Suspends firing without forgetting the interval. Idempotent.
    pub fn pause(&mut self) {
        if self.interval.is_some() && !self.paused {
            self.paused = true;
            debug!(fires = self.fires, "draw timer paused");
        }
    }

    /// Resumes after a pause. The next fire is one full interval from
    /// now, not from the deadline that was pending when paused.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if let Some(interval) = self.interval {
            self.next_draw = Some(Instant::now() + interval);
        }
        debug!(fires = self.fires, "draw timer resumed");
    }

    /// Waits until the next draw is due.
    ///
    /// Pends forever while disarmed or paused; `tokio::select!` keeps
    /// servicing its other branches in the meantime.
    pub async fn wait_for_draw(&mut self) -> DrawTick {
        let (next, interval) = match (self.next_draw, self.interval) {
            (Some(next), Some(interval)) if !self.paused => (next, interval),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(next);
        if late_by > interval {
            warn!(
                late_ms = late_by.as_millis() as u64,
                "draw timer fired late, rescheduling from now"
            );
        }
        // Always from now: a slow actor must never produce a burst of draws.
        self.next_draw = Some(now + interval);
        self.fires += 1;
        trace!(fire = self.fires, "draw timer fired");

        DrawTick {
            fire: self.fires,
            late_by,
        }
    }

    /// Whether a deadline exists (paused or not).
    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The armed interval, if any.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Fires since the timer was last armed.
    pub fn fires(&self) -> u64 {
        self.fires
    }
}
