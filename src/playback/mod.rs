//! Playback controller: a cursor over an immutable [`ExecutionTrace`]
//!
//! Stepping backward only moves the cursor; nothing is ever re-executed, so a
//! prior state comes back exactly as it was recorded.
//!
//! Autoplay uses one repeating timer. The controller does not own a clock:
//! callers pass `now` in and drive the timer with [`PlaybackController::tick`]
//! (the TUI does so on every poll of its event loop). Every tick carries the
//! generation of the timer that produced it, so a tick from before a `pause`,
//! `reset` or speed change is ignored instead of stepping twice.

use crate::config::PlaybackConfig;
use crate::snapshot::{ExecutionTrace, Snapshot};
use std::time::{Duration, Instant};

/// Misuse of absolute cursor movement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("the trace has no snapshots")]
    EmptyTrace,

    #[error("snapshot {index} is out of range (trace has {len})")]
    OutOfRange { index: usize, len: usize },
}

/// What the renderer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentSnapshot<'a> {
    /// Empty trace: nothing has been recorded yet
    Initializing,
    At(&'a Snapshot),
}

impl<'a> CurrentSnapshot<'a> {
    pub fn snapshot(self) -> Option<&'a Snapshot> {
        match self {
            CurrentSnapshot::At(snapshot) => Some(snapshot),
            CurrentSnapshot::Initializing => None,
        }
    }
}

/// A due tick of the autoplay timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    generation: u64,
    interval: Duration,
    next_due: Instant,
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    trace: ExecutionTrace,
    config: PlaybackConfig,
    /// `None` only while the trace is empty
    cursor: Option<usize>,
    speed_ms: u64,
    timer: Option<Timer>,
    generation: u64,
}

impl PlaybackController {
    pub fn new(trace: ExecutionTrace, config: PlaybackConfig) -> Self {
        let cursor = if trace.is_empty() { None } else { Some(0) };
        PlaybackController {
            trace,
            speed_ms: config.clamp_speed(config.initial_speed_ms),
            config,
            cursor,
            timer: None,
            generation: 0,
        }
    }

    /// Swap in a freshly built trace. Playback stops and the cursor returns to the start.
    pub fn load(&mut self, trace: ExecutionTrace) {
        self.pause();
        self.cursor = if trace.is_empty() { None } else { Some(0) };
        self.trace = trace;
    }

    pub fn trace(&self) -> &ExecutionTrace {
        &self.trace
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn speed_ms(&self) -> u64 {
        self.speed_ms
    }

    pub fn is_at_start(&self) -> bool {
        self.cursor == Some(0)
    }

    pub fn is_at_end(&self) -> bool {
        match self.cursor {
            Some(c) => c + 1 == self.trace.len(),
            None => true,
        }
    }

    pub fn current_snapshot(&self) -> CurrentSnapshot<'_> {
        match self.cursor.and_then(|c| self.trace.get(c)) {
            Some(snapshot) => CurrentSnapshot::At(snapshot),
            None => CurrentSnapshot::Initializing,
        }
    }

    /// Move one snapshot forward. At the end this returns false and stops autoplay.
    pub fn step_forward(&mut self) -> bool {
        match self.cursor {
            Some(c) if c + 1 < self.trace.len() => {
                self.cursor = Some(c + 1);
                true
            }
            _ => {
                self.pause();
                false
            }
        }
    }

    /// Move one snapshot back. At the start this returns false.
    pub fn step_backward(&mut self) -> bool {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                true
            }
            _ => false,
        }
    }

    /// Start autoplay. The first step happens one interval after `now`.
    pub fn play(&mut self, now: Instant) {
        if self.is_playing() {
            return;
        }
        if self.trace.is_empty() || self.is_at_end() {
            tracing::debug!("nothing left to play");
            return;
        }
        self.arm(now);
        tracing::debug!(speed_ms = self.speed_ms, "autoplay started");
    }

    pub fn pause(&mut self) {
        if self.timer.take().is_some() {
            self.generation += 1;
            tracing::debug!(cursor = ?self.cursor, "autoplay paused");
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Set the autoplay interval, clamped to the configured bounds.
    /// While playing, the timer restarts at the new interval from `now`.
    pub fn set_speed(&mut self, speed_ms: u64, now: Instant) -> u64 {
        let clamped = self.config.clamp_speed(speed_ms);
        if clamped != speed_ms {
            tracing::debug!(requested = speed_ms, clamped, "speed clamped");
        }
        self.speed_ms = clamped;

        if self.is_playing() {
            self.generation += 1;
            self.arm(now);
        }
        clamped
    }

    /// Shift the interval by `delta_ms`; negative is faster
    pub fn adjust_speed(&mut self, delta_ms: i64, now: Instant) -> u64 {
        let target = self.speed_ms.saturating_add_signed(delta_ms);
        self.set_speed(target, now)
    }

    /// Shorter interval by one configured step
    pub fn faster(&mut self, now: Instant) -> u64 {
        let target = self.speed_ms.saturating_sub(self.config.speed_step_ms);
        self.set_speed(target, now)
    }

    /// Longer interval by one configured step
    pub fn slower(&mut self, now: Instant) -> u64 {
        let target = self.speed_ms.saturating_add(self.config.speed_step_ms);
        self.set_speed(target, now)
    }

    /// Stop autoplay and go back to the first snapshot. The trace is kept.
    pub fn reset(&mut self) {
        self.pause();
        if !self.trace.is_empty() {
            self.cursor = Some(0);
        }
    }

    pub fn seek(&mut self, index: usize) -> Result<(), PlaybackError> {
        let len = self.trace.len();
        if len == 0 {
            return Err(PlaybackError::EmptyTrace);
        }
        if index >= len {
            return Err(PlaybackError::OutOfRange { index, len });
        }
        self.cursor = Some(index);
        Ok(())
    }

    pub fn jump_to_end(&mut self) {
        self.pause();
        if let Some(last) = self.trace.len().checked_sub(1) {
            self.cursor = Some(last);
        }
    }

    /// The pending tick, if the timer is due at `now`
    pub fn poll_timer(&self, now: Instant) -> Option<TimerTick> {
        let timer = self.timer?;
        (now >= timer.next_due).then_some(TimerTick {
            generation: timer.generation,
        })
    }

    /// Deliver a tick. Stale ticks do nothing. Returns whether the cursor moved.
    pub fn fire(&mut self, tick: TimerTick, now: Instant) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        if timer.generation != tick.generation {
            tracing::trace!(
                stale = tick.generation,
                current = timer.generation,
                "ignoring stale tick"
            );
            return false;
        }
        timer.next_due = now + timer.interval;

        let moved = self.step_forward();
        if self.is_at_end() {
            self.pause();
        }
        moved
    }

    /// Poll and fire in one call
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.poll_timer(now) {
            Some(tick) => self.fire(tick, now),
            None => false,
        }
    }

    fn arm(&mut self, now: Instant) {
        let interval = Duration::from_millis(self.speed_ms);
        self.timer = Some(Timer {
            generation: self.generation,
            interval,
            next_due: now + interval,
        });
    }
}
