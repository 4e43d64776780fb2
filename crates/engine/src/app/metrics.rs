use std::mem;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub total_ticks: u64,
    pub clamp_events: u32,
}

/// Latest published loop metrics. Clones share one slot; a poisoned lock still yields the
/// last value written.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Window {
    frames: u32,
    ticks: u32,
    frame_time: Duration,
}

impl Window {
    fn rates(&self, elapsed: Duration) -> (f32, f32, f32) {
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time.as_secs_f32() * 1000.0 / frames as f32,
        };
        (self.frames as f32 / seconds, self.ticks as f32 / seconds, frame_time_ms)
    }
}

/// Rolling window of frame/tick counts plus run totals.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    interval: Duration,
    window: Window,
    total_ticks: u64,
    clamp_events: u32,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            window_start: now,
            interval,
            window: Window::default(),
            total_ticks: 0,
            clamp_events: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.window.frames = self.window.frames.saturating_add(1);
        self.window.frame_time = self.window.frame_time.saturating_add(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.window.ticks = self.window.ticks.saturating_add(1);
        self.total_ticks = self.total_ticks.saturating_add(1);
    }

    pub(crate) fn record_clamp(&mut self) {
        self.clamp_events = self.clamp_events.saturating_add(1);
    }

    pub(crate) fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Closes the window once `interval` has passed and starts a fresh one at `now`.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let window = mem::take(&mut self.window);
        self.window_start = now;
        Some(self.build(&window, elapsed))
    }

    /// Rates over the still-open window, for the shutdown summary.
    pub(crate) fn flush(&self, now: Instant) -> LoopMetricsSnapshot {
        self.build(&self.window, now.saturating_duration_since(self.window_start))
    }

    fn build(&self, window: &Window, elapsed: Duration) -> LoopMetricsSnapshot {
        let (fps, tps, frame_time_ms) = window.rates(elapsed);
        LoopMetricsSnapshot {
            fps,
            tps,
            frame_time_ms,
            total_ticks: self.total_ticks,
            clamp_events: self.clamp_events,
        }
    }
}
