//! High-resolution timer for frame timing.

use std::time::{Duration, Instant};

/// High-resolution timer for measuring elapsed and per-frame time.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_tick: Instant,
}

impl Timer {
    /// Starts a timer at the current instant.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
        }
    }

    /// Total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in seconds since the timer was created.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Time elapsed since the last call to `tick()`.
    ///
    /// This is the delta-time source for the frame loop.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        delta
    }

    /// Delta time in seconds since the last tick.
    pub fn delta_secs(&mut self) -> f32 {
        self.tick().as_secs_f32()
    }

    /// Restarts both the epoch and the tick reference.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last_tick = now;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregates per-frame deltas into periodic timing reports.
///
/// Feed [`FrameStats::record`] one delta per frame; once the sampling
/// window fills it hands back the window's totals and starts the next
/// one. Logging the report instead of every delta keeps the frame loop
/// quiet.
#[derive(Debug)]
pub struct FrameStats {
    window: Duration,
    accumulated: Duration,
    frames: u32,
}

/// One sampling window's worth of frame timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    /// Frames recorded in the window.
    pub frames: u32,
    /// Average frame time over the window, in milliseconds.
    pub average_frame_ms: f32,
}

impl FrameStats {
    /// Creates a collector that reports once per `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            accumulated: Duration::ZERO,
            frames: 0,
        }
    }

    /// Records one frame's delta.
    ///
    /// Returns the finished report when the accumulated time reaches
    /// the window, resetting the counters for the next one.
    pub fn record(&mut self, delta: Duration) -> Option<FrameReport> {
        self.accumulated += delta;
        self.frames += 1;

        if self.accumulated < self.window {
            return None;
        }

        let report = FrameReport {
            frames: self.frames,
            average_frame_ms: self.accumulated.as_secs_f32() * 1000.0 / self.frames as f32,
        };
        self.accumulated = Duration::ZERO;
        self.frames = 0;
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let timer = Timer::new();
        let a = timer.elapsed();
        let b = timer.elapsed();
        assert!(b >= a);
    }

    #[test]
    fn test_tick_measures_gap_only() {
        let mut timer = Timer::new();
        timer.tick();
        let delta = timer.tick();
        assert!(delta <= timer.elapsed());
    }

    #[test]
    fn test_frame_stats_reports_when_window_fills() {
        let mut stats = FrameStats::new(Duration::from_millis(100));

        assert!(stats.record(Duration::from_millis(40)).is_none());
        assert!(stats.record(Duration::from_millis(40)).is_none());

        let report = stats.record(Duration::from_millis(40)).unwrap();
        assert_eq!(report.frames, 3);
        assert!((report.average_frame_ms - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_frame_stats_resets_between_windows() {
        let mut stats = FrameStats::new(Duration::from_millis(10));

        let report = stats.record(Duration::from_millis(20)).unwrap();
        assert_eq!(report.frames, 1);

        // The next window starts from zero
        assert!(stats.record(Duration::from_millis(1)).is_none());
    }
}
