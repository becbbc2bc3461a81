//! Frame timing.
//!
//! A [`DeltaSource`] produces the `delta_time` handed to each simulation
//! step. [`FrameClock`] measures wall-clock time between calls;
//! [`FixedStep`] returns the same delta every time, for replays and tests.

use std::time::{Duration, Instant};

/// Anything that can say how long the last frame took.
pub trait DeltaSource {
    /// Advances to the next frame and returns its delta, in seconds.
    fn tick(&mut self) -> f32;

    /// Frames produced so far.
    fn frame_count(&self) -> u64;

    /// Sum of all deltas produced so far, in seconds.
    fn total_time(&self) -> f32;
}

/// Wall-clock frame timer.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_frame: Instant,
    /// Upper bound on a single delta, so a stall does not explode the
    /// simulation.
    max_delta: f32,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Default cap on one delta.
    pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(250);

    /// Creates a clock starting now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_delta(Self::DEFAULT_MAX_DELTA)
    }

    /// Creates a clock whose deltas never exceed `max_delta`.
    #[must_use]
    pub fn with_max_delta(max_delta: Duration) -> Self {
        Self {
            last_frame: Instant::now(),
            max_delta: max_delta.as_secs_f32(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Delta produced by the last [`tick`](DeltaSource::tick).
    #[must_use]
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Average frames per second since creation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

impl DeltaSource for FrameClock {
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta_time = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(self.max_delta);
        self.last_frame = now;
        self.total_time += self.delta_time;
        self.frame_count += 1;
        self.delta_time
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn total_time(&self) -> f32 {
        self.total_time
    }
}

/// Deterministic timer: every frame lasts exactly `delta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStep {
    delta: f32,
    frame_count: u64,
}

impl FixedStep {
    /// Creates a timer producing `delta` seconds per frame.
    #[must_use]
    pub const fn new(delta: f32) -> Self {
        Self {
            delta,
            frame_count: 0,
        }
    }

    /// Creates a timer for a fixed rate in frames per second.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_rate(rate: u32) -> Self {
        assert!(rate > 0, "Rate must be greater than zero");
        Self::new(1.0 / rate as f32)
    }

    /// Seconds per frame.
    #[must_use]
    pub const fn delta(&self) -> f32 {
        self.delta
    }
}

impl DeltaSource for FixedStep {
    fn tick(&mut self) -> f32 {
        self.frame_count += 1;
        self.delta
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[allow(clippy::cast_precision_loss)]
    fn total_time(&self) -> f32 {
        self.frame_count as f32 * self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_is_deterministic() {
        let mut timer = FixedStep::new(0.5);
        assert_eq!(timer.tick(), 0.5);
        assert_eq!(timer.tick(), 0.5);
        assert_eq!(timer.frame_count(), 2);
        assert_eq!(timer.total_time(), 1.0);
    }

    #[test]
    fn test_fixed_step_from_rate() {
        assert_eq!(FixedStep::from_rate(4).delta(), 0.25);
    }

    #[test]
    fn test_frame_clock_caps_delta() {
        let mut clock = FrameClock::with_max_delta(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_frame_clock_measures_elapsed_time() {
        let mut clock = FrameClock::new();
        std::thread::sleep(Duration::from_millis(5));
        let delta = clock.tick();
        assert!(delta >= 0.005, "delta {delta} shorter than the sleep");
        assert!(delta <= FrameClock::DEFAULT_MAX_DELTA.as_secs_f32());
        assert_eq!(clock.delta_time(), delta);
    }
}
