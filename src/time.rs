//! Frame clock.
//!
//! The simulation measures time in milliseconds as `f64`, which keeps the
//! per-mode phase formulas exact over long sessions. A fixed step makes
//! headless runs deterministic.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! loop {
//!     let now = clock.tick();
//!     simulation.frame(now, &mut canvas);
//! }
//! ```

use std::time::{Duration, Instant};

/// Elapsed/delta/frame/FPS tracking.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_ms: f64,
    delta_ms: f64,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    /// Fixed step in milliseconds; replaces wall-clock deltas when set.
    fixed_delta_ms: Option<f64>,
}

impl FrameClock {
    /// Clock starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_ms: 0.0,
            delta_ms: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fixed_delta_ms: None,
        }
    }

    /// Clock advancing by exactly `step_ms` per tick, ignoring wall time.
    pub fn fixed(step_ms: f64) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(step_ms));
        clock
    }

    /// Advance one frame and return the elapsed time in milliseconds.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();

        match self.fixed_delta_ms {
            Some(step) => {
                self.delta_ms = step;
                self.elapsed_ms += step;
            }
            None => {
                self.delta_ms = now.duration_since(self.last_frame).as_secs_f64() * 1000.0;
                self.elapsed_ms = now.duration_since(self.start).as_secs_f64() * 1000.0;
            }
        }
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.elapsed_ms
    }

    /// Milliseconds since the clock started.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Milliseconds covered by the last tick.
    #[inline]
    pub fn delta_ms(&self) -> f64 {
        self.delta_ms
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Wall-clock frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Set or clear the fixed step. Negative and non-finite steps count as zero.
    pub fn set_fixed_delta(&mut self, step_ms: Option<f64>) {
        self.fixed_delta_ms = step_ms.map(|s| if s.is_finite() { s.max(0.0) } else { 0.0 });
    }

    pub fn reset(&mut self) {
        let fixed = self.fixed_delta_ms;
        *self = Self::new();
        self.fixed_delta_ms = fixed;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_clock() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed_ms(), 0.0);
    }

    #[test]
    fn test_wall_clock_tick() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let now = clock.tick();
        assert!(now >= 10.0);
        assert!(clock.delta_ms() > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_fixed_step_ignores_wall_time() {
        let mut clock = FrameClock::fixed(16.0);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(clock.tick(), 16.0);
        assert_eq!(clock.tick(), 32.0);
        assert_eq!(clock.delta_ms(), 16.0);
    }

    #[test]
    fn test_reset_keeps_fixed_step() {
        let mut clock = FrameClock::fixed(10.0);
        clock.tick();
        clock.reset();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.tick(), 10.0);
    }

    #[test]
    fn test_negative_step_clamped() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(-5.0));
        assert_eq!(clock.tick(), 0.0);
    }
}
