//! Frame clock

use std::time::Instant;

/// Longest frame the clock will report, to keep a stalled host from
/// integrating one huge step
const MAX_FRAME_TIME: f64 = 0.25;

/// Tracks frame time, either from the wall clock (`tick`) or from explicit
/// steps (`advance`) for deterministic hosts and tests
pub struct FrameClock {
    /// Total elapsed time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Frames counted so far
    pub frame_count: u64,
    last_instant: Instant,
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            frame_count: 0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance from the wall clock. Call once per frame.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            self.frame_count += 1;
            return 0.0;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(elapsed)
    }

    /// Advance by an explicit step (clamped to the max frame time).
    pub fn advance(&mut self, dt: f64) -> f64 {
        self.first_tick = false;
        self.delta_time = dt.clamp(0.0, MAX_FRAME_TIME);
        self.total_time += self.delta_time;
        self.frame_count += 1;
        self.delta_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_defaults() {
        let clock = FrameClock::new();
        assert_eq!(clock.total_time, 0.0);
        assert_eq!(clock.delta_time, 0.0);
        assert_eq!(clock.frame_count, 0);
    }

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frame_count, 1);
    }

    #[test]
    fn test_manual_advance_accumulates() {
        let mut clock = FrameClock::new();
        for _ in 0..4 {
            clock.advance(0.25);
        }
        assert!((clock.total_time - 1.0).abs() < 1e-12);
        assert_eq!(clock.frame_count, 4);
    }

    #[test]
    fn test_advance_clamps_long_frames() {
        let mut clock = FrameClock::new();
        assert!((clock.advance(3.0) - MAX_FRAME_TIME).abs() < 1e-12);
        assert_eq!(clock.advance(-1.0), 0.0);
    }
}
