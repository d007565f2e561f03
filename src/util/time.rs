//! Time utilities for the frame loop

use tokio::time::Instant;

/// Substep configuration
pub const STEPS_PER_FRAME: u32 = 5;
/// Longest frame delta fed into the substep divider (seconds)
pub const MAX_FRAME_DELTA: f32 = 0.05;

/// Split a frame delta into the fixed substep duration.
///
/// A stalled frame is clamped first so a single substep never exceeds
/// `MAX_FRAME_DELTA / STEPS_PER_FRAME`.
pub fn substep_delta(frame_delta: f32) -> f32 {
    frame_delta.clamp(0.0, MAX_FRAME_DELTA) / STEPS_PER_FRAME as f32
}

/// Frame clock returning the elapsed time between successive calls
///
/// Reads the tokio clock so paused-time tests see deterministic deltas.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous call (or since construction)
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        delta
    }

    pub fn reset(&mut self) {
        self.last = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
