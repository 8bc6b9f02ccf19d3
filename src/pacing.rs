//! Frame pacing for the poll/render loop.
//!
//! The loop is rate-limited to a target frequency: after a tick's polling
//! and rendering, the pacer reports how much of the frame budget is left,
//! and the GUI schedules the next repaint that far in the future. A tick
//! that overruns its budget yields zero, never a negative wait.

use std::time::{Duration, Instant};

/// Slider bounds for the target frame rate.
pub const MIN_TARGET_HZ: u32 = 10;
pub const MAX_TARGET_HZ: u32 = 60;

/// Default target frame rate of the panel.
pub const DEFAULT_TARGET_HZ: u32 = 60;

#[derive(Debug)]
pub struct FramePacer {
    target_hz: u32,
    tick_started: Instant,
}

impl FramePacer {
    /// `target_hz` is clamped to the supported range.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_hz: target_hz.clamp(MIN_TARGET_HZ, MAX_TARGET_HZ),
            tick_started: Instant::now(),
        }
    }

    pub fn target_hz(&self) -> u32 {
        self.target_hz
    }

    /// Adjust the target rate at runtime (clamped).
    pub fn set_target_hz(&mut self, target_hz: u32) {
        self.target_hz = target_hz.clamp(MIN_TARGET_HZ, MAX_TARGET_HZ);
    }

    /// Time allotted to one tick at the current target rate.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_hz))
    }

    /// Mark the start of a tick.
    pub fn begin_tick(&mut self) {
        self.tick_started = Instant::now();
    }

    /// Budget left in the current tick; zero when already over budget.
    pub fn remaining_budget(&self) -> Duration {
        self.frame_budget()
            .saturating_sub(self.tick_started.elapsed())
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_HZ)
    }
}
