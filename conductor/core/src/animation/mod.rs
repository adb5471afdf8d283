//! Animation System - Frame Clock and Visual Parameters
//!
//! The clock is a bare frame counter. It knows nothing about what the terminal
//! is doing; [`AnimationParams::derive`] combines a frame number with the
//! current [`InteractionState`](crate::state::InteractionState) to produce
//! everything the renderer animates.
//!
//! # Architecture
//!
//! ```text
//! AnimationClock ──frame──┐
//!                         ├──► AnimationParams::derive ──► ViewModel ──► Renderer
//! InteractionState ───────┘
//! ```

mod boot;
mod params;
mod reveal;

pub use boot::{BootFrame, BootSequence, BOOT_LINES, SCAN_LINES};
pub use params::{AnimationParams, EyeShape, MouthShape, WAVEFORM_LEVELS, WAVEFORM_WIDTH};
pub use reveal::{Reveal, RevealTiming};

use std::time::Duration;

/// Default tick rate (frames per second)
pub const DEFAULT_TICK_RATE: u32 = 20;

/// Highest accepted tick rate
pub const MAX_TICK_RATE: u32 = 120;

/// Fixed-rate frame counter
#[derive(Clone, Debug)]
pub struct AnimationClock {
    rate: u32,
    frame: u64,
}

impl AnimationClock {
    /// Create a clock ticking `rate` times per second (clamped to 1..=120)
    #[must_use]
    pub fn new(rate: u32) -> Self {
        Self {
            rate: rate.clamp(1, MAX_TICK_RATE),
            frame: 0,
        }
    }

    /// Advance one frame and return the new frame number
    pub fn tick(&mut self) -> u64 {
        self.frame = self.frame.wrapping_add(1);
        self.frame
    }

    /// Current frame number
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Ticks per second
    #[must_use]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Wall-clock length of one tick
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.rate
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}
