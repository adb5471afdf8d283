//! Boot intro shown before the first prompt.
//!
//! The intro is counted in clock frames, not slept through: each tick asks
//! which part of it is due, and the session keeps reading keys meanwhile.
//!
//! ```text
//!   banner lines   one every 400 ms
//!   scan lines     one every 100 ms
//!   hold           500 ms, then the regular screen
//! ```

use std::time::Duration;

/// Banner lines, revealed one after another
pub const BOOT_LINES: [&str; 4] = [
    "◢ INITIALIZING NEURAL LINK ◣",
    "◢◤ SYNCING CONSCIOUSNESS ◥◣",
    "◢◤◢ LOADING PERSONALITY MATRIX ◣◥◣",
    "◢◤◢◤ THE CORE ONLINE ◥◣◥◣",
];

/// Scan lines drawn under the banner
pub const SCAN_LINES: usize = 3;

const LINE_HOLD: Duration = Duration::from_millis(400);
const SCAN_HOLD: Duration = Duration::from_millis(100);
const FINAL_HOLD: Duration = Duration::from_millis(500);

/// What the intro shows on one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootFrame {
    /// Banner lines visible, `1..=BOOT_LINES.len()`
    pub lines: usize,
    /// Scan lines visible, `0..=SCAN_LINES`
    pub scan_lines: usize,
}

/// Frame schedule of the intro at a given tick rate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootSequence {
    line_frames: u64,
    scan_frames: u64,
    hold_frames: u64,
}

fn frames_for(hold: Duration, rate: u32) -> u64 {
    let frames = (hold.as_millis() * u128::from(rate)).div_ceil(1000);
    u64::try_from(frames).unwrap_or(u64::MAX).max(1)
}

impl BootSequence {
    /// Schedule for a clock ticking `rate` times per second
    #[must_use]
    pub fn new(rate: u32) -> Self {
        let rate = rate.max(1);
        Self {
            line_frames: frames_for(LINE_HOLD, rate),
            scan_frames: frames_for(SCAN_HOLD, rate),
            hold_frames: frames_for(FINAL_HOLD, rate),
        }
    }

    /// Frames the whole intro lasts
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.banner_frames() + self.scan_frames * SCAN_LINES as u64 + self.hold_frames
    }

    fn banner_frames(&self) -> u64 {
        self.line_frames * BOOT_LINES.len() as u64
    }

    /// Intro contents on clock frame `frame` (the first tick is frame 1).
    /// `None` once the intro is over.
    #[must_use]
    pub fn at(&self, frame: u64) -> Option<BootFrame> {
        let elapsed = frame.saturating_sub(1);
        if elapsed >= self.total_frames() {
            return None;
        }
        if elapsed < self.banner_frames() {
            let lines = usize::try_from(elapsed / self.line_frames).unwrap_or(0) + 1;
            return Some(BootFrame { lines, scan_lines: 0 });
        }
        let scanned = (elapsed - self.banner_frames()) / self.scan_frames + 1;
        Some(BootFrame {
            lines: BOOT_LINES.len(),
            scan_lines: usize::try_from(scanned).unwrap_or(SCAN_LINES).min(SCAN_LINES),
        })
    }
}
