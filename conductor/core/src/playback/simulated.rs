//! Offline speaker that only takes its time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{PlaybackDevice, PlaybackError};

/// Speaking time per character
const PER_CHAR: Duration = Duration::from_millis(50);
/// Longest simulated utterance
const MAX_DURATION: Duration = Duration::from_secs(15);
/// Granularity at which `stop` is noticed
const SLICE: Duration = Duration::from_millis(20);

/// Pretends to speak for about 50 ms per character
#[derive(Debug)]
pub struct SimulatedSpeaker {
    name: String,
    per_char: Duration,
    stop_requested: AtomicBool,
}

impl SimulatedSpeaker {
    /// Simulated speaker called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_pace(name, PER_CHAR)
    }

    /// Simulated speaker with a custom per-character pace
    pub fn with_pace(name: impl Into<String>, per_char: Duration) -> Self {
        Self {
            name: name.into(),
            per_char,
            stop_requested: AtomicBool::new(false),
        }
    }

    /// How long speaking `text` takes
    #[must_use]
    pub fn duration_for(&self, text: &str) -> Duration {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        self.per_char.saturating_mul(chars).min(MAX_DURATION)
    }
}

impl PlaybackDevice for SimulatedSpeaker {
    fn name(&self) -> &str {
        &self.name
    }

    fn speak(&self, text: &str) -> Result<(), PlaybackError> {
        let deadline = Instant::now() + self.duration_for(text);
        while Instant::now() < deadline {
            if self.stop_requested.load(Ordering::SeqCst) {
                tracing::debug!(speaker = %self.name, "simulated playback stopped");
                return Ok(());
            }
            std::thread::sleep(SLICE.min(deadline.saturating_duration_since(Instant::now())));
        }
        Ok(())
    }

    fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    fn arm(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }
}
