//! Speech Playback
//!
//! Speaking a reply blocks for as long as the speaker talks, so, like model
//! calls, playback only ever runs on the task runner's blocking pool.
//!
//! - [`CommandSpeaker`]: runs an external cast/TTS player per reply
//! - [`SimulatedSpeaker`]: offline stand-in that just takes its time

mod command;
mod simulated;

pub use command::{tts_url, CommandSpeaker, DEFAULT_SPEAKER_COMMAND, DEFAULT_SPEAKER_DEVICE, DEFAULT_TTS_LANGUAGE};
pub use simulated::SimulatedSpeaker;

use thiserror::Error;

/// Why a reply could not be spoken
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The named speaker could not be located
    #[error("speaker '{0}' not found")]
    DeviceNotFound(String),
    /// The player failed for another reason
    #[error("playback failed: {0}")]
    Failed(String),
}

impl PlaybackError {
    /// Text shown to the operator while in `Failed`
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::DeviceNotFound(_) => "Audio error: Device not found. Check power?".into(),
            Self::Failed(detail) => format!("Audio error: {detail}"),
        }
    }
}

/// Something that can say a reply out loud
pub trait PlaybackDevice: Send + Sync {
    /// Device name for logs and the footer
    fn name(&self) -> &str;

    /// Speak `text`. Blocks until playback has finished.
    fn speak(&self, text: &str) -> Result<(), PlaybackError>;

    /// End the current `speak` early, or skip the one about to start.
    /// The stop holds until [`arm`](Self::arm). Must not block.
    fn stop(&self) {}

    /// Clear an earlier `stop`. The session calls this on its own thread
    /// right before it hands the next reply to `speak`.
    fn arm(&self) {}
}
