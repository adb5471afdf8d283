//! View Model
//!
//! Everything a renderer needs for one frame, borrowed from the coordinator.
//! Renderers never mutate core state and never report anything back.

use std::time::Duration;

use crate::animation::{AnimationParams, BootFrame};
use crate::input::InputLineBuffer;
use crate::session::ConversationHistory;
use crate::state::InteractionState;

/// Snapshot composed once per tick
#[derive(Debug)]
pub struct ViewModel<'a> {
    /// Current interaction state
    pub state: InteractionState,
    /// Conversation so far, oldest first
    pub history: &'a ConversationHistory,
    /// Line being edited
    pub input: &'a InputLineBuffer,
    /// Visual parameters for this frame
    pub animation: AnimationParams,
    /// Failure reason, only while `Failed`
    pub error_message: Option<&'a str>,
    /// Characters of the newest assistant entry revealed so far.
    /// `None` means show it in full.
    pub reveal: Option<usize>,
    /// One-off notice such as "interrupted"
    pub notice: Option<&'a str>,
    /// Time spent in the current state
    pub time_in_state: Duration,
    /// Model name for the footer
    pub model: &'a str,
    /// Output device name for the footer
    pub device: &'a str,
    /// Boot intro to draw instead of the session, while it runs
    pub boot: Option<BootFrame>,
}

impl ViewModel<'_> {
    /// Status line text for the current state
    #[must_use]
    pub fn status_text(&self) -> String {
        match self.state {
            InteractionState::Generating => {
                let dots = "●".repeat(usize::from(self.animation.dots));
                format!(
                    "{} {}s {dots}",
                    self.state.label(),
                    self.time_in_state.as_secs()
                )
                .trim_end()
                .to_string()
            }
            InteractionState::Failed => {
                format!("✗ {}", self.error_message.unwrap_or("unknown error"))
            }
            InteractionState::Idle | InteractionState::Playing => self.state.label().to_string(),
        }
    }

    /// Key hint for the current state
    #[must_use]
    pub fn hint(&self) -> &'static str {
        self.state.hint()
    }

    /// Footer text naming the collaborators
    #[must_use]
    pub fn footer_text(&self) -> String {
        format!("model: {} · output: {}", self.model, self.device)
    }
}

/// Draws view models. Implemented by the terminal UI and by test recorders.
pub trait Renderer {
    /// Draw one frame
    fn render(&mut self, view: &ViewModel<'_>);
}
