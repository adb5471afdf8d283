//! Keyboard Input
//!
//! Raw terminal bytes become [`InputEvent`]s here. Nothing in this module ever
//! waits for a key:
//!
//! - [`ByteSource`]: non-blocking supplier of raw bytes (stdin in the binary,
//!   scripted buffers in tests)
//! - [`EscapeParser`]: incremental decoder with a hold timeout for partial
//!   escape sequences
//! - [`InputReader`]: ties the two together and tracks the double Ctrl-C
//! - [`InputLineBuffer`]: the line being edited
//! - [`PromptRecall`]: previously submitted prompts for arrow-key recall

mod escape;
mod line_buffer;
mod reader;
mod recall;

pub use escape::{EscapeParser, DEFAULT_ESCAPE_TIMEOUT};
pub use line_buffer::{InputLineBuffer, DEFAULT_INPUT_CAPACITY};
pub use reader::{ByteSource, InputReader};
pub use recall::{PromptRecall, RECALL_CAPACITY};

/// One logical keystroke
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// Printable character
    Char(char),
    /// Return / line feed
    Enter,
    /// Delete the character before the cursor
    Backspace,
    /// Up arrow
    ArrowUp,
    /// Down arrow
    ArrowDown,
    /// Left arrow
    ArrowLeft,
    /// Right arrow
    ArrowRight,
    /// Ctrl-C
    CtrlC,
    /// Ctrl-D, also delivered when the input stream closes
    CtrlD,
    /// Bytes that did not decode to a known key
    Unknown(Vec<u8>),
}

impl InputEvent {
    /// Whether the event edits or moves within the line buffer
    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(
            self,
            Self::Char(_) | Self::Backspace | Self::ArrowLeft | Self::ArrowRight
        )
    }
}
