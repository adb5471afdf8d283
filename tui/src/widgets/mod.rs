//! Widgets
//!
//! Stateless pieces of the screen. Each one is built from borrowed frame
//! data and drawn straight into a layer buffer.

pub mod conversation;
pub mod input_line;
pub mod waveform;

pub use conversation::ConversationLog;
pub use input_line::InputLine;
pub use waveform::Waveform;
