//! Neurallink Conductor - Headless Core of the Neural Link Terminal
//!
//! This crate holds everything the terminal front-end does except drawing:
//! keystroke decoding, the interaction state machine, background hand-off of
//! model and speaker calls, animation parameters and conversation history.
//! It can drive the ratatui surface or run headless under test.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Terminal Surface (tui)                      │
//! │   stdin bytes ──► ByteSource          Renderer ◄── ViewModel     │
//! └────────┬─────────────────────────────────────▲──────────────────┘
//!          │                                     │
//! ┌────────┼─────────────────────────────────────┼──────────────────┐
//! │        ▼            SessionCoordinator       │   (one tick)     │
//! │  ┌────────────┐  ┌──────────────┐  ┌────────────────┐           │
//! │  │InputReader │─►│ StateMachine │◄─│   TaskRunner   │           │
//! │  │ + escapes  │  │ Idle/Gen/... │  │ one pending op │           │
//! │  └────────────┘  └──────────────┘  └───────┬────────┘           │
//! │  ┌──────────────┐ ┌─────────────────────┐  │ spawn_blocking     │
//! │  │AnimationClock│ │ ConversationHistory │  ▼                    │
//! │  └──────────────┘ └─────────────────────┘  ModelBackend         │
//! │                                            PlaybackDevice       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Overview
//!
//! - [`state`]: interaction states and the gated transition table
//! - [`tasks`]: one-at-a-time blocking work with one-shot result slots
//! - [`input`]: non-blocking keystroke decoding and the edited line
//! - [`animation`]: frame clock, per-frame visual parameters, typewriter reveal,
//!   boot intro
//! - [`session`]: bounded conversation history
//! - [`backend`]: model backends (Ollama, echo)
//! - [`playback`]: speech output (player command, simulated)
//! - [`view`]: the per-tick view model and the renderer seam
//! - [`coordinator`]: the tick loop tying it all together
//! - [`config`]: layered configuration (env > TOML > defaults)
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod backend;
pub mod config;
pub mod coordinator;
pub mod input;
pub mod playback;
pub mod session;
pub mod state;
pub mod tasks;
pub mod view;

// Re-exports for convenience
pub use animation::{
    AnimationClock, AnimationParams, BootFrame, BootSequence, EyeShape, MouthShape, Reveal,
    RevealTiming,
};
pub use backend::{BackendError, EchoBackend, ModelBackend, OllamaBackend};
pub use config::{
    default_config_path, load_config, load_config_from_path, AppConfig, BackendKind, ConfigError,
    ConfigSource, SpeakerKind, UiSettings,
};
pub use coordinator::{SessionCoordinator, TickOutcome};
pub use input::{ByteSource, InputEvent, InputLineBuffer, InputReader, PromptRecall};
pub use playback::{CommandSpeaker, PlaybackDevice, PlaybackError, SimulatedSpeaker};
pub use session::{ConversationHistory, HistoryEntry, Role};
pub use state::{InteractionState, InvalidTransition, StateEvent, StateMachine};
pub use tasks::{OperationTag, TaskError, TaskHandle, TaskOutcome, TaskRunner};
pub use view::{Renderer, ViewModel};
