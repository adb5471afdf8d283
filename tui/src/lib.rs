//! neurallink TUI - terminal front-end for the neurallink session core
//!
//! Everything stateful lives in `neurallink-conductor`; this crate only
//! supplies the terminal side of it.
//!
//! # Architecture
//!
//! - **Terminal**: raw mode guard and a non-blocking stdin byte source
//! - **Renderer**: draws each view model through a layered compositor
//! - **Compositor**: z-ordered layers flattened into one buffer per frame
//! - **Avatar / Widgets**: stateless drawing of the face, waveform, log and input
//! - **App**: interval loop, signal handling, collaborator wiring

pub mod app;
pub mod avatar;
pub mod compositor;
pub mod logging;
pub mod renderer;
pub mod terminal;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use renderer::TerminalRenderer;
