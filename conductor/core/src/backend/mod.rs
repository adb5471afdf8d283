//! Model Backend Integration
//!
//! Blocking prompt → reply interface plus its implementations.
//!
//! # Available Backends
//!
//! - **Ollama**: local model server over `/api/chat` (default)
//! - **Echo**: offline stand-in, selected with `backend.kind = "echo"`
//!
//! # Usage
//!
//! ```ignore
//! use neurallink_conductor::backend::{ModelBackend, OllamaBackend};
//!
//! let backend = OllamaBackend::new(url, model, system_prompt, timeout, handle)?;
//! // From a blocking context only:
//! let reply = backend.generate("Hello!")?;
//! ```

mod echo;
mod ollama;
mod traits;

pub use echo::EchoBackend;
pub use ollama::{OllamaBackend, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_SYSTEM_PROMPT};
pub use traits::{BackendError, ModelBackend};
