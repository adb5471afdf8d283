//! Model Backend Traits
//!
//! The coordinator only needs one thing from a language model: turn a prompt
//! into a reply. Calls block, so they are always made from the task runner's
//! blocking pool, never from the render loop.

use thiserror::Error;

/// Why a model request produced no usable reply
#[derive(Debug, Error)]
pub enum BackendError {
    /// The server could not be reached or did not answer in time
    #[error("cannot reach model backend: {0}")]
    Connection(String),
    /// The server answered with no text
    #[error("model returned an empty response")]
    EmptyResponse,
    /// The server answered with something that is not a chat reply
    #[error("model backend returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Text shown to the operator while in `Failed`
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection(_) => "Neural link error: Cannot connect to Ollama. Is it running?".into(),
            Self::EmptyResponse => "Neural link error: Model returned empty response".into(),
            Self::InvalidResponse(detail) => format!("Neural link error: {detail}"),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Connection(e.to_string())
        }
    }
}

/// Something that answers prompts
pub trait ModelBackend: Send + Sync {
    /// Backend name for logs and the footer
    fn name(&self) -> &str;

    /// Produce a reply for `prompt`. Blocks until the reply is complete.
    fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            BackendError::Connection("refused".into()).user_message(),
            "Neural link error: Cannot connect to Ollama. Is it running?"
        );
        assert_eq!(
            BackendError::EmptyResponse.user_message(),
            "Neural link error: Model returned empty response"
        );
        assert_eq!(
            BackendError::InvalidResponse("missing message".into()).user_message(),
            "Neural link error: missing message"
        );
    }
}
