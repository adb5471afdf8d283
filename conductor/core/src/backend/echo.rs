//! Offline backend that answers without a model.

use std::time::Duration;

use super::traits::{BackendError, ModelBackend};

/// Simulated thinking time
const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

/// Replies `Neural response to: {prompt}` after a short pause
#[derive(Clone, Debug)]
pub struct EchoBackend {
    latency: Duration,
}

impl EchoBackend {
    /// Echo backend with the given pause before each reply
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for EchoBackend {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

impl ModelBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        std::thread::sleep(self.latency);
        Ok(format!("Neural response to: {prompt}"))
    }
}
