//! Arrow-key recall of earlier prompts.

use std::collections::VecDeque;

/// Prompts remembered for recall
pub const RECALL_CAPACITY: usize = 100;

/// Previously submitted prompts, newest last
#[derive(Clone, Debug, Default)]
pub struct PromptRecall {
    entries: VecDeque<String>,
    /// Steps back from the newest entry while browsing
    position: Option<usize>,
}

impl PromptRecall {
    /// Empty recall list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a submitted prompt and stop browsing.
    ///
    /// Repeating the newest entry is not stored twice.
    pub fn record(&mut self, prompt: &str) {
        self.position = None;
        if self.entries.back().is_some_and(|last| last == prompt) {
            return;
        }
        if self.entries.len() == RECALL_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(prompt.to_string());
    }

    /// Step to an older prompt; stays on the oldest once reached
    pub fn older(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let next = match self.position {
            None => 0,
            Some(p) => (p + 1).min(self.entries.len() - 1),
        };
        self.position = Some(next);
        self.entry(next)
    }

    /// Step to a newer prompt. `None` means browsing ended past the newest.
    pub fn newer(&mut self) -> Option<&str> {
        match self.position {
            Some(p) if p > 0 => {
                self.position = Some(p - 1);
                self.entry(p - 1)
            }
            _ => {
                self.position = None;
                None
            }
        }
    }

    /// Stop browsing without changing the entries
    pub fn reset(&mut self) {
        self.position = None;
    }

    /// Whether an entry is currently recalled
    #[must_use]
    pub fn is_browsing(&self) -> bool {
        self.position.is_some()
    }

    /// Number of remembered prompts
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, back: usize) -> Option<&str> {
        let index = self.entries.len().checked_sub(back + 1)?;
        self.entries.get(index).map(String::as_str)
    }
}
