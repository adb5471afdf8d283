//! Conversation History
//!
//! The transcript shown in the log panel. Entries are only appended at
//! transition boundaries (prompt submitted, reply received, failure surfaced)
//! and the oldest fall off once the configured cap is reached.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Default number of entries kept
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Who an entry belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// The operator's prompt
    User,
    /// The model's reply
    Assistant,
    /// A surfaced failure
    SystemError,
}

impl Role {
    /// Prefix shown before the entry text
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "YOU",
            Self::Assistant => "AI",
            Self::SystemError => "SYS",
        }
    }
}

/// One line of the transcript
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Author
    pub role: Role,
    /// Text as submitted or received
    pub text: String,
    /// Local time the entry was appended
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Local::now(),
        }
    }
}

/// Bounded FIFO transcript
#[derive(Clone, Debug)]
pub struct ConversationHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl ConversationHistory {
    /// Empty history keeping at most `capacity` entries (minimum 1)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry::new(role, text));
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Newest entry
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
