//! Typewriter reveal of the newest reply.
//!
//! The schedule is computed once when the reply arrives; each tick only asks
//! how many characters are due, so no extra thread is involved.

use std::time::{Duration, Instant};

/// Per-character pauses for the typewriter effect
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealTiming {
    /// Pause after an ordinary character
    pub char_delay: Duration,
    /// Pause after `.`, `!` or `?`
    pub period_delay: Duration,
    /// Pause after `,`
    pub comma_delay: Duration,
    /// Pause after `:` or `;`
    pub colon_delay: Duration,
    /// Pause after a newline
    pub newline_delay: Duration,
    /// Pause after a space that follows sentence-ending punctuation
    pub sentence_space_delay: Duration,
    /// Extra pause after an ordinary space
    pub word_delay: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(20),
            period_delay: Duration::from_millis(80),
            comma_delay: Duration::from_millis(40),
            colon_delay: Duration::from_millis(50),
            newline_delay: Duration::from_millis(150),
            sentence_space_delay: Duration::from_millis(30),
            word_delay: Duration::from_millis(50),
        }
    }
}

impl RevealTiming {
    /// Pause after showing `ch`, given the character before it
    #[must_use]
    pub fn delay_after(&self, ch: char, prev: Option<char>) -> Duration {
        match ch {
            '.' | '!' | '?' => self.period_delay,
            ',' => self.comma_delay,
            ':' | ';' => self.colon_delay,
            '\n' => self.newline_delay,
            ' ' if matches!(prev, Some('.' | '!' | '?')) => self.sentence_space_delay,
            ' ' => self.char_delay + self.word_delay,
            _ => self.char_delay,
        }
    }
}

/// Progress of one typewriter reveal
#[derive(Clone, Debug)]
pub struct Reveal {
    started_at: Instant,
    /// Offset from `started_at` at which each character appears
    schedule: Vec<Duration>,
}

impl Reveal {
    /// Begin revealing `text` at `now`
    #[must_use]
    pub fn start(text: &str, timing: &RevealTiming, now: Instant) -> Self {
        let mut schedule = Vec::with_capacity(text.len());
        let mut at = Duration::ZERO;
        let mut prev = None;
        for ch in text.chars() {
            schedule.push(at);
            at += timing.delay_after(ch, prev);
            prev = Some(ch);
        }
        Self {
            started_at: now,
            schedule,
        }
    }

    /// Characters visible at `now`
    #[must_use]
    pub fn visible_chars(&self, now: Instant) -> usize {
        let elapsed = now.saturating_duration_since(self.started_at);
        self.schedule.partition_point(|at| *at <= elapsed)
    }

    /// Total characters in the text
    #[must_use]
    pub fn total_chars(&self) -> usize {
        self.schedule.len()
    }

    /// Whether every character is visible at `now`
    #[must_use]
    pub fn is_complete(&self, now: Instant) -> bool {
        self.visible_chars(now) == self.total_chars()
    }
}
