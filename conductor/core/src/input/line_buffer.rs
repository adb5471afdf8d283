//! The line being edited.

/// Default cap on characters in the line
pub const DEFAULT_INPUT_CAPACITY: usize = 10_000;

/// Editable text with a cursor
///
/// The cursor is a character index in `0..=len`. Inserting into a full buffer
/// is a silent no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputLineBuffer {
    chars: Vec<char>,
    cursor: usize,
    capacity: usize,
}

impl InputLineBuffer {
    /// Empty buffer holding at most `capacity` characters
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            chars: Vec::new(),
            cursor: 0,
            capacity,
        }
    }

    /// Insert `ch` at the cursor. Returns `false` if the buffer was full.
    pub fn insert(&mut self, ch: char) -> bool {
        if self.chars.len() >= self.capacity {
            return false;
        }
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
        true
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    /// Move the cursor one character left
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move the cursor one character right
    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    /// Replace the contents, truncated to capacity, cursor at the end
    pub fn set_text(&mut self, text: &str) {
        self.chars = text.chars().take(self.capacity).collect();
        self.cursor = self.chars.len();
    }

    /// Empty the buffer
    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Return the contents and reset to empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.chars).into_iter().collect()
    }

    /// Current contents
    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Text left of the cursor
    #[must_use]
    pub fn before_cursor(&self) -> String {
        self.chars[..self.cursor].iter().collect()
    }

    /// Text right of the cursor
    #[must_use]
    pub fn after_cursor(&self) -> String {
        self.chars[self.cursor..].iter().collect()
    }

    /// Cursor position in characters
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of characters
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Maximum number of characters
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether further inserts will be dropped
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.chars.len() >= self.capacity
    }
}

impl Default for InputLineBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_CAPACITY)
    }
}
