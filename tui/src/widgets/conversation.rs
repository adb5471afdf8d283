//! Conversation Log Widget
//!
//! Borderless transcript, newest at the bottom. Older entries fade with age
//! and the top edge dims when earlier lines are clipped off.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;

use neurallink_conductor::{ConversationHistory, HistoryEntry, Role};

use crate::theme;

/// Cursor shown at the end of a reply that is still being revealed
const REVEAL_CURSOR: char = '▌';

/// The transcript for one frame
pub struct ConversationLog<'a> {
    history: &'a ConversationHistory,
    reveal: Option<usize>,
}

impl<'a> ConversationLog<'a> {
    /// Log of `history`; `reveal` limits the newest assistant entry
    #[must_use]
    pub fn new(history: &'a ConversationHistory, reveal: Option<usize>) -> Self {
        Self { history, reveal }
    }

    /// Wrapped lines with their styles, oldest first
    #[must_use]
    pub fn lines(&self, width: usize) -> Vec<(String, Style)> {
        let total = self.history.len();
        let mut out = Vec::new();

        for (index, entry) in self.history.iter().enumerate() {
            let age = total - 1 - index;
            let newest = age == 0;
            let text = self.visible_text(entry, newest);
            let content = format!(
                "[{}] {} ▸ {}",
                entry.timestamp.format("%H:%M"),
                entry.role.prefix(),
                text
            );
            let style = entry_style(entry.role, age);

            for raw_line in content.split('\n') {
                if raw_line.is_empty() {
                    out.push((String::new(), style));
                    continue;
                }
                for line in textwrap::wrap(raw_line, width.max(1)) {
                    out.push((line.into_owned(), style));
                }
            }
            out.push((String::new(), Style::default()));
        }
        out.pop();
        out
    }

    fn visible_text(&self, entry: &HistoryEntry, newest: bool) -> String {
        match self.reveal {
            Some(shown) if newest && entry.role == Role::Assistant => {
                let mut text: String = entry.text.chars().take(shown).collect();
                text.push(REVEAL_CURSOR);
                text
            }
            _ => entry.text.clone(),
        }
    }
}

/// Style for an entry `age` places back from the newest
#[must_use]
pub fn entry_style(role: Role, age: usize) -> Style {
    let color = match (role, age) {
        (Role::User, 0) => theme::NEON_ORANGE,
        (Role::Assistant, 0) => theme::TEXT_PRIMARY,
        (Role::SystemError, 0..=3) => theme::ERROR_RED,
        (_, 0..=3) => theme::TEXT_DIM,
        (_, 4..=10) => theme::TEXT_FADED,
        _ => Color::Rgb(45, 45, 45),
    };
    Style::default().fg(color)
}

impl Widget for ConversationLog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = usize::from(area.width);
        let height = usize::from(area.height);
        if width < 10 || height == 0 {
            return;
        }

        if self.history.is_empty() {
            let mid = area.y + area.height / 2;
            for (dy, (text, style)) in [
                ("◇ NEURAL LINK ESTABLISHED ◇", theme::bold(theme::NEON_CYAN)),
                (
                    "Type your query to begin transmission",
                    Style::default().fg(theme::TEXT_DIM),
                ),
            ]
            .into_iter()
            .enumerate()
            {
                let y = mid.saturating_sub(1) + u16::try_from(dy).unwrap_or(0);
                if y >= area.y + area.height {
                    break;
                }
                let len = u16::try_from(text.chars().count()).unwrap_or(area.width);
                let x = area.x + area.width.saturating_sub(len) / 2;
                buf.set_stringn(x, y, text, width, style);
            }
            return;
        }

        let lines = self.lines(width);
        let start = lines.len().saturating_sub(height);
        let clipped = start > 0;

        for (y, (i, (line, style))) in (area.y..).zip(lines.iter().skip(start).enumerate()) {
            let style = match i {
                0 if clipped => Style::default().fg(Color::Rgb(80, 80, 80)),
                1 if clipped => Style::default().fg(Color::Rgb(120, 120, 120)),
                _ => *style,
            };
            buf.set_stringn(area.x, y, line, width, style);
        }
    }
}
