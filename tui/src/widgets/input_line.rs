//! Input Line Widget
//!
//! Single-row editor view: a ` >> ` prompt, then as much of the line as fits
//! with the cursor always in view. Long lines scroll horizontally.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthChar;

use neurallink_conductor::InputLineBuffer;

use crate::theme;

/// Prompt drawn before the text
pub const PROMPT: &str = " >> ";

/// Placeholder for an empty line
pub const PLACEHOLDER: &str = "AWAITING INPUT";

/// Frames per half blink of the cursor
const CURSOR_BLINK_FRAMES: u64 = 10;

/// The input line for one frame
pub struct InputLine<'a> {
    input: &'a InputLineBuffer,
    frame: u64,
    busy: bool,
}

impl<'a> InputLine<'a> {
    /// Line showing `input` at animation `frame`; `busy` dims the prompt
    #[must_use]
    pub fn new(input: &'a InputLineBuffer, frame: u64, busy: bool) -> Self {
        Self { input, frame, busy }
    }

    /// Whether the cursor cell is lit this frame
    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        (self.frame / CURSOR_BLINK_FRAMES) % 2 == 0
    }

    /// Visible slice of the line for `width` cells: the text and the
    /// cell offset of the cursor within it
    #[must_use]
    pub fn window(&self, width: usize) -> (String, usize) {
        if width == 0 {
            return (String::new(), 0);
        }
        let before: Vec<char> = self.input.before_cursor().chars().collect();

        // Keep one cell free for the cursor.
        let mut used = 0;
        let mut start = before.len();
        while start > 0 {
            let w = before[start - 1].width().unwrap_or(0);
            if used + w >= width {
                break;
            }
            used += w;
            start -= 1;
        }

        let mut text: String = before[start..].iter().collect();
        let cursor_at = used;
        for ch in self.input.after_cursor().chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width {
                break;
            }
            used += w;
            text.push(ch);
        }
        (text, cursor_at)
    }
}

impl Widget for InputLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width <= 4 || area.height == 0 {
            return;
        }
        let prompt_style = if self.busy {
            Style::default().fg(theme::TEXT_DIM)
        } else {
            theme::bold(theme::NEON_CYAN)
        };
        buf.set_string(area.x, area.y, PROMPT, prompt_style);

        let x0 = area.x + 4;
        let mut avail = usize::from(area.width - 4);
        if self.input.is_full() && avail > 6 {
            avail -= 5;
            buf.set_string(
                area.x + area.width - 4,
                area.y,
                "MAX",
                theme::bold(theme::WARNING_YELLOW),
            );
        }

        let cursor_style = Style::default()
            .fg(theme::NEON_CYAN)
            .add_modifier(Modifier::REVERSED);

        if self.input.is_empty() {
            if self.cursor_visible() {
                buf.set_string(x0, area.y, " ", cursor_style);
            }
            buf.set_stringn(
                x0 + 1,
                area.y,
                PLACEHOLDER,
                avail.saturating_sub(1),
                Style::default().fg(theme::TEXT_FADED),
            );
            return;
        }

        let (text, cursor_at) = self.window(avail);
        buf.set_stringn(
            x0,
            area.y,
            &text,
            avail,
            Style::default().fg(theme::TEXT_PRIMARY),
        );

        if self.cursor_visible() {
            let cx = x0 + u16::try_from(cursor_at).unwrap_or(0);
            if cx < area.x + area.width {
                let cell = &mut buf[(cx, area.y)];
                cell.set_style(cursor_style);
            }
        }
    }
}
