//! Waveform Widget
//!
//! One row of block characters while speaking, a flat line otherwise.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

use neurallink_conductor::animation::WAVEFORM_LEVELS;

use crate::theme;

/// Bar glyphs indexed by level
const BLOCKS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

/// Glyph for a level
#[must_use]
pub fn bar(level: u8) -> &'static str {
    BLOCKS[usize::from(level.min(WAVEFORM_LEVELS))]
}

/// Colour band for a level: pink peaks, cyan middle, dim blue floor
#[must_use]
pub fn bar_style(level: u8) -> Style {
    match level {
        7.. => Style::default().fg(theme::NEON_PINK),
        4..=6 => Style::default().fg(theme::NEON_CYAN),
        _ => Style::default().fg(theme::WAVE_LOW),
    }
}

/// Waveform for one frame
pub struct Waveform<'a> {
    levels: &'a [u8],
}

impl<'a> Waveform<'a> {
    /// Waveform of `levels`; all zero draws the flat line
    #[must_use]
    pub fn new(levels: &'a [u8]) -> Self {
        Self { levels }
    }

    fn is_flat(&self) -> bool {
        self.levels.iter().all(|&l| l == 0)
    }
}

impl Widget for Waveform<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let width = usize::from(area.width).min(self.levels.len().max(1));
        let x0 = area.x + (area.width - u16::try_from(width).unwrap_or(area.width)) / 2;

        if self.is_flat() {
            buf.set_string(
                x0,
                area.y,
                "─".repeat(width),
                Style::default().fg(theme::NEON_GREEN),
            );
            return;
        }

        for (x, &level) in (x0..).zip(self.levels.iter().take(width)) {
            buf.set_string(x, area.y, bar(level), bar_style(level));
        }
    }
}
