//! Avatar - the face in the sidebar
//!
//! A boxed face whose eyes and mouth come straight from the frame's
//! [`AnimationParams`]. Nothing here keeps its own timers; the same
//! parameters always draw the same face.
//!
//! ```text
//! ╔═══════════╗
//! ║     ◇     ║
//! ║   ◉   ◉   ║
//! ║ ───────── ║
//! ║   ═════   ║
//! ╚═══════════╝
//! ```

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

use neurallink_conductor::{AnimationParams, EyeShape, InteractionState, MouthShape};

use crate::theme;

/// Face width in cells
pub const AVATAR_WIDTH: u16 = 13;

/// Face height in cells
pub const AVATAR_HEIGHT: u16 = 6;

/// Seven-cell eye row for `shape`
#[must_use]
pub fn eyes(shape: EyeShape) -> &'static str {
    match shape {
        EyeShape::Open => " ◉   ◉ ",
        EyeShape::Closed => " ─   ─ ",
        EyeShape::LookLeft => "◉   ◉  ",
        EyeShape::LookUp => " ◠   ◠ ",
        EyeShape::LookRight => "  ◉   ◉",
        EyeShape::Squint => " ◡   ◡ ",
        EyeShape::Wide => " ⊙   ⊙ ",
        EyeShape::Glitch => " █   █ ",
    }
}

/// Five-cell mouth for `shape`
#[must_use]
pub fn mouth(shape: MouthShape) -> String {
    match shape {
        MouthShape::Closed => "═════".into(),
        MouthShape::Open => "╭───╮".into(),
        MouthShape::Round => "╰─○─╯".into(),
        MouthShape::Wide => "╭─●─╮".into(),
        MouthShape::Processing(dots) => {
            let lit = usize::from(dots.min(5));
            format!("{}{}", "▪".repeat(lit), "─".repeat(5 - lit))
        }
        MouthShape::Frown => "╭═══╮".into(),
    }
}

/// The face for one frame
pub struct AvatarFace<'a> {
    params: &'a AnimationParams,
    state: InteractionState,
}

impl<'a> AvatarFace<'a> {
    /// Face showing `params` in `state`
    #[must_use]
    pub fn new(params: &'a AnimationParams, state: InteractionState) -> Self {
        Self { params, state }
    }

    /// The six rows of the face, top to bottom
    #[must_use]
    pub fn lines(&self) -> [String; 6] {
        [
            "╔═══════════╗".to_string(),
            format!("║     {}     ║", self.state.icon()),
            format!("║  {}  ║", eyes(self.params.eyes)),
            "║ ───────── ║".to_string(),
            format!("║   {}   ║", mouth(self.params.mouth)),
            "╚═══════════╝".to_string(),
        ]
    }
}

impl Widget for AvatarFace<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < AVATAR_WIDTH || area.height < AVATAR_HEIGHT {
            return;
        }
        let x = area.x + (area.width - AVATAR_WIDTH) / 2;
        let y = area.y + (area.height - AVATAR_HEIGHT) / 2;

        let frame_style = match self.state {
            InteractionState::Failed => Style::default().fg(theme::ERROR_RED),
            InteractionState::Playing => Style::default().fg(theme::pulse_color(self.params.pulse)),
            _ => Style::default().fg(theme::NEON_CYAN),
        };
        let eye_style = match self.state {
            InteractionState::Generating => theme::bold(theme::NEON_ORANGE),
            InteractionState::Failed => theme::bold(theme::ERROR_RED),
            _ => theme::bold(theme::NEON_MAGENTA),
        };

        for (row, line) in (0u16..).zip(self.lines()) {
            buf.set_string(x, y + row, &line, frame_style);
        }
        // Recolour the features inside the frame.
        buf.set_string(x + 3, y + 2, eyes(self.params.eyes), eye_style);
        buf.set_string(
            x + 4,
            y + 4,
            mouth(self.params.mouth),
            theme::bold(theme::NEON_PINK),
        );
        buf.set_string(
            x + 6,
            y + 1,
            self.state.icon(),
            theme::bold(theme::state_color(self.state)),
        );
    }
}
