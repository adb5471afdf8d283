//! Theme and Colors
//!
//! High-contrast neon palette on a dark background.

use ratatui::style::{Color, Modifier, Style};

use neurallink_conductor::InteractionState;

// ============================================================================
// Neon Palette
// ============================================================================

/// Frames, header, idle borders
pub const NEON_CYAN: Color = Color::Rgb(0, 255, 255);

/// Avatar eyes, assistant label
pub const NEON_MAGENTA: Color = Color::Rgb(255, 0, 255);

/// Waveform, speaking state
pub const NEON_GREEN: Color = Color::Rgb(0, 255, 65);

/// Processing state, operator input
pub const NEON_ORANGE: Color = Color::Rgb(255, 102, 0);

/// Mouth, waveform peaks
pub const NEON_PINK: Color = Color::Rgb(255, 0, 128);

// ============================================================================
// Text
// ============================================================================

/// Normal text
pub const TEXT_PRIMARY: Color = Color::Rgb(224, 224, 224);

/// Secondary text, idle status
pub const TEXT_DIM: Color = Color::Rgb(96, 96, 128);

/// Old conversation entries
pub const TEXT_FADED: Color = Color::Rgb(68, 68, 68);

/// Error text
pub const ERROR_RED: Color = Color::Rgb(255, 51, 51);

/// Notices
pub const WARNING_YELLOW: Color = Color::Rgb(255, 204, 0);

/// Waveform low bars
pub const WAVE_LOW: Color = Color::Rgb(40, 90, 160);

// ============================================================================
// Styles
// ============================================================================

/// Accent colour for a state
#[must_use]
pub fn state_color(state: InteractionState) -> Color {
    match state {
        InteractionState::Idle => TEXT_DIM,
        InteractionState::Generating => NEON_ORANGE,
        InteractionState::Playing => NEON_GREEN,
        InteractionState::Failed => ERROR_RED,
    }
}

/// Border colour while speaking: cyan fading toward magenta as `pulse` rises
#[must_use]
pub fn pulse_color(pulse: f32) -> Color {
    let p = pulse.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| -> u8 {
        let v = f32::from(from) + (f32::from(to) - f32::from(from)) * p;
        // Clamped to 0..=255 above.
        v.round() as u8
    };
    Color::Rgb(mix(0, 255), mix(255, 0), 255)
}

/// Border style for panels in `state`
#[must_use]
pub fn border_style(state: InteractionState, pulse: f32) -> Style {
    match state {
        InteractionState::Playing => Style::default().fg(pulse_color(pulse)),
        InteractionState::Generating => Style::default().fg(NEON_ORANGE),
        InteractionState::Failed => Style::default().fg(ERROR_RED),
        InteractionState::Idle => Style::default().fg(NEON_CYAN),
    }
}

/// Bold foreground
#[must_use]
pub fn bold(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pulse_endpoints() {
        assert_eq!(pulse_color(0.0), Color::Rgb(0, 255, 255));
        assert_eq!(pulse_color(1.0), Color::Rgb(255, 0, 255));
        assert_eq!(pulse_color(7.0), Color::Rgb(255, 0, 255));
    }

    #[test]
    fn test_failed_border_is_red() {
        assert_eq!(
            border_style(InteractionState::Failed, 0.5).fg,
            Some(ERROR_RED)
        );
    }
}
