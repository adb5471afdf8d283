//! Terminal Renderer
//!
//! Turns one [`ViewModel`] into one terminal frame. Every screen region owns a
//! compositor layer; regions are redrawn into their layers, the compositor
//! stacks them, and the result is copied into the terminal in a single draw.
//!
//! # Layout
//!
//! ```text
//! ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓  header
//! ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛
//! ┏━ TRANSMISSION LOG ━━━━━━━━━━━━━━━━━┓┏━ SENTRY MODE ━━━━━━━━━━━━┓
//! ┃ conversation                       ┃┃ avatar + waveform         ┃  body
//! ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛┗━━━━━━━━━━━━━━━━━━━━━━━━━━━┛
//! ┏━ INPUT ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓  input
//! ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛
//!  ◇ READY │ hint                                        footer       status
//! ```
//!
//! The sidebar drops out on narrow terminals. A failure alert floats over the
//! body while the session is in the failed state, and the boot intro covers
//! the whole screen until it has played.

use ratatui::backend::Backend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Widget};
use ratatui::Terminal;

use neurallink_conductor::animation::{BOOT_LINES, SCAN_LINES};
use neurallink_conductor::{BootFrame, InteractionState, Renderer, ViewModel};

use crate::avatar::{AvatarFace, AVATAR_HEIGHT};
use crate::compositor::{Compositor, LayerId};
use crate::theme;
use crate::widgets::{ConversationLog, InputLine, Waveform};

/// Header rows, borders included
pub const HEADER_HEIGHT: u16 = 3;

/// Input panel rows, borders included
pub const INPUT_HEIGHT: u16 = 3;

/// Sidebar columns, borders included
pub const SIDEBAR_WIDTH: u16 = 30;

/// Narrowest terminal that still gets a sidebar
pub const MIN_WIDTH_FOR_SIDEBAR: u16 = 70;

/// Chance per frame that the header shows interference
pub const DEFAULT_GLITCH_CHANCE: f64 = 0.005;

const ALERT_WIDTH: u16 = 50;
const ALERT_HEIGHT: u16 = 5;

const SCAN_WIDTH: u16 = 50;

// ============================================================================
// Layout
// ============================================================================

/// Screen regions for one terminal size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Title bar
    pub header: Rect,
    /// Conversation panel
    pub conversation: Rect,
    /// Avatar panel, absent on narrow or short terminals
    pub sidebar: Option<Rect>,
    /// Input panel
    pub input: Rect,
    /// Bottom status row
    pub status: Rect,
    /// Failure alert box, centred over the body
    pub alert: Rect,
}

impl ScreenLayout {
    /// Split `area` into regions
    #[must_use]
    pub fn compute(area: Rect) -> Self {
        let header_h = HEADER_HEIGHT.min(area.height);
        let status_h = 1u16.min(area.height - header_h);
        let input_h = INPUT_HEIGHT.min(area.height - header_h - status_h);
        let body_h = area.height - header_h - status_h - input_h;

        let header = Rect::new(area.x, area.y, area.width, header_h);
        let body = Rect::new(area.x, area.y + header_h, area.width, body_h);
        let input = Rect::new(area.x, body.y + body_h, area.width, input_h);
        let status = Rect::new(area.x, input.y + input_h, area.width, status_h);

        let (conversation, sidebar) =
            if area.width >= MIN_WIDTH_FOR_SIDEBAR && body_h >= AVATAR_HEIGHT + 4 {
                let conv_w = area.width - SIDEBAR_WIDTH;
                (
                    Rect::new(body.x, body.y, conv_w, body_h),
                    Some(Rect::new(body.x + conv_w, body.y, SIDEBAR_WIDTH, body_h)),
                )
            } else {
                (body, None)
            };

        let alert_w = area.width.saturating_sub(4).min(ALERT_WIDTH);
        let alert_h = ALERT_HEIGHT.min(body_h);
        let alert = Rect::new(
            area.x + (area.width - alert_w) / 2,
            body.y + (body_h - alert_h) / 2,
            alert_w,
            alert_h,
        );

        Self {
            header,
            conversation,
            sidebar,
            input,
            status,
            alert,
        }
    }
}

/// Compositor layers, one per region
#[derive(Debug)]
struct ScreenLayers {
    header: LayerId,
    conversation: LayerId,
    sidebar: LayerId,
    input: LayerId,
    status: LayerId,
    alert: LayerId,
    boot: LayerId,
}

// ============================================================================
// Renderer
// ============================================================================

/// Draws view models onto a ratatui terminal
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    compositor: Compositor,
    layers: ScreenLayers,
    layout: ScreenLayout,
    glitch_chance: f64,
    frames_drawn: u64,
}

impl<B: Backend> TerminalRenderer<B> {
    /// Renderer sized to the terminal's current area
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal size cannot be read.
    pub fn new(terminal: Terminal<B>) -> anyhow::Result<Self> {
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        let layout = ScreenLayout::compute(area);

        let mut compositor = Compositor::new(area);
        let layers = ScreenLayers {
            conversation: compositor.create_layer(layout.conversation, 0),
            header: compositor.create_layer(layout.header, 10),
            sidebar: compositor.create_layer(layout.sidebar.unwrap_or_default(), 20),
            input: compositor.create_layer(layout.input, 30),
            status: compositor.create_layer(layout.status, 40),
            alert: compositor.create_layer(layout.alert, 100),
            boot: compositor.create_layer(area, 200),
        };
        compositor.set_opaque(layers.alert, true);
        compositor.set_visible(layers.alert, false);
        compositor.set_opaque(layers.boot, true);
        compositor.set_visible(layers.boot, false);
        compositor.set_visible(layers.sidebar, layout.sidebar.is_some());

        Ok(Self {
            terminal,
            compositor,
            layers,
            layout,
            glitch_chance: DEFAULT_GLITCH_CHANCE,
            frames_drawn: 0,
        })
    }

    /// Set the per-frame chance of header interference (0 disables it)
    #[must_use]
    pub fn with_glitch_chance(mut self, chance: f64) -> Self {
        self.glitch_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// The underlying terminal
    #[must_use]
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Mutable access to the terminal, for restoring it on exit
    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    /// Current layout
    #[must_use]
    pub fn layout(&self) -> ScreenLayout {
        self.layout
    }

    /// Frames successfully drawn so far
    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    fn relayout_if_resized(&mut self) {
        let size = match self.terminal.size() {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(error = %e, "could not read terminal size");
                return;
            }
        };
        let area = Rect::new(0, 0, size.width, size.height);
        if area == self.compositor.area() {
            return;
        }

        tracing::debug!(width = size.width, height = size.height, "terminal resized");
        let layout = ScreenLayout::compute(area);
        self.compositor.resize(area);
        self.compositor.set_bounds(self.layers.header, layout.header);
        self.compositor
            .set_bounds(self.layers.conversation, layout.conversation);
        self.compositor
            .set_bounds(self.layers.sidebar, layout.sidebar.unwrap_or_default());
        self.compositor
            .set_visible(self.layers.sidebar, layout.sidebar.is_some());
        self.compositor.set_bounds(self.layers.input, layout.input);
        self.compositor.set_bounds(self.layers.status, layout.status);
        self.compositor.set_bounds(self.layers.alert, layout.alert);
        self.compositor.set_bounds(self.layers.boot, area);
        self.layout = layout;
    }

    fn draw_layer(&mut self, id: LayerId, draw: impl FnOnce(Rect, &mut Buffer)) {
        if let Some(buf) = self.compositor.layer_buffer_mut(id) {
            buf.reset();
            let area = buf.area;
            if area.width > 0 && area.height > 0 {
                draw(area, buf);
            }
        }
    }

    fn render_header(&mut self, view: &ViewModel<'_>) {
        let glitched = self.glitch_chance > 0.0 && rand::random::<f64>() < self.glitch_chance;
        let border = theme::border_style(view.state, view.animation.pulse);

        self.draw_layer(self.layers.header, |area, buf| {
            let block = Block::bordered()
                .border_type(BorderType::Thick)
                .border_style(border);
            let inner = block.inner(area);
            block.render(area, buf);

            let line = if glitched {
                Line::from(vec![
                    Span::styled("T̷H̷E̷ ̷C̷O̷R̷E̷", theme::bold(theme::ERROR_RED)),
                    Span::styled("  ", Style::default()),
                    Span::styled("◇ SIGNAL INTERFERENCE ◇", Style::default().fg(theme::ERROR_RED)),
                ])
            } else {
                Line::from(vec![
                    Span::styled("THE CORE", theme::bold(theme::NEON_MAGENTA)),
                    Span::styled("  ", Style::default()),
                    Span::styled(
                        "◇ NEURAL INTERFACE v2.0 ◇",
                        Style::default().fg(theme::NEON_CYAN),
                    ),
                ])
            };
            line.centered().render(inner, buf);
        });
    }

    fn render_conversation(&mut self, view: &ViewModel<'_>) {
        let border = theme::border_style(view.state, view.animation.pulse);
        self.draw_layer(self.layers.conversation, |area, buf| {
            let block = Block::bordered()
                .border_type(BorderType::Thick)
                .border_style(border)
                .title(Line::styled(" TRANSMISSION LOG ", border));
            let inner = block.inner(area);
            block.render(area, buf);
            ConversationLog::new(view.history, view.reveal).render(inner, buf);
        });
    }

    fn render_sidebar(&mut self, view: &ViewModel<'_>) {
        if self.layout.sidebar.is_none() {
            return;
        }
        let border = theme::border_style(view.state, view.animation.pulse);
        self.draw_layer(self.layers.sidebar, |area, buf| {
            let block = Block::bordered()
                .border_type(BorderType::Thick)
                .border_style(border)
                .title(Line::styled(sidebar_title(view.state), theme::bold(theme::state_color(view.state))));
            let inner = block.inner(area);
            block.render(area, buf);

            let face = Rect::new(inner.x, inner.y + 1, inner.width, AVATAR_HEIGHT);
            AvatarFace::new(&view.animation, view.state).render(face, buf);

            let wave_y = face.y + AVATAR_HEIGHT + 1;
            if wave_y < inner.y + inner.height {
                Waveform::new(&view.animation.waveform)
                    .render(Rect::new(inner.x, wave_y, inner.width, 1), buf);
            }
            let label_y = wave_y + 2;
            if label_y < inner.y + inner.height {
                Line::styled(
                    format!("{} {}", view.state.icon(), view.state.label()),
                    theme::bold(theme::state_color(view.state)),
                )
                .centered()
                .render(Rect::new(inner.x, label_y, inner.width, 1), buf);
            }
        });
    }

    fn render_input(&mut self, view: &ViewModel<'_>) {
        let busy = view.state.is_busy();
        let border = if busy {
            Style::default().fg(theme::TEXT_DIM)
        } else {
            Style::default().fg(theme::NEON_CYAN)
        };
        self.draw_layer(self.layers.input, |area, buf| {
            let block = Block::bordered()
                .border_type(BorderType::Thick)
                .border_style(border)
                .title(Line::styled(" INPUT ", border));
            let inner = block.inner(area);
            block.render(area, buf);
            InputLine::new(view.input, view.animation.frame, busy).render(inner, buf);
        });
    }

    fn render_status(&mut self, view: &ViewModel<'_>) {
        self.draw_layer(self.layers.status, |area, buf| {
            let accent = theme::bold(theme::state_color(view.state));
            let trailing = match view.notice {
                Some(notice) => Span::styled(notice, theme::bold(theme::WARNING_YELLOW)),
                None => Span::styled(view.hint(), Style::default().fg(theme::TEXT_DIM)),
            };
            // The failed status text already leads with its glyph.
            let lead = match view.state {
                InteractionState::Failed => " ".to_string(),
                state => format!(" {} ", state.icon()),
            };
            let left = Line::from(vec![
                Span::styled(lead, accent),
                Span::styled(view.status_text(), accent),
                Span::styled(" │ ", Style::default().fg(theme::TEXT_FADED)),
                trailing,
            ]);
            let footer = Line::styled(
                format!("{} ", view.footer_text()),
                Style::default().fg(theme::TEXT_FADED),
            );

            if left.width() + footer.width() + 2 <= usize::from(area.width) {
                footer.right_aligned().render(area, buf);
            }
            left.render(area, buf);
        });
    }

    fn render_alert(&mut self, view: &ViewModel<'_>) {
        let message = match (view.state, view.error_message) {
            (InteractionState::Failed, Some(message)) => message,
            _ => {
                self.compositor.set_visible(self.layers.alert, false);
                return;
            }
        };
        self.compositor.set_visible(self.layers.alert, true);

        self.draw_layer(self.layers.alert, |area, buf| {
            let block = Block::bordered()
                .border_type(BorderType::Thick)
                .border_style(Style::default().fg(theme::ERROR_RED))
                .title(Line::styled(" ⚠ SIGNAL LOST ", theme::bold(theme::ERROR_RED)));
            let inner = block.inner(area);
            block.render(area, buf);

            let width = usize::from(inner.width).max(1);
            for (y, line) in (inner.y..inner.y + inner.height).zip(textwrap::wrap(message, width)) {
                Line::styled(line.into_owned(), Style::default().fg(theme::TEXT_PRIMARY))
                    .centered()
                    .render(Rect::new(inner.x, y, inner.width, 1), buf);
            }
        });
    }

    fn render_boot(&mut self, boot: Option<BootFrame>) {
        let Some(boot) = boot else {
            self.compositor.set_visible(self.layers.boot, false);
            return;
        };
        self.compositor.set_visible(self.layers.boot, true);

        self.draw_layer(self.layers.boot, |area, buf| {
            let rows = boot_rows(boot);
            let height = u16::try_from(BOOT_LINES.len() * 2 + 1 + SCAN_LINES).unwrap_or(u16::MAX);
            let top = area.y + area.height.saturating_sub(height) / 2;
            for (offset, line) in rows {
                let y = top + offset;
                if y < area.y + area.height {
                    line.centered().render(Rect::new(area.x, y, area.width, 1), buf);
                }
            }
        });
    }
}

/// Rows of the boot intro as (offset from the top, line).
/// Banner lines sit on every other row; scan lines follow a blank row.
fn boot_rows(boot: BootFrame) -> Vec<(u16, Line<'static>)> {
    let banner = BOOT_LINES
        .iter()
        .take(boot.lines)
        .zip((1u16..).step_by(2))
        .map(|(text, row)| (row, Line::styled(*text, theme::bold(theme::NEON_MAGENTA))));
    let scan_top = u16::try_from(BOOT_LINES.len() * 2 + 1).unwrap_or(u16::MAX);
    let scan = (scan_top..).take(boot.scan_lines.min(SCAN_LINES)).map(|row| {
        (
            row,
            Line::styled(
                "─".repeat(usize::from(SCAN_WIDTH)),
                Style::default().fg(theme::TEXT_DIM),
            ),
        )
    });
    banner.chain(scan).collect()
}

/// Sidebar title for a state
#[must_use]
pub fn sidebar_title(state: InteractionState) -> &'static str {
    match state {
        InteractionState::Idle => " SENTRY MODE ",
        InteractionState::Generating => " !!! OVERHEAT !!! ",
        InteractionState::Playing => " VOICE PROJECTION ",
        InteractionState::Failed => " SYSTEM FAULT ",
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, view: &ViewModel<'_>) {
        self.relayout_if_resized();

        self.render_conversation(view);
        self.render_header(view);
        self.render_sidebar(view);
        self.render_input(view);
        self.render_status(view);
        self.render_alert(view);
        self.render_boot(view.boot);

        let compositor = &mut self.compositor;
        let drawn = self.terminal.draw(|frame| {
            let output = compositor.composite();
            let area = frame.area();
            let buf = frame.buffer_mut();

            for y in 0..area.height.min(output.area.height) {
                for x in 0..area.width.min(output.area.width) {
                    buf[(x, y)] = output[(x, y)].clone();
                }
            }
        });

        match drawn {
            Ok(_) => self.frames_drawn += 1,
            Err(e) => tracing::warn!(error = %e, "terminal draw failed"),
        }
    }
}
