//! Renderer Tests
//!
//! Draw view models onto ratatui's `TestBackend` and check what lands on
//! screen, both frame by frame and through a live session.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use tokio_test::assert_ok;

use neurallink_conductor::{
    AnimationParams, BackendError, BootFrame, ByteSource, ConversationHistory, EchoBackend, InputLineBuffer,
    InteractionState, ModelBackend, Renderer, Role, SessionCoordinator, SimulatedSpeaker,
    UiSettings, ViewModel,
};
use neurallink_tui::TerminalRenderer;

// ============================================================================
// Helpers
// ============================================================================

fn renderer(width: u16, height: u16) -> TerminalRenderer<TestBackend> {
    let terminal = assert_ok!(Terminal::new(TestBackend::new(width, height)));
    assert_ok!(TerminalRenderer::new(terminal)).with_glitch_chance(0.0)
}

fn view<'a>(
    state: InteractionState,
    history: &'a ConversationHistory,
    input: &'a InputLineBuffer,
    frame: u64,
) -> ViewModel<'a> {
    ViewModel {
        state,
        history,
        input,
        animation: AnimationParams::derive(frame, state),
        error_message: None,
        reveal: None,
        notice: None,
        time_in_state: Duration::ZERO,
        model: "echo",
        device: "simulated",
        boot: None,
    }
}

fn screen(renderer: &TerminalRenderer<TestBackend>) -> String {
    let buf = renderer.terminal().backend().buffer();
    let mut out = String::new();
    for y in 0..buf.area.height {
        for x in 0..buf.area.width {
            out.push_str(buf[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

/// Bytes queued by the test; never reports end of input
#[derive(Default)]
struct Keys(VecDeque<u8>);

impl Keys {
    fn typed(text: &str) -> Self {
        Self(text.bytes().collect())
    }
}

impl ByteSource for Keys {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.0.len());
        for (slot, byte) in buf.iter_mut().zip(self.0.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

struct Unreachable;

impl ModelBackend for Unreachable {
    fn name(&self) -> &str {
        "offline"
    }

    fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
        Err(BackendError::Connection("connection refused".into()))
    }
}

fn settings() -> UiSettings {
    UiSettings {
        stream_text: false,
        recovery_delay: Duration::from_secs(60),
        boot_sequence: false,
        ..UiSettings::default()
    }
}

fn tick_until<S: ByteSource>(
    session: &mut SessionCoordinator<S, TerminalRenderer<TestBackend>>,
    done: impl Fn(&SessionCoordinator<S, TerminalRenderer<TestBackend>>) -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(session) {
        assert!(Instant::now() < deadline, "session never settled");
        session.tick();
        std::thread::sleep(Duration::from_millis(2));
    }
    session.tick();
}

// ============================================================================
// Single frames
// ============================================================================

#[test]
fn test_idle_frame() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(100, 30);

    r.render(&view(InteractionState::Idle, &history, &input, 0));
    let text = screen(&r);

    assert!(text.contains("THE CORE"));
    assert!(text.contains("NEURAL INTERFACE v2.0"));
    assert!(text.contains("SENTRY MODE"));
    assert!(text.contains("NEURAL LINK ESTABLISHED"));
    assert!(text.contains("AWAITING INPUT"));
    assert!(text.contains("READY"));
    assert!(text.contains("model: echo · output: simulated"));
    assert_eq!(r.frames_drawn(), 1);
}

#[test]
fn test_state_titles_follow_state() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(100, 30);

    r.render(&view(InteractionState::Generating, &history, &input, 3));
    assert!(screen(&r).contains("!!! OVERHEAT !!!"));
    assert!(screen(&r).contains("PROCESSING"));

    r.render(&view(InteractionState::Playing, &history, &input, 3));
    assert!(screen(&r).contains("VOICE PROJECTION"));
    assert!(screen(&r).contains("SPEAKING"));
}

#[test]
fn test_waveform_bars_only_while_playing() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let bars = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    let mut r = renderer(100, 30);
    r.render(&view(InteractionState::Idle, &history, &input, 7));
    assert!(!screen(&r).chars().any(|c| bars.contains(&c)));

    let mut playing = false;
    for frame in 0..10 {
        r.render(&view(InteractionState::Playing, &history, &input, frame));
        playing |= screen(&r).chars().any(|c| bars.contains(&c));
    }
    assert!(playing);
}

#[test]
fn test_conversation_and_input_are_drawn() {
    let mut history = ConversationHistory::new(10);
    history.push(Role::User, "status report");
    history.push(Role::Assistant, "all systems nominal");
    let mut input = InputLineBuffer::new(100);
    for ch in "next".chars() {
        input.insert(ch);
    }

    let mut r = renderer(100, 30);
    r.render(&view(InteractionState::Idle, &history, &input, 0));
    let text = screen(&r);

    assert!(text.contains("YOU ▸ status report"));
    assert!(text.contains("AI ▸ all systems nominal"));
    assert!(text.contains(" >> next"));
    assert!(!text.contains("AWAITING INPUT"));
}

#[test]
fn test_notice_replaces_hint() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(100, 30);

    let mut v = view(InteractionState::Idle, &history, &input, 0);
    v.notice = Some("Press Ctrl-C again to quit");
    r.render(&v);

    let text = screen(&r);
    assert!(text.contains("Press Ctrl-C again to quit"));
    assert!(!text.contains("Enter send"));
}

#[test]
fn test_failure_alert_overlays_body() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(100, 30);

    let mut v = view(InteractionState::Failed, &history, &input, 0);
    v.error_message = Some("Neural link error: Cannot connect to Ollama. Is it running?");
    r.render(&v);
    let text = screen(&r);
    assert!(text.contains("SIGNAL LOST"));
    assert!(text.contains("Cannot connect to Ollama"));

    r.render(&view(InteractionState::Idle, &history, &input, 1));
    assert!(!screen(&r).contains("SIGNAL LOST"));
}

#[test]
fn test_narrow_terminal_hides_sidebar() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(60, 24);

    r.render(&view(InteractionState::Idle, &history, &input, 0));
    assert_eq!(r.layout().sidebar, None);
    assert!(!screen(&r).contains("SENTRY MODE"));
}

#[test]
fn test_resize_relayouts() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(60, 24);
    r.render(&view(InteractionState::Idle, &history, &input, 0));
    assert_eq!(r.layout().sidebar, None);

    r.terminal_mut().backend_mut().resize(100, 30);
    r.render(&view(InteractionState::Idle, &history, &input, 1));
    assert!(r.layout().sidebar.is_some());
    assert!(screen(&r).contains("SENTRY MODE"));
}

#[test]
fn test_tiny_terminal_still_draws() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(8, 3);
    r.render(&view(InteractionState::Generating, &history, &input, 0));
    assert_eq!(r.frames_drawn(), 1);
}

#[test]
fn test_header_interference() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(100, 30).with_glitch_chance(1.0);

    r.render(&view(InteractionState::Idle, &history, &input, 0));
    assert!(screen(&r).contains("SIGNAL INTERFERENCE"));
}

#[test]
fn test_boot_intro_covers_the_screen() {
    let history = ConversationHistory::new(10);
    let input = InputLineBuffer::new(100);
    let mut r = renderer(100, 30);

    let mut v = view(InteractionState::Idle, &history, &input, 1);
    v.boot = Some(BootFrame { lines: 2, scan_lines: 0 });
    r.render(&v);
    let text = screen(&r);
    assert!(text.contains("INITIALIZING NEURAL LINK"));
    assert!(text.contains("SYNCING CONSCIOUSNESS"));
    assert!(!text.contains("LOADING PERSONALITY MATRIX"));
    assert!(!text.contains("SENTRY MODE"));
    assert!(!text.contains("AWAITING INPUT"));

    v.boot = Some(BootFrame { lines: 4, scan_lines: 3 });
    r.render(&v);
    let text = screen(&r);
    assert!(text.contains("THE CORE ONLINE"));
    assert!(text.contains(&"─".repeat(50)));

    r.render(&view(InteractionState::Idle, &history, &input, 2));
    let text = screen(&r);
    assert!(!text.contains("INITIALIZING NEURAL LINK"));
    assert!(text.contains("SENTRY MODE"));
}

// ============================================================================
// Live session
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_round_trip_on_screen() {
    let speaker = Arc::new(SimulatedSpeaker::with_pace("simulated", Duration::ZERO));
    let mut session = SessionCoordinator::new(
        &settings(),
        Keys::typed("ping\r"),
        renderer(100, 30),
        Arc::new(EchoBackend::new(Duration::ZERO)),
        speaker,
        tokio::runtime::Handle::current(),
    );

    tick_until(&mut session, |s| {
        s.history().len() == 2 && s.state() == InteractionState::Idle
    });

    let text = screen(session.renderer());
    assert!(text.contains("YOU ▸ ping"));
    assert!(text.contains("AI ▸ Neural response to: ping"));
    assert!(text.contains("READY"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backend_failure_on_screen() {
    let speaker = Arc::new(SimulatedSpeaker::with_pace("simulated", Duration::ZERO));
    let mut session = SessionCoordinator::new(
        &settings(),
        Keys::typed("hello\r"),
        renderer(100, 30),
        Arc::new(Unreachable),
        speaker,
        tokio::runtime::Handle::current(),
    );

    tick_until(&mut session, |s| s.state() == InteractionState::Failed);

    let text = screen(session.renderer());
    assert!(text.contains("SIGNAL LOST"));
    assert!(text.contains("SYSTEM FAULT"));
    assert!(text.contains("✗ Neural link error"));
}
