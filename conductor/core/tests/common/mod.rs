//! Shared fakes for driving a `SessionCoordinator` without a terminal.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use neurallink_conductor::backend::{BackendError, ModelBackend};
use neurallink_conductor::config::UiSettings;
use neurallink_conductor::playback::{PlaybackDevice, PlaybackError};
use neurallink_conductor::{
    ByteSource, EyeShape, InteractionState, MouthShape, Renderer, SessionCoordinator, TickOutcome,
    ViewModel,
};

pub const ARROW_UP: &[u8] = b"\x1b[A";
pub const ARROW_DOWN: &[u8] = b"\x1b[B";
pub const ARROW_LEFT: &[u8] = b"\x1b[D";
pub const CTRL_C: &[u8] = b"\x03";
pub const CTRL_D: &[u8] = b"\x04";

// =============================================================================
// Byte source
// =============================================================================

/// Bytes queued by the test, handed out a few at a time
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pending: VecDeque<u8>,
    closed: bool,
    reads: usize,
}

impl ScriptedSource {
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl ByteSource for ScriptedSource {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        if self.pending.is_empty() && self.closed {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let n = buf.len().min(self.pending.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.pending.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// Backend that blocks until the test hands it a reply
pub struct GatedBackend {
    replies: Mutex<mpsc::Receiver<Result<String, BackendError>>>,
    prompts: Mutex<Vec<String>>,
}

impl GatedBackend {
    pub fn new() -> (Arc<Self>, mpsc::Sender<Result<String, BackendError>>) {
        let (tx, rx) = mpsc::channel();
        let backend = Arc::new(Self {
            replies: Mutex::new(rx),
            prompts: Mutex::new(Vec::new()),
        });
        (backend, tx)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl ModelBackend for GatedBackend {
    fn name(&self) -> &str {
        "gated-model"
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .recv()
            .unwrap_or_else(|_| Err(BackendError::Connection("test ended".into())))
    }
}

/// Backend that answers immediately
pub struct InstantBackend;

impl ModelBackend for InstantBackend {
    fn name(&self) -> &str {
        "instant-model"
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        Ok(format!("re: {prompt}"))
    }
}

/// Backend whose call panics
pub struct PanickingBackend;

impl ModelBackend for PanickingBackend {
    fn name(&self) -> &str {
        "panicking-model"
    }

    fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
        panic!("model exploded");
    }
}

/// Speaker that blocks until released or stopped
pub struct GatedSpeaker {
    release: Mutex<mpsc::Receiver<Result<(), PlaybackError>>>,
    stopper: Mutex<mpsc::Sender<Result<(), PlaybackError>>>,
    spoken: Mutex<Vec<String>>,
    stops: AtomicUsize,
    arms: AtomicUsize,
}

impl GatedSpeaker {
    pub fn new() -> (Arc<Self>, mpsc::Sender<Result<(), PlaybackError>>) {
        let (tx, rx) = mpsc::channel();
        let speaker = Arc::new(Self {
            release: Mutex::new(rx),
            stopper: Mutex::new(tx.clone()),
            spoken: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            arms: AtomicUsize::new(0),
        });
        (speaker, tx)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn arms(&self) -> usize {
        self.arms.load(Ordering::SeqCst)
    }
}

impl PlaybackDevice for GatedSpeaker {
    fn name(&self) -> &str {
        "gated-speaker"
    }

    fn speak(&self, text: &str) -> Result<(), PlaybackError> {
        self.spoken.lock().push(text.to_string());
        self.release
            .lock()
            .recv()
            .unwrap_or_else(|_| Err(PlaybackError::Failed("test ended".into())))
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        let _ = self.stopper.lock().send(Ok(()));
    }

    fn arm(&self) {
        self.arms.fetch_add(1, Ordering::SeqCst);
    }
}

/// Speaker that finishes immediately
pub struct InstantSpeaker;

impl PlaybackDevice for InstantSpeaker {
    fn name(&self) -> &str {
        "instant-speaker"
    }

    fn speak(&self, _text: &str) -> Result<(), PlaybackError> {
        Ok(())
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// What one rendered frame showed
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub state: InteractionState,
    pub status: String,
    pub error_message: Option<String>,
    pub history: Vec<String>,
    pub input: String,
    pub cursor: usize,
    pub reveal: Option<usize>,
    pub notice: Option<String>,
    pub waveform_flat: bool,
    pub blink: bool,
    pub eyes: EyeShape,
    pub mouth: MouthShape,
    pub footer: String,
    pub boot: bool,
}

/// Keeps every frame it is asked to draw
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Frame>,
}

impl RecordingRenderer {
    pub fn last(&self) -> &Frame {
        self.frames.last().expect("nothing rendered yet")
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, view: &ViewModel<'_>) {
        self.frames.push(Frame {
            state: view.state,
            status: view.status_text(),
            error_message: view.error_message.map(str::to_string),
            history: view
                .history
                .iter()
                .map(|e| format!("{}: {}", e.role.prefix(), e.text))
                .collect(),
            input: view.input.text(),
            cursor: view.input.cursor(),
            reveal: view.reveal,
            notice: view.notice.map(str::to_string),
            waveform_flat: view.animation.is_waveform_flat(),
            blink: view.animation.blink,
            eyes: view.animation.eyes,
            mouth: view.animation.mouth,
            footer: view.footer_text(),
            boot: view.boot.is_some(),
        });
    }
}

// =============================================================================
// Driving
// =============================================================================

pub type TestSession = SessionCoordinator<ScriptedSource, RecordingRenderer>;

pub fn settings() -> UiSettings {
    UiSettings {
        stream_text: false,
        boot_sequence: false,
        ..UiSettings::default()
    }
}

pub fn session(
    settings: &UiSettings,
    backend: Arc<dyn ModelBackend>,
    speaker: Arc<dyn PlaybackDevice>,
) -> TestSession {
    SessionCoordinator::new(
        settings,
        ScriptedSource::default(),
        RecordingRenderer::default(),
        backend,
        speaker,
        Handle::current(),
    )
}

/// Queue `bytes` and run one tick
pub fn type_and_tick(session: &mut TestSession, bytes: &[u8]) -> TickOutcome {
    session.source_mut().push(bytes);
    session.tick()
}

/// Tick until `done` holds, yielding to the runtime in between
pub async fn tick_until(session: &mut TestSession, mut done: impl FnMut(&TestSession) -> bool) {
    for _ in 0..2_000 {
        session.tick();
        if done(session) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition never reached; state = {}", session.state());
}

/// Tick a few times with short pauses, for "nothing should happen" checks
pub async fn settle(session: &mut TestSession) {
    for _ in 0..20 {
        session.tick();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
