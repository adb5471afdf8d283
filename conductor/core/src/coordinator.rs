//! Session Coordinator - the cooperative tick loop
//!
//! Ties the input reader, animation clock, task runner and state machine
//! together. The binary calls [`SessionCoordinator::tick`] from an interval
//! timer; nothing inside a tick waits.
//!
//! # Tick Order
//!
//! ```text
//!   1. clock      advance the frame counter; end the boot intro when due
//!   2. input      fold keystrokes into the line; Enter in Idle submits
//!   3. generation Generating: take the model result if it landed
//!   4. playback   Playing: take the playback result if it landed
//!   5. recovery   Failed: return to Idle once the dwell delay passed
//!   6. render     derive visuals from (frame, current state) and draw
//! ```
//!
//! Steps 2-5 may change state; step 6 always sees the result, so a frame is
//! never one tick behind.

use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;

use crate::animation::{
    AnimationClock, AnimationParams, BootFrame, BootSequence, Reveal, RevealTiming,
};
use crate::backend::ModelBackend;
use crate::config::UiSettings;
use crate::input::{ByteSource, InputEvent, InputLineBuffer, InputReader, PromptRecall};
use crate::playback::PlaybackDevice;
use crate::session::{ConversationHistory, Role};
use crate::state::{InteractionState, StateEvent, StateMachine};
use crate::tasks::{OperationTag, TaskHandle, TaskRunner};
use crate::view::{Renderer, ViewModel};

/// Keystrokes handled per tick; the rest wait for the next one.
/// At 20 fps a pasted prompt of 10,000 characters lands within a second.
const MAX_EVENTS_PER_TICK: usize = 1024;

/// Prompts that end the session instead of reaching the model
const EXIT_COMMANDS: [&str; 4] = ["exit", "quit", "/exit", "/quit"];

/// Whether `prompt` asks to leave
#[must_use]
pub fn is_exit_command(prompt: &str) -> bool {
    let prompt = prompt.trim().to_lowercase();
    EXIT_COMMANDS.contains(&prompt.as_str())
}

/// What the caller should do after a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking
    Continue,
    /// The operator asked to leave; restore the terminal and exit
    Shutdown,
}

/// Owns every piece of per-session state and advances it one tick at a time
pub struct SessionCoordinator<S, R> {
    machine: StateMachine,
    runner: TaskRunner,
    clock: AnimationClock,
    reader: InputReader<S>,
    line: InputLineBuffer,
    recall: PromptRecall,
    history: ConversationHistory,
    renderer: R,
    backend: Arc<dyn ModelBackend>,
    speaker: Arc<dyn PlaybackDevice>,
    /// Handle of the operation belonging to the current state
    active: Option<TaskHandle>,
    reveal: Option<Reveal>,
    reveal_timing: RevealTiming,
    stream_text: bool,
    notice: Option<String>,
    /// Boot intro schedule, dropped once it has played
    boot: Option<BootSequence>,
    /// Intro contents for the current tick
    boot_frame: Option<BootFrame>,
    /// Set by exit keys and commands; acted on at the end of step 2
    quit_requested: bool,
    shutting_down: bool,
}

impl<S: ByteSource, R: Renderer> SessionCoordinator<S, R> {
    /// Assemble a session from its settings and collaborators
    pub fn new(
        settings: &UiSettings,
        source: S,
        renderer: R,
        backend: Arc<dyn ModelBackend>,
        speaker: Arc<dyn PlaybackDevice>,
        runtime: Handle,
    ) -> Self {
        Self {
            machine: StateMachine::new(settings.recovery_delay),
            runner: TaskRunner::new(runtime),
            clock: AnimationClock::new(settings.tick_rate),
            reader: InputReader::new(source, settings.escape_timeout),
            line: InputLineBuffer::new(settings.max_input),
            recall: PromptRecall::new(),
            history: ConversationHistory::new(settings.max_history),
            renderer,
            backend,
            speaker,
            active: None,
            reveal: None,
            reveal_timing: RevealTiming::default(),
            stream_text: settings.stream_text,
            notice: None,
            boot: settings
                .boot_sequence
                .then(|| BootSequence::new(settings.tick_rate)),
            boot_frame: None,
            quit_requested: false,
            shutting_down: false,
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Run one tick now
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    /// Run one tick as if it were `now`
    pub fn tick_at(&mut self, now: Instant) -> TickOutcome {
        if self.shutting_down {
            return TickOutcome::Shutdown;
        }

        let frame = self.clock.tick();
        self.advance_boot(frame);
        self.process_input(now);
        if self.quit_requested {
            self.shutdown();
            return TickOutcome::Shutdown;
        }
        self.poll_generation(now);
        self.poll_playback(now);
        self.poll_recovery(now);
        self.render(frame, now);
        TickOutcome::Continue
    }

    /// Abandon in-flight work and stop the speaker. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if self.machine.current() == InteractionState::Playing {
            self.speaker.stop();
        }
        if self.runner.discard().is_some() {
            tracing::info!("abandoned in-flight operation on shutdown");
        }
        self.active = None;
        if !self.shutting_down {
            tracing::info!(entries = self.history.len(), "session ending");
            self.shutting_down = true;
        }
    }

    fn advance_boot(&mut self, frame: u64) {
        let Some(boot) = self.boot else {
            return;
        };
        self.boot_frame = boot.at(frame);
        if self.boot_frame.is_none() {
            tracing::debug!(frame, "boot intro finished");
            self.boot = None;
        }
    }

    // ========================================================================
    // Step 2: input
    // ========================================================================

    fn process_input(&mut self, now: Instant) {
        for _ in 0..MAX_EVENTS_PER_TICK {
            let Some(event) = self.reader.poll_at(now) else {
                return;
            };
            self.handle_key(event, now);
            if self.quit_requested {
                return;
            }
        }
    }

    fn handle_key(&mut self, event: InputEvent, now: Instant) {
        if event.is_editing() {
            self.notice = None;
        }
        match event {
            InputEvent::Char(ch) => {
                self.recall.reset();
                self.line.insert(ch);
            }
            InputEvent::Backspace => {
                self.recall.reset();
                self.line.backspace();
            }
            InputEvent::ArrowLeft => self.line.move_left(),
            InputEvent::ArrowRight => self.line.move_right(),
            InputEvent::ArrowUp => {
                if let Some(prompt) = self.recall.older() {
                    self.line.set_text(prompt);
                }
            }
            InputEvent::ArrowDown => {
                if self.recall.is_browsing() {
                    match self.recall.newer() {
                        Some(prompt) => self.line.set_text(prompt),
                        None => self.line.clear(),
                    }
                }
            }
            InputEvent::Enter => self.submit(now),
            InputEvent::CtrlC => {
                if self.reader.shutdown_requested() {
                    tracing::info!("second Ctrl-C, shutting down");
                    self.quit_requested = true;
                } else {
                    self.interrupt(now);
                }
            }
            InputEvent::CtrlD => {
                tracing::info!("end of input, shutting down");
                self.quit_requested = true;
            }
            InputEvent::Unknown(bytes) => {
                tracing::debug!(?bytes, "ignoring unrecognised key sequence");
            }
        }
    }

    fn submit(&mut self, now: Instant) {
        if self.boot_frame.is_some() {
            tracing::debug!("enter ignored during boot intro");
            return;
        }
        let state = self.machine.current();
        if state != InteractionState::Idle {
            tracing::debug!(%state, "enter ignored while busy");
            return;
        }
        if self.line.text().trim().is_empty() {
            return;
        }
        let raw = self.line.take();
        let prompt = raw.trim().to_string();
        if is_exit_command(&prompt) {
            tracing::info!(command = %prompt, "exit command");
            self.quit_requested = true;
            return;
        }

        if self
            .machine
            .transition_at(StateEvent::Submit { prompt: prompt.clone() }, now)
            .is_err()
        {
            self.line.set_text(&raw);
            return;
        }
        self.recall.record(&prompt);
        self.notice = None;
        self.history.push(Role::User, prompt.as_str());

        let backend = Arc::clone(&self.backend);
        self.dispatch(OperationTag::Generation, prompt, now, move |prompt| {
            backend.generate(&prompt).map_err(|e| {
                tracing::warn!(error = %e, "generation failed");
                e.user_message()
            })
        });
    }

    fn interrupt(&mut self, now: Instant) {
        let state = self.machine.current();
        if state == InteractionState::Idle {
            self.notice = Some("Press Ctrl-C again to quit".into());
            return;
        }

        if let Some(handle) = self.runner.discard() {
            tracing::info!(id = handle.id(), tag = %handle.tag(), "interrupting operation");
        }
        self.active = None;
        if state == InteractionState::Playing {
            self.speaker.stop();
        }
        self.reveal = None;
        // Interrupt is accepted in every state.
        let _ = self.machine.transition_at(StateEvent::Interrupt, now);
        self.notice = Some(format!("{state} interrupted · Ctrl-C again to quit"));
    }

    // ========================================================================
    // Steps 3-5: background results and recovery
    // ========================================================================

    fn poll_generation(&mut self, now: Instant) {
        if self.machine.current() != InteractionState::Generating {
            return;
        }
        let Some(outcome) = self.take_active() else {
            return;
        };

        match outcome {
            Ok(text) => {
                let event = StateEvent::GenerationSucceeded { text: text.clone() };
                if self.machine.transition_at(event, now).is_err() {
                    return;
                }
                self.history.push(Role::Assistant, text.as_str());
                self.reveal = self
                    .stream_text
                    .then(|| Reveal::start(&text, &self.reveal_timing, now));

                self.speaker.arm();
                let speaker = Arc::clone(&self.speaker);
                self.dispatch(OperationTag::Playback, text, now, move |text| {
                    speaker.speak(&text).map(|()| text).map_err(|e| {
                        tracing::warn!(error = %e, "playback failed");
                        e.user_message()
                    })
                });
            }
            Err(reason) => self.fail(StateEvent::GenerationFailed { reason }, now),
        }
    }

    fn poll_playback(&mut self, now: Instant) {
        if self.machine.current() != InteractionState::Playing {
            return;
        }
        let Some(outcome) = self.take_active() else {
            return;
        };

        self.reveal = None;
        match outcome {
            Ok(_) => {
                let _ = self.machine.transition_at(StateEvent::PlaybackFinished, now);
            }
            Err(reason) => self.fail(StateEvent::PlaybackFailed { reason }, now),
        }
    }

    fn poll_recovery(&mut self, now: Instant) {
        if self.machine.recovery_due(now) {
            let _ = self.machine.transition_at(StateEvent::RecoveryElapsed, now);
        }
    }

    fn take_active(&mut self) -> Option<Result<String, String>> {
        let handle = self.active?;
        let outcome = self.runner.try_take(handle)?;
        self.active = None;
        Some(outcome)
    }

    fn fail(&mut self, event: StateEvent, now: Instant) {
        let reason = match &event {
            StateEvent::GenerationFailed { reason } | StateEvent::PlaybackFailed { reason } => {
                reason.clone()
            }
            _ => return,
        };
        if self.machine.transition_at(event, now).is_ok() {
            self.history.push(Role::SystemError, reason);
        }
    }

    fn dispatch<F>(&mut self, tag: OperationTag, input: String, now: Instant, work: F)
    where
        F: FnOnce(String) -> Result<String, String> + Send + 'static,
    {
        debug_assert!(
            self.runner.is_idle(),
            "{tag} dispatched while another operation is pending"
        );
        match self.runner.submit(tag, input, work) {
            Ok(handle) => self.active = Some(handle),
            Err(e) => {
                tracing::error!(error = %e, %tag, "dispatch refused, rolling back");
                self.reveal = None;
                let _ = self.machine.transition_at(StateEvent::Interrupt, now);
            }
        }
    }

    // ========================================================================
    // Step 6: render
    // ========================================================================

    fn render(&mut self, frame: u64, now: Instant) {
        let state = self.machine.current();
        let reveal = match (&self.reveal, state) {
            (Some(reveal), InteractionState::Playing) => {
                let shown = reveal.visible_chars(now);
                (shown < reveal.total_chars()).then_some(shown)
            }
            _ => None,
        };

        let view = ViewModel {
            state,
            history: &self.history,
            input: &self.line,
            animation: AnimationParams::derive(frame, state),
            error_message: self.machine.failure_reason(),
            reveal,
            notice: self.notice.as_deref(),
            time_in_state: self.machine.time_in_state(now),
            model: self.backend.name(),
            device: self.speaker.name(),
            boot: self.boot_frame,
        };
        self.renderer.render(&view);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current interaction state
    #[must_use]
    pub fn state(&self) -> InteractionState {
        self.machine.current()
    }

    /// The state machine (transition log, failure reason)
    #[must_use]
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// The task runner
    #[must_use]
    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// Conversation so far
    #[must_use]
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Line being edited
    #[must_use]
    pub fn input(&self) -> &InputLineBuffer {
        &self.line
    }

    /// Frames rendered so far
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.clock.frame()
    }

    /// Current one-off notice
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Whether the boot intro is still playing
    #[must_use]
    pub fn is_booting(&self) -> bool {
        self.boot_frame.is_some()
    }

    /// Whether the session has been asked to end
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// The renderer
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// The input source, mutably (tests feed bytes through it)
    pub fn source_mut(&mut self) -> &mut S {
        self.reader.source_mut()
    }
}
