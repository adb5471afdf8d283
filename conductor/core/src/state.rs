//! Interaction State Machine
//!
//! The single owner of "what is the terminal doing right now". Every change of
//! [`InteractionState`] goes through [`StateMachine::transition_at`], which
//! consults the transition table and either applies the move or rejects the
//! event without side effects.
//!
//! ```text
//!            submit                 generation_succeeded
//!   ┌──────┐ ─────────► ┌────────────┐ ──────────────────► ┌─────────┐
//!   │ Idle │            │ Generating │                     │ Playing │
//!   └──────┘ ◄───────── └────────────┘                     └─────────┘
//!      ▲   playback_finished   │ generation_failed             │
//!      │                       ▼                               │ playback_failed
//!      │ recovery_elapsed ┌────────┐ ◄─────────────────────────┘
//!      └───────────────── │ Failed │
//!                         └────────┘
//!   interrupt: any state ──► Idle
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default dwell time in `Failed` before recovery is allowed
pub const DEFAULT_RECOVERY_DELAY: Duration = Duration::from_secs(5);

/// Number of transitions kept for diagnostics
const TRANSITION_LOG_CAPACITY: usize = 32;

// ============================================================================
// States and events
// ============================================================================

/// What the terminal is currently doing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionState {
    /// Waiting for the operator to submit a prompt
    Idle,
    /// A model request is in flight
    Generating,
    /// The reply is being spoken
    Playing,
    /// The last operation failed; waiting out the recovery delay
    Failed,
}

impl InteractionState {
    /// Short status label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "READY",
            Self::Generating => "PROCESSING",
            Self::Playing => "SPEAKING",
            Self::Failed => "ERROR",
        }
    }

    /// Status glyph shown above the avatar
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Idle => "◇",
            Self::Generating => "◈",
            Self::Playing => "◆",
            Self::Failed => "✗",
        }
    }

    /// Key hint for the footer
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Idle => "Enter send · ↑↓ recall · Ctrl-C twice quit",
            Self::Generating => "Ctrl-C cancel",
            Self::Playing => "Ctrl-C stop",
            Self::Failed => "recovering…",
        }
    }

    /// Whether a background operation belongs to this state
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Generating | Self::Playing)
    }
}

impl std::fmt::Display for InteractionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Generating => "Generating",
            Self::Playing => "Playing",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Inputs to the transition function
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateEvent {
    /// The operator submitted a prompt
    Submit {
        /// Prompt text
        prompt: String,
    },
    /// The model produced a reply
    GenerationSucceeded {
        /// Reply text
        text: String,
    },
    /// The model request failed
    GenerationFailed {
        /// Human-readable reason
        reason: String,
    },
    /// Speech finished
    PlaybackFinished,
    /// Speech failed
    PlaybackFailed {
        /// Human-readable reason
        reason: String,
    },
    /// The recovery delay in `Failed` has passed
    RecoveryElapsed,
    /// The operator cancelled whatever was happening
    Interrupt,
}

impl StateEvent {
    /// Stable event name for logs and error messages
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::GenerationSucceeded { .. } => "generation_succeeded",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::PlaybackFinished => "playback_finished",
            Self::PlaybackFailed { .. } => "playback_failed",
            Self::RecoveryElapsed => "recovery_elapsed",
            Self::Interrupt => "interrupt",
        }
    }
}

/// An event the current state does not accept
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidTransition {
    /// No row of the transition table matches
    #[error("event `{event}` is not accepted in state {from}")]
    NotAccepted {
        /// State at the time of the event
        from: InteractionState,
        /// Rejected event name
        event: &'static str,
    },
    /// `recovery_elapsed` arrived before the dwell delay ran out
    #[error("recovery not due for another {remaining:?}")]
    RecoveryNotDue {
        /// Time left in `Failed`
        remaining: Duration,
    },
}

/// One applied transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionRecord {
    /// State before
    pub from: InteractionState,
    /// State after
    pub to: InteractionState,
    /// Event that caused it
    pub event: &'static str,
    /// When it was applied
    pub at: Instant,
}

#[derive(Clone, Debug)]
struct Failure {
    reason: String,
    at: Instant,
}

// ============================================================================
// StateMachine
// ============================================================================

/// Owns the interaction state and enforces the transition table
#[derive(Debug)]
pub struct StateMachine {
    state: InteractionState,
    entered_at: Instant,
    failure: Option<Failure>,
    recovery_delay: Duration,
    log: VecDeque<TransitionRecord>,
}

impl StateMachine {
    /// Start in `Idle` with the given recovery delay
    #[must_use]
    pub fn new(recovery_delay: Duration) -> Self {
        Self {
            state: InteractionState::Idle,
            entered_at: Instant::now(),
            failure: None,
            recovery_delay,
            log: VecDeque::with_capacity(TRANSITION_LOG_CAPACITY),
        }
    }

    /// Current state
    #[must_use]
    pub fn current(&self) -> InteractionState {
        self.state
    }

    /// Configured dwell time in `Failed`
    #[must_use]
    pub fn recovery_delay(&self) -> Duration {
        self.recovery_delay
    }

    /// Apply `event` now
    pub fn transition(&mut self, event: StateEvent) -> Result<InteractionState, InvalidTransition> {
        self.transition_at(event, Instant::now())
    }

    /// Apply `event` as if it happened at `now`.
    ///
    /// On `Err` nothing changes: no state move, no stored reason, no log record.
    pub fn transition_at(
        &mut self,
        event: StateEvent,
        now: Instant,
    ) -> Result<InteractionState, InvalidTransition> {
        use InteractionState::{Failed, Generating, Idle, Playing};

        let from = self.state;
        let to = match (from, &event) {
            (_, StateEvent::Interrupt) => Idle,
            (Idle, StateEvent::Submit { .. }) => Generating,
            (Generating, StateEvent::GenerationSucceeded { .. }) => Playing,
            (Generating, StateEvent::GenerationFailed { .. }) => Failed,
            (Playing, StateEvent::PlaybackFinished) => Idle,
            (Playing, StateEvent::PlaybackFailed { .. }) => Failed,
            (Failed, StateEvent::RecoveryElapsed) => {
                let remaining = self.recovery_remaining(now);
                if !remaining.is_zero() {
                    tracing::debug!(?remaining, "recovery requested early");
                    return Err(InvalidTransition::RecoveryNotDue { remaining });
                }
                Idle
            }
            (_, other) => {
                let err = InvalidTransition::NotAccepted {
                    from,
                    event: other.name(),
                };
                tracing::warn!(state = %from, event = other.name(), "rejected transition");
                return Err(err);
            }
        };

        let name = event.name();
        match event {
            StateEvent::GenerationFailed { reason } | StateEvent::PlaybackFailed { reason } => {
                self.failure = Some(Failure { reason, at: now });
            }
            _ => self.failure = None,
        }

        if self.log.len() == TRANSITION_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(TransitionRecord {
            from,
            to,
            event: name,
            at: now,
        });

        self.state = to;
        self.entered_at = now;
        tracing::info!(%from, %to, event = name, "state transition");
        Ok(to)
    }

    /// Reason stored on entering `Failed`; `None` in every other state
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.reason.as_str())
    }

    /// Time left before `recovery_elapsed` is accepted (zero outside `Failed`)
    #[must_use]
    pub fn recovery_remaining(&self, now: Instant) -> Duration {
        match (&self.failure, self.state) {
            (Some(failure), InteractionState::Failed) => self
                .recovery_delay
                .saturating_sub(now.saturating_duration_since(failure.at)),
            _ => Duration::ZERO,
        }
    }

    /// Whether a `recovery_elapsed` event would be accepted at `now`
    #[must_use]
    pub fn recovery_due(&self, now: Instant) -> bool {
        self.state == InteractionState::Failed && self.recovery_remaining(now).is_zero()
    }

    /// How long the machine has been in the current state
    #[must_use]
    pub fn time_in_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    /// Recent transitions, oldest first
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.log.iter()
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_RECOVERY_DELAY)
    }
}

// ============================================================================
// Tests
// ============================================================================
