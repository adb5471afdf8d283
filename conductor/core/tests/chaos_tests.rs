//! Chaos Tests for the Tick Loop
//!
//! Seeded random keystroke storms and flaky collaborators. Whatever happens,
//! the loop must keep these invariants after every tick:
//! - every recorded transition is a row of the transition table
//! - an operation is pending exactly when the state is busy
//! - the line buffer stays within capacity with the cursor in bounds
//!
//! Seeds are fixed, so a failure reproduces exactly.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::*;
use neurallink_conductor::backend::{BackendError, ModelBackend};
use neurallink_conductor::config::UiSettings;
use neurallink_conductor::input::InputReader;
use neurallink_conductor::playback::{PlaybackDevice, PlaybackError};
use neurallink_conductor::{InteractionState, TickOutcome};

// =============================================================================
// Chaos Test Infrastructure
// =============================================================================

/// Fails every `every`-th call
struct FlakyBackend {
    calls: AtomicUsize,
    every: usize,
}

impl ModelBackend for FlakyBackend {
    fn name(&self) -> &str {
        "flaky-model"
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        std::thread::sleep(Duration::from_millis(1));
        if n % self.every == 0 {
            Err(BackendError::EmptyResponse)
        } else {
            Ok(format!("ok {prompt}"))
        }
    }
}

/// Fails every `every`-th call
struct FlakySpeaker {
    calls: AtomicUsize,
    every: usize,
}

impl PlaybackDevice for FlakySpeaker {
    fn name(&self) -> &str {
        "flaky-speaker"
    }

    fn speak(&self, _text: &str) -> Result<(), PlaybackError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        std::thread::sleep(Duration::from_millis(1));
        if n % self.every == 0 {
            Err(PlaybackError::DeviceNotFound("Kontor".into()))
        } else {
            Ok(())
        }
    }
}

fn flaky_session(settings: &UiSettings) -> TestSession {
    session(
        settings,
        Arc::new(FlakyBackend {
            calls: AtomicUsize::new(0),
            every: 3,
        }),
        Arc::new(FlakySpeaker {
            calls: AtomicUsize::new(0),
            every: 4,
        }),
    )
}

fn is_table_row(from: InteractionState, to: InteractionState, event: &str) -> bool {
    use InteractionState::{Failed, Generating, Idle, Playing};
    matches!(
        (from, event, to),
        (_, "interrupt", Idle)
            | (Idle, "submit", Generating)
            | (Generating, "generation_succeeded", Playing)
            | (Generating, "generation_failed", Failed)
            | (Playing, "playback_finished", Idle)
            | (Playing, "playback_failed", Failed)
            | (Failed, "recovery_elapsed", Idle)
    )
}

fn assert_invariants(s: &TestSession) {
    for t in s.machine().transitions() {
        assert!(
            is_table_row(t.from, t.to, t.event),
            "illegal transition {} -{}-> {}",
            t.from,
            t.event,
            t.to
        );
    }
    assert_eq!(
        s.state().is_busy(),
        !s.runner().is_idle(),
        "pending operation out of step with state {}",
        s.state()
    );
    assert!(s.input().len() <= s.input().capacity());
    assert!(s.input().cursor() <= s.input().len());
    assert!(s.history().len() <= s.history().capacity());
}

const KEYS: [&[u8]; 12] = [
    b"a",
    b"hi ",
    b"\xc3\xa4",
    b"\r",
    b"\r",
    b"\x7f",
    ARROW_UP,
    ARROW_DOWN,
    ARROW_LEFT,
    b"\x1b[C",
    b"\x1b",
    CTRL_C,
];

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn chaos_random_keystrokes_keep_invariants() {
    let settings = UiSettings {
        max_input: 16,
        max_history: 6,
        recovery_delay: Duration::from_millis(20),
        ..settings()
    };

    for seed in 0..4u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut s = flaky_session(&settings);

        for _ in 0..400 {
            if rng.gen_bool(0.1) {
                let junk: Vec<u8> = (0..rng.gen_range(1..4)).map(|_| rng.gen()).collect();
                s.source_mut().push(&junk);
            } else {
                s.source_mut().push(KEYS[rng.gen_range(0..KEYS.len())]);
            }

            if s.tick() == TickOutcome::Shutdown {
                assert!(s.runner().is_idle());
                s = flaky_session(&settings);
                continue;
            }
            assert_invariants(&s);
            if rng.gen_bool(0.3) {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn chaos_flaky_collaborators_always_recover() {
    let settings = UiSettings {
        recovery_delay: Duration::from_millis(10),
        ..settings()
    };
    let mut s = flaky_session(&settings);

    for i in 0..12 {
        type_and_tick(&mut s, format!("prompt {i}\r").as_bytes());
        assert_invariants(&s);
        tick_until(&mut s, |s| {
            assert_invariants(s);
            s.state() == InteractionState::Idle
        })
        .await;
    }

    let failures = s
        .machine()
        .transitions()
        .filter(|t| t.to == InteractionState::Failed)
        .count();
    assert!(failures > 0, "flaky collaborators never failed");
    assert_eq!(s.machine().failure_reason(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn chaos_interrupt_storm_never_leaks_operations() {
    let (backend, replies) = GatedBackend::new();
    let (speaker, playback) = GatedSpeaker::new();
    let mut s = session(&settings(), backend, speaker);

    for i in 0..20 {
        type_and_tick(&mut s, format!("p{i}\r").as_bytes());
        assert_eq!(s.state(), InteractionState::Generating);
        type_and_tick(&mut s, CTRL_C);
        assert_invariants(&s);
        // Break the Ctrl-C streak so the next one interrupts again.
        type_and_tick(&mut s, b" ");
        type_and_tick(&mut s, b"\x7f");
    }
    assert_eq!(s.runner().discarded(), 20);

    // Release every abandoned call; none of them may land.
    for _ in 0..20 {
        replies.send(Ok("late".into())).unwrap();
        let _ = playback.send(Ok(()));
    }
    settle(&mut s).await;
    assert_eq!(s.state(), InteractionState::Idle);
    assert!(s.history().iter().all(|e| e.text != "late"));
}

#[test]
fn chaos_empty_polls_return_immediately() {
    let mut reader = InputReader::new(ScriptedSource::default(), Duration::from_millis(20));
    let start = Instant::now();
    for _ in 0..100_000 {
        assert_eq!(reader.poll(), None);
    }
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(reader.source_mut().reads(), 100_000);
    assert!(!reader.shutdown_requested());
}
