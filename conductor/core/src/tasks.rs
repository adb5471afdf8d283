//! Background Task Handoff
//!
//! Model inference and speech playback block for seconds. The render loop must
//! not, so those calls run on the runtime's blocking pool and hand their result
//! back through a one-shot slot that the loop polls once per tick.
//!
//! # Design Philosophy
//!
//! The runner tracks at most one [`PendingOperation`]. Interrupting does not
//! stop the blocking call (there is no safe way to), it only drops the
//! receiving half of the slot so the late result is thrown away when it lands.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Outcome written into a completion slot: value or human-readable reason
pub type TaskOutcome = Result<String, String>;

/// Which kind of work a pending operation is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationTag {
    /// Model inference
    Generation,
    /// Speech playback
    Playback,
}

impl OperationTag {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Playback => "playback",
        }
    }
}

impl std::fmt::Display for OperationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ticket for a submitted operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    id: u64,
    tag: OperationTag,
}

impl TaskHandle {
    /// Monotonic id assigned at submission
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Kind of work
    #[must_use]
    pub fn tag(&self) -> OperationTag {
        self.tag
    }
}

/// Submission refused
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Another operation has not been consumed yet
    #[error("a {0} operation is already in flight")]
    AlreadyRunning(OperationTag),
}

/// Work handed to the blocking pool and not yet consumed
#[derive(Debug)]
pub struct PendingOperation {
    handle: TaskHandle,
    input: String,
    submitted_at: Instant,
    slot: oneshot::Receiver<TaskOutcome>,
}

impl PendingOperation {
    /// Handle returned by `submit`
    #[must_use]
    pub fn handle(&self) -> TaskHandle {
        self.handle
    }

    /// Text the operation was started with
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Submission time
    #[must_use]
    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }
}

/// Runs one blocking operation at a time off the render path
#[derive(Debug)]
pub struct TaskRunner {
    runtime: Handle,
    pending: Option<PendingOperation>,
    next_id: u64,
    discarded: u64,
}

impl TaskRunner {
    /// Create a runner that spawns onto `runtime`'s blocking pool
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: None,
            next_id: 1,
            discarded: 0,
        }
    }

    /// Start `blocking_fn(input)` on the blocking pool.
    ///
    /// The outcome lands in the handle's slot exactly once. A collaborator that
    /// panics closes the slot instead, which [`try_take`](Self::try_take)
    /// reports as an `Err`.
    pub fn submit<F>(
        &mut self,
        tag: OperationTag,
        input: impl Into<String>,
        blocking_fn: F,
    ) -> Result<TaskHandle, TaskError>
    where
        F: FnOnce(String) -> TaskOutcome + Send + 'static,
    {
        if let Some(pending) = &self.pending {
            return Err(TaskError::AlreadyRunning(pending.handle.tag));
        }

        let handle = TaskHandle {
            id: self.next_id,
            tag,
        };
        self.next_id += 1;

        let input = input.into();
        let arg = input.clone();
        let (tx, rx) = oneshot::channel();
        self.runtime.spawn_blocking(move || {
            let outcome = blocking_fn(arg);
            if tx.send(outcome).is_err() {
                tracing::debug!(id = handle.id, %tag, "result arrived after discard");
            }
        });

        tracing::debug!(id = handle.id, %tag, "operation submitted");
        self.pending = Some(PendingOperation {
            handle,
            input,
            submitted_at: Instant::now(),
            slot: rx,
        });
        Ok(handle)
    }

    /// Take the result for `handle` if it has landed. Never waits.
    ///
    /// Returns `None` while the work is still running, and for any handle that
    /// is not the current pending one (including discarded handles).
    pub fn try_take(&mut self, handle: TaskHandle) -> Option<TaskOutcome> {
        let pending = self.pending.as_mut()?;
        if pending.handle != handle {
            return None;
        }

        let outcome = match pending.slot.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => {
                tracing::error!(id = handle.id, tag = %handle.tag, "operation ended without a result");
                Err(format!("{} task ended unexpectedly", handle.tag))
            }
        };
        self.pending = None;
        Some(outcome)
    }

    /// Forget the pending operation; its result will be dropped when it lands
    pub fn discard(&mut self) -> Option<TaskHandle> {
        let pending = self.pending.take()?;
        self.discarded += 1;
        tracing::info!(
            id = pending.handle.id,
            tag = %pending.handle.tag,
            elapsed_ms = pending.submitted_at.elapsed().as_millis() as u64,
            "pending operation discarded"
        );
        Some(pending.handle)
    }

    /// The pending operation, if any
    #[must_use]
    pub fn pending(&self) -> Option<&PendingOperation> {
        self.pending.as_ref()
    }

    /// Whether nothing is in flight
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Number of operations abandoned by [`discard`](Self::discard)
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}
