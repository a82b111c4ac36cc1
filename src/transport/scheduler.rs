//! Cooperative delivery queue.
//!
//! Every deferred effect in the crate (handshake outcome, message delivery,
//! close completion) is a task on one FIFO queue. Scheduling never blocks and
//! never runs the task inline, so a constructor or `send` always returns
//! before its effect is observable.
//!
//! There is no background worker. The queue is drained by whoever awaits
//! [`Scheduler::flush`] or [`Scheduler::settle`], so tasks never run in
//! parallel with the code that scheduled them, whatever the runtime flavor.
//!
//! # Turns
//!
//! ```text
//!  schedule(a) ─┐
//!  schedule(b) ─┼─► [ a | b ] ──► flush() runs a, b; tasks they schedule wait
//!  flush()     ─┘                 for the next turn
//! ```
//!
//! [`Scheduler::flush`] runs everything queued before the call (one turn).
//! Tasks scheduled by those tasks land in the next turn; use
//! [`Scheduler::settle`] to run turns until the queue is empty.
//!
//! A panicking task is logged and dropped; the rest of the turn still runs.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

// ============================================================================
// Types
// ============================================================================

/// A deferred unit of work.
type Task = Box<dyn FnOnce() + Send + 'static>;

/// Both ends of the task queue.
struct SchedulerInner {
    /// Producer side, used by `schedule`.
    task_tx: mpsc::UnboundedSender<Task>,
    /// Consumer side, drained by `flush`.
    task_rx: Mutex<mpsc::UnboundedReceiver<Task>>,
}

// ============================================================================
// Scheduler
// ============================================================================

/// Caller-drained FIFO task queue.
///
/// Cloning is cheap; all clones share the same queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(SchedulerInner {
                task_tx,
                task_rx: Mutex::new(task_rx),
            }),
        }
    }

    /// Queues `task` behind everything already scheduled.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.task_tx.send(Box::new(task)).is_err() {
            warn!("Scheduler queue closed, task dropped");
        }
    }

    /// Returns the number of queued tasks.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.task_rx.lock().len()
    }

    /// Runs every task scheduled before this call (one turn).
    ///
    /// Yields to the runtime first, so other tokio tasks get to run between
    /// turns.
    pub async fn flush(&self) {
        tokio::task::yield_now().await;

        let turn = self.pending();
        for _ in 0..turn {
            // Lock released before the task runs, so it may schedule more.
            let Some(task) = self.next_task() else {
                break;
            };
            run_guarded("deferred task", task);
        }

        trace!(tasks = turn, "Turn finished");
    }

    /// Runs turns until the queue is empty, including tasks scheduled by
    /// tasks.
    ///
    /// Never returns if tasks keep rescheduling themselves.
    pub async fn settle(&self) {
        loop {
            self.flush().await;
            if self.pending() == 0 {
                break;
            }
        }
    }

    fn next_task(&self) -> Option<Task> {
        self.inner.task_rx.lock().try_recv().ok()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Panic Guard
// ============================================================================

/// Runs `f`, logging and swallowing a panic.
///
/// Returns `None` if `f` panicked.
pub(crate) fn run_guarded<R>(what: &str, f: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(panic) => {
            error!(what, panic = %panic_message(panic.as_ref()), "Callback panicked");
            None
        }
    }
}

/// Extracts the message from a panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

// ============================================================================
// Tests
// ============================================================================
