//! Delayed tasks with cancellation.
//!
//! [`Scheduler`] runs a future after a delay on the tokio runtime it was
//! created on. Only the delay can be cancelled: once it elapses the future
//! is spawned on its own and runs to completion. [`Debouncer`] keeps at most
//! one delay pending. Every restart aborts the previous delay, so only the
//! last call within the delay ever runs.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::AbortHandle;

/// A pending delayed task.
#[derive(Debug)]
pub struct TimerHandle {
    id: u64,
    abort: AbortHandle,
}

impl TimerHandle {
    /// Sequence number, unique per scheduler.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Whether the delay elapsed (the task was handed off) or was aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Spawns delayed tasks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct Scheduler {
    runtime: Handle,
    next_id: u64,
}

impl Scheduler {
    #[must_use]
    pub const fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: 0,
        }
    }

    /// Scheduler for the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// Run `task` once `delay` has elapsed.
    ///
    /// The task is spawned detached when the delay ends, so cancelling the
    /// returned handle afterwards does not interrupt it.
    pub fn schedule<F>(&mut self, delay: Duration, task: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.next_id += 1;
        let id = self.next_id;

        let runtime = self.runtime.clone();
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::trace!(timer_id = id, "timer fired");
            drop(runtime.spawn(task));
        });

        tracing::trace!(timer_id = id, ?delay, "timer scheduled");

        TimerHandle {
            id,
            abort: join.abort_handle(),
        }
    }

    /// Abort a pending task while it is still waiting out its delay. Once
    /// the delay has elapsed the task runs regardless.
    pub fn cancel(&self, handle: TimerHandle) {
        if !handle.is_finished() {
            tracing::trace!(timer_id = handle.id, "timer cancelled");
        }
        handle.abort.abort();
    }
}

/// Keeps at most one delayed task pending.
#[derive(Debug)]
pub struct Debouncer {
    scheduler: Scheduler,
    delay: Duration,
    pending: Option<TimerHandle>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(scheduler: Scheduler, delay: Duration) -> Self {
        Self {
            scheduler,
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any pending task and schedule `task` after the delay. A task
    /// whose delay already elapsed keeps running.
    pub fn restart<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(self.scheduler.schedule(self.delay, task));
    }

    /// Cancel the pending task, if it has not fired yet.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Whether a task is waiting out its delay.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
