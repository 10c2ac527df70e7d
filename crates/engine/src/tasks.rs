//! Cancellable periodic tasks.
//!
//! Every polling interval the engine starts is owned by the component
//! whose lifetime bounds it: the session manager owns reconciliation, the
//! engine facade owns the maintenance probe. Dropping the owner (or
//! replacing the task) aborts the loop, so a session that ends can never
//! leave an orphaned interval behind.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// A periodic background task, aborted on drop.
#[derive(Debug)]
pub struct PollTask {
    label: &'static str,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Spawn a loop that runs `tick` immediately and then once per
    /// `period`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(label: &'static str, period: Duration, tick: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        debug!(task = label, period_secs = period.as_secs(), "starting poll task");
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // The first tick completes immediately.
                interval.tick().await;
                tick().await;
            }
        });
        Self { label, handle }
    }

    /// The task's display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Whether the underlying task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel explicitly. Equivalent to dropping the task.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        debug!(task = self.label, "cancelling poll task");
        self.handle.abort();
    }
}
