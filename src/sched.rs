//! Background task scheduling
//!
//! One-shot and recurring tasks run on the tokio runtime and all observe a
//! shared shutdown broadcast, so daemon exit never leaves timers behind.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;

/// Spawns delayed and recurring tasks tied to a shared shutdown signal
#[derive(Clone)]
pub struct Scheduler {
    shutdown: broadcast::Sender<()>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a new scheduler
    #[must_use]
    pub fn new() -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self { shutdown }
    }

    /// Run a future once after a delay, unless shutdown fires first
    pub fn spawn_after<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::debug!(?delay, "delayed task cancelled by shutdown");
                }
                () = tokio::time::sleep(delay) => {
                    task.await;
                }
            }
        });
    }

    /// Run a closure repeatedly at a fixed interval until shutdown
    pub fn spawn_every<F, Fut>(&self, interval: Duration, mut task: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so the task
            // first runs a full interval from now
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::debug!(?interval, "recurring task stopped by shutdown");
                        break;
                    }
                    _ = ticker.tick() => {
                        task().await;
                    }
                }
            }
        });
    }

    /// Signal every spawned task to stop
    pub fn shutdown(&self) {
        // Err means no live subscribers, which is fine at shutdown
        let _ = self.shutdown.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spawn_after_fires() {
        let sched = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        sched.spawn_after(Duration::from_millis(10), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending() {
        let sched = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        sched.spawn_after(Duration::from_secs(60), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        sched.shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_spawn_every_repeats() {
        let sched = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        sched.spawn_every(Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        sched.shutdown();
        assert!(fired.load(Ordering::SeqCst) >= 2);
    }
}
