//! Fire-and-forget side-effect runner.
//!
//! Dataset appends, keyboard expiry, and other work that must never block
//! message handling runs here as detached tasks, with bounded concurrency.
//! `flush` exists so tests can await everything in flight deterministically.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::warn;

pub struct SideEffects {
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
}

impl SideEffects {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            tracker: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(max_concurrency)),
        }
    }

    /// Spawn a detached task. The concurrency permit is taken inside the
    /// task so the caller never waits.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.tracker.spawn(async move {
            match permits.acquire_owned().await {
                Ok(_permit) => task.await,
                // Semaphore is never closed; log and drop if it somehow is.
                Err(_) => warn!("side-effect permit unavailable, task dropped"),
            }
        });
    }

    /// Wait for every spawned task to finish, then accept new work again.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Close and drain on shutdown.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Default for SideEffects {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_flush_waits_for_spawned_tasks() {
        let effects = SideEffects::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            effects.spawn(async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        effects.flush().await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_spawn_works_after_flush() {
        let effects = SideEffects::new(1);
        let counter = Arc::new(AtomicUsize::new(0));

        effects.flush().await;

        let c = Arc::clone(&counter);
        effects.spawn(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        effects.flush().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
