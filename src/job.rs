//! The job limiter bounds concurrent command execution — not hashing, not
//! cache lookups, not filesystem traffic, just the number of child processes
//! in flight at once. A fair FIFO semaphore: acquiring a permit always
//! defers at least one scheduler turn, so a burst of ready tasks is seen to
//! queue rather than some subset racing straight through.

use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Clone)]
pub struct JobLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl JobLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// `JOBS = CPU_COUNT + 1` by default, matching the teacher's use of
    /// `num_cpus` for concurrency defaults elsewhere.
    pub fn default_capacity() -> usize {
        num_cpus::get() + 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Acquire a permit, yielding to the scheduler first so that a wave of
    /// simultaneously-ready tasks queues up FIFO instead of a lucky subset
    /// acquiring the semaphore inline before the rest even poll.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        tokio::task::yield_now().await;
        self.semaphore
            .acquire()
            .await
            .expect("job limiter semaphore is never closed")
    }
}
