//! Retry scheduler: delays failed tasks, then hands them back to admission.
//!
//! One intake actor plus one lightweight waiter per pending retry. The actor
//! never waits on a backoff itself, so a long delay for one task does not hold
//! up newer retry requests. Waiters live in a `JoinSet` owned by the actor;
//! on shutdown they all observe the same signal and the actor joins them
//! before it exits.

use std::sync::Mutex;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::domain::TaskHandle;
use crate::queue::{QueueReceiver, QueueSender, RetryPolicy};
use crate::shutdown::ShutdownSignal;

pub struct RetryScheduler {
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
    admission: QueueSender,
}

impl RetryScheduler {
    pub fn new(policy: RetryPolicy, admission: QueueSender) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
            admission,
        }
    }

    /// Replace the jitter source (seeded in tests).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn delay_for(&self, attempts: u32) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.policy.next_delay(attempts, &mut *rng)
    }

    pub fn spawn(self, intake: QueueReceiver, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(self.run(intake, shutdown))
    }

    async fn run(self, intake: QueueReceiver, mut shutdown: ShutdownSignal) {
        let mut waiters = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(joined) = waiters.join_next(), if !waiters.is_empty() => {
                    if let Err(err) = joined {
                        warn!(error = %err, "retry waiter panicked");
                    }
                }
                handle = intake.recv() => {
                    let Some(handle) = handle else {
                        debug!("retry intake closed");
                        break;
                    };
                    let delay = self.delay_for(handle.attempts);
                    info!(
                        task_id = %handle.id,
                        attempts = handle.attempts,
                        delay_ms = delay.as_millis() as u64,
                        "retry scheduled"
                    );
                    waiters.spawn(readmit_after(
                        handle,
                        delay,
                        self.admission.clone(),
                        shutdown.clone(),
                    ));
                }
            }
        }

        // pending waiters see the same signal, so this returns promptly
        let pending = waiters.len();
        while let Some(joined) = waiters.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "retry waiter panicked");
            }
        }
        info!(pending, "retry scheduler stopped");
    }
}

async fn readmit_after(
    handle: TaskHandle,
    delay: Duration,
    admission: QueueSender,
    mut shutdown: ShutdownSignal,
) {
    tokio::select! {
        _ = shutdown.cancelled() => {
            info!(task_id = %handle.id, "retry dropped: shutdown in progress");
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }

    let task_id = handle.id.clone();
    match admission.send(handle, &mut shutdown).await {
        Ok(()) => debug!(task_id = %task_id, "task re-admitted"),
        Err(err) => info!(task_id = %task_id, error = %err, "retry dropped"),
    }
}
