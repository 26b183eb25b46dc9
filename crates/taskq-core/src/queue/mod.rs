//! Bounded queues (admission, retry intake) and the retry backoff policy.

mod retry;

pub use retry::RetryPolicy;

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::domain::TaskHandle;
use crate::error::TaskError;
use crate::shutdown::ShutdownSignal;

/// Create a bounded queue of task handles.
///
/// A full queue makes senders wait; nothing is dropped and nothing grows past
/// `capacity`. The receiving side may be cloned and shared by several
/// consumers, each handle is delivered to exactly one of them.
pub fn bounded(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        QueueSender { tx },
        QueueReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<TaskHandle>,
}

impl QueueSender {
    /// Enqueue, waiting for room if the queue is full.
    ///
    /// Gives up with `Cancelled` once shutdown is triggered or the queue has
    /// been closed; the handle is dropped in that case.
    pub async fn send(
        &self,
        handle: TaskHandle,
        shutdown: &mut ShutdownSignal,
    ) -> Result<(), TaskError> {
        if shutdown.is_cancelled() {
            return Err(TaskError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Err(TaskError::Cancelled),
            sent = self.tx.send(handle) => sent.map_err(|_| TaskError::Cancelled),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug, Clone)]
pub struct QueueReceiver {
    rx: Arc<Mutex<mpsc::Receiver<TaskHandle>>>,
}

impl QueueReceiver {
    /// Take the next handle. `None` once the queue is closed and drained.
    ///
    /// Cancel safe: dropping the future never loses a handle.
    pub async fn recv(&self) -> Option<TaskHandle> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Refuse further sends. Handles already buffered stay receivable.
    pub async fn close(&self) {
        let mut rx = self.rx.lock().await;
        rx.close();
    }
}
