//! App - the running engine and its external boundary.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::status::Health;
use crate::config::PoolConfig;
use crate::domain::{NewTask, Task, TaskId};
use crate::error::TaskError;
use crate::observability::StatusCounts;
use crate::queue::{QueueReceiver, QueueSender};
use crate::service::TaskService;
use crate::shutdown::Shutdown;
use crate::worker::WorkerPool;

/// Running task pool. Built by [`AppBuilder`](super::AppBuilder).
///
/// Every method takes `&self`, so the app can be shared behind an `Arc`
/// (e.g. as transport state). Call [`App::shutdown`] before dropping it;
/// otherwise the workers keep running until the runtime goes away.
pub struct App {
    pub(super) service: Arc<TaskService>,
    pub(super) config: PoolConfig,
    pub(super) admission_tx: QueueSender,
    pub(super) admission_rx: QueueReceiver,
    pub(super) retry_rx: QueueReceiver,
    pub(super) shutdown: Shutdown,
    pub(super) actors: Mutex<Option<Actors>>,
}

pub(super) struct Actors {
    pub(super) workers: WorkerPool,
    pub(super) scheduler: JoinHandle<()>,
}

impl App {
    /// Record a new task and put it on the admission queue.
    ///
    /// Waits while the queue is full. Returns the `Queued` snapshot.
    ///
    /// Once shutdown has begun this fails with [`TaskError::Cancelled`] and
    /// nothing is recorded. A submit already waiting for room when shutdown
    /// begins also fails with `Cancelled`, but its record was created first:
    /// it stays `Queued`, never runs, and its id stays taken.
    pub async fn submit(
        &self,
        id: impl Into<TaskId>,
        payload: impl Into<String>,
        max_retries: u32,
    ) -> Result<Task, TaskError> {
        // refuse before creating the record once shutdown has begun
        if self.shutdown.is_triggered() {
            return Err(TaskError::Cancelled);
        }

        let task = self
            .service
            .submit(NewTask::new(id, payload, max_retries))
            .await?;

        let mut signal = self.shutdown.signal();
        self.admission_tx.send(task.handle(), &mut signal).await?;
        Ok(task)
    }

    pub async fn get(&self, id: &TaskId) -> Result<Task, TaskError> {
        self.service.get(id).await
    }

    pub async fn list(&self) -> Vec<Task> {
        self.service.list().await
    }

    pub async fn counts(&self) -> StatusCounts {
        self.service.counts().await
    }

    pub fn healthcheck(&self) -> Health {
        Health::Ok
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Stop everything and wait until it is quiet.
    ///
    /// 1. broadcast cancellation
    /// 2. join the workers and the retry scheduler (which joins its waiters)
    /// 3. close both queues
    ///
    /// Safe to call more than once; later calls return immediately.
    pub async fn shutdown(&self) {
        self.shutdown.trigger();

        let Some(actors) = self.actors.lock().await.take() else {
            return;
        };

        actors.workers.join().await;
        if let Err(err) = actors.scheduler.await {
            warn!(error = %err, "retry scheduler panicked");
        }

        self.admission_rx.close().await;
        self.retry_rx.close().await;
        info!("task pool stopped");
    }
}
