//! Task service: the task lifecycle and the store side effects of each step.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{NewTask, Task, TaskHandle, TaskId, TaskStatus};
use crate::error::{TaskError, WorkError};
use crate::observability::StatusCounts;
use crate::shutdown::ShutdownSignal;
use crate::store::TaskStore;
use crate::work::Work;

pub struct TaskService {
    store: Arc<dyn TaskStore>,
    work: Arc<dyn Work>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, work: Arc<dyn Work>) -> Self {
        Self { store, work }
    }

    /// Validate and record a submission as `Queued` with zero attempts.
    ///
    /// Does not enqueue; see [`App::submit`](crate::app::App::submit).
    pub async fn submit(&self, new_task: NewTask) -> Result<Task, TaskError> {
        new_task.validate()?;
        let task = Task::queued(new_task);
        self.store.create(task.clone()).await?;
        debug!(task_id = %task.id, max_retries = task.max_retries, "task accepted");
        Ok(task)
    }

    pub async fn get(&self, id: &TaskId) -> Result<Task, TaskError> {
        self.store.get(id).await
    }

    pub async fn list(&self) -> Vec<Task> {
        self.store.list().await
    }

    pub async fn counts(&self) -> StatusCounts {
        self.store.counts().await
    }

    /// Run one execution attempt.
    ///
    /// 1. status -> Running
    /// 2. attempts += 1 (`handle.attempts` is refreshed from the store)
    /// 3. perform the work
    /// 4. status -> Done, or -> Failed and the failure is returned
    ///
    /// The retry decision belongs to the caller; this never re-admits.
    /// Cancellation observed by the work is recorded as `Failed` and
    /// reported as [`TaskError::Cancelled`]. Store errors are propagated as
    /// they are; an increment that already happened stays.
    pub async fn execute(
        &self,
        handle: &mut TaskHandle,
        shutdown: &mut ShutdownSignal,
    ) -> Result<(), TaskError> {
        self.store
            .update_status(&handle.id, TaskStatus::Running)
            .await?;
        handle.attempts = self.store.increment_attempts(&handle.id).await?;

        match self.work.perform(handle, shutdown).await {
            Ok(()) => {
                self.store.update_status(&handle.id, TaskStatus::Done).await?;
                Ok(())
            }
            Err(err) => {
                self.store
                    .update_status(&handle.id, TaskStatus::Failed)
                    .await?;
                Err(match err {
                    WorkError::Cancelled => TaskError::Cancelled,
                    WorkError::Failed(reason) => TaskError::Execution {
                        id: handle.id.clone(),
                        attempts: handle.attempts,
                        reason,
                    },
                })
            }
        }
    }
}
