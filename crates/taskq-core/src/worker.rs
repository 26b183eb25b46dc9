use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::TaskError;
use crate::queue::{QueueReceiver, QueueSender};
use crate::service::TaskService;
use crate::shutdown::ShutdownSignal;

/// Worker pool handle.
/// - workers stop once the shutdown signal fires
/// - `join()` waits for every worker to exit
pub struct WorkerPool {
    joins: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `n` workers sharing one admission queue.
    pub fn spawn(
        n: usize,
        service: Arc<TaskService>,
        admission: QueueReceiver,
        retry: QueueSender,
        shutdown: ShutdownSignal,
    ) -> Self {
        let mut joins = Vec::with_capacity(n);
        for worker_id in 1..=n {
            let worker = Worker {
                id: worker_id,
                service: Arc::clone(&service),
                admission: admission.clone(),
                retry: retry.clone(),
            };
            joins.push(tokio::spawn(worker.run(shutdown.clone())));
        }

        Self { joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Wait for all workers. Does not cancel them; trigger shutdown first.
    pub async fn join(self) {
        for join in self.joins {
            if let Err(err) = join.await {
                error!(error = %err, "worker panicked");
            }
        }
    }
}

struct Worker {
    id: usize,
    service: Arc<TaskService>,
    admission: QueueReceiver,
    retry: QueueSender,
}

impl Worker {
    async fn run(self, mut shutdown: ShutdownSignal) {
        let worker_id = self.id;
        debug!(worker_id, "worker started");

        loop {
            // admission は「待つ」可能性があるので shutdown と競合させる
            let handle = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                handle = self.admission.recv() => handle,
            };
            let Some(mut handle) = handle else {
                debug!(worker_id, "admission queue closed");
                break;
            };

            match self.service.execute(&mut handle, &mut shutdown).await {
                Ok(()) => {
                    info!(worker_id, task_id = %handle.id, attempts = handle.attempts, "task done");
                }
                Err(err @ TaskError::Execution { .. }) if handle.retry_eligible() => {
                    warn!(worker_id, task_id = %handle.id, error = %err, "task failed, retrying");
                    let task_id = handle.id.clone();
                    if let Err(err) = self.retry.send(handle, &mut shutdown).await {
                        info!(worker_id, task_id = %task_id, error = %err, "retry dropped");
                    }
                }
                Err(err @ TaskError::Execution { .. }) => {
                    warn!(
                        worker_id,
                        task_id = %handle.id,
                        attempts = handle.attempts,
                        max_retries = handle.max_retries,
                        error = %err,
                        "task failed: retry budget exhausted"
                    );
                }
                Err(TaskError::Cancelled) => {
                    info!(worker_id, task_id = %handle.id, "execution cancelled by shutdown");
                }
                Err(err) => {
                    // store 側のエラー: この試行は破棄する（worker は止めない）
                    error!(worker_id, task_id = %handle.id, error = %err, "execution aborted");
                }
            }
        }

        debug!(worker_id, "worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{NewTask, TaskHandle, TaskId, TaskStatus};
    use crate::error::WorkError;
    use crate::queue;
    use crate::shutdown::Shutdown;
    use crate::store::InMemoryTaskStore;
    use crate::work::Work;

    struct AlwaysFail {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Work for AlwaysFail {
        async fn perform(
            &self,
            _task: &TaskHandle,
            _shutdown: &mut ShutdownSignal,
        ) -> Result<(), WorkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(WorkError::Failed("boom".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn routes_retryable_failures_to_retry_intake() {
        let work = Arc::new(AlwaysFail {
            calls: AtomicU32::new(0),
        });
        let service = Arc::new(TaskService::new(
            Arc::new(InMemoryTaskStore::new()),
            work.clone(),
        ));
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        let (admit_tx, admit_rx) = queue::bounded(4);
        let (retry_tx, retry_rx) = queue::bounded(4);

        let pool = WorkerPool::spawn(2, service.clone(), admit_rx, retry_tx, shutdown.signal());
        assert_eq!(pool.len(), 2);

        let retryable = service.submit(NewTask::new("retryable", "", 1)).await.unwrap();
        let exhausted = service.submit(NewTask::new("exhausted", "", 0)).await.unwrap();
        admit_tx.send(retryable.handle(), &mut signal).await.unwrap();
        admit_tx.send(exhausted.handle(), &mut signal).await.unwrap();

        let routed = tokio::time::timeout(Duration::from_secs(1), retry_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(routed.id.as_str(), "retryable");
        assert_eq!(routed.attempts, 1);

        // give the other worker time to finish, then make sure nothing else came through
        tokio::time::sleep(Duration::from_millis(50)).await;
        let nothing = tokio::time::timeout(Duration::from_millis(50), retry_rx.recv()).await;
        assert!(nothing.is_err());

        let stored = service.get(&TaskId::new("exhausted")).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Failed);
        assert_eq!(stored.attempts, 1);
        assert_eq!(work.calls.load(Ordering::SeqCst), 2);

        shutdown.trigger();
        pool.join().await;
    }

    #[tokio::test]
    async fn unknown_task_does_not_kill_the_worker() {
        let service = Arc::new(TaskService::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(AlwaysFail {
                calls: AtomicU32::new(0),
            }),
        ));
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        let (admit_tx, admit_rx) = queue::bounded(4);
        let (retry_tx, retry_rx) = queue::bounded(4);
        let pool = WorkerPool::spawn(1, service.clone(), admit_rx, retry_tx, shutdown.signal());

        let ghost = TaskHandle {
            id: TaskId::new("ghost"),
            max_retries: 5,
            attempts: 0,
        };
        admit_tx.send(ghost, &mut signal).await.unwrap();

        let real = service.submit(NewTask::new("real", "", 1)).await.unwrap();
        admit_tx.send(real.handle(), &mut signal).await.unwrap();

        let routed = tokio::time::timeout(Duration::from_secs(1), retry_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(routed.id.as_str(), "real");

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), pool.join())
            .await
            .unwrap();
    }
}
