//! AppBuilder - wiring of store, service, queues, workers and retry scheduler.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tracing::info;

use super::runtime::{Actors, App};
use crate::config::PoolConfig;
use crate::queue::{self, RetryPolicy};
use crate::scheduler::RetryScheduler;
use crate::service::TaskService;
use crate::shutdown::Shutdown;
use crate::store::{InMemoryTaskStore, TaskStore};
use crate::work::{SimulatedWork, Work};
use crate::worker::WorkerPool;

/// AppBuilder assembles and starts an [`App`].
///
/// # Example
/// ```ignore
/// let app = AppBuilder::new()
///     .workers(8)
///     .queue_capacity(128)
///     .work(MyWork)
///     .build()?;
/// ```
///
/// `build()` spawns the workers and the retry scheduler, so it must run inside
/// a tokio runtime; outside of one it fails instead of panicking.
pub struct AppBuilder {
    config: PoolConfig,
    retry_policy: RetryPolicy,
    store: Option<Arc<dyn TaskStore>>,
    work: Option<Arc<dyn Work>>,
    jitter_seed: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("AppBuilder::build() must be called from within a tokio runtime")]
    NoRuntime,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            retry_policy: RetryPolicy::default(),
            store: None,
            work: None,
            jitter_seed: None,
        }
    }

    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.config.queue_capacity = queue_capacity;
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Defaults to [`InMemoryTaskStore`].
    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Defaults to [`SimulatedWork`].
    pub fn work<W: Work + 'static>(mut self, work: W) -> Self {
        self.work = Some(Arc::new(work));
        self
    }

    pub fn shared_work(mut self, work: Arc<dyn Work>) -> Self {
        self.work = Some(work);
        self
    }

    /// Seed the backoff jitter for reproducible delays.
    pub fn jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let config = self.config.normalized();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryTaskStore::new()) as Arc<dyn TaskStore>);
        let work = self
            .work
            .unwrap_or_else(|| Arc::new(SimulatedWork::new()) as Arc<dyn Work>);
        let service = Arc::new(TaskService::new(store, work));

        let shutdown = Shutdown::new();
        let (admission_tx, admission_rx) = queue::bounded(config.queue_capacity);
        let (retry_tx, retry_rx) = queue::bounded(config.queue_capacity);

        let mut scheduler = RetryScheduler::new(self.retry_policy, admission_tx.clone());
        if let Some(seed) = self.jitter_seed {
            scheduler = scheduler.with_rng(StdRng::seed_from_u64(seed));
        }
        let scheduler = scheduler.spawn(retry_rx.clone(), shutdown.signal());

        let workers = WorkerPool::spawn(
            config.workers,
            Arc::clone(&service),
            admission_rx.clone(),
            retry_tx,
            shutdown.signal(),
        );

        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "task pool started"
        );

        Ok(App {
            service,
            config,
            admission_tx,
            admission_rx,
            retry_rx,
            shutdown,
            actors: Mutex::new(Some(Actors { workers, scheduler })),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_outside_runtime_fails() {
        let result = AppBuilder::new().build();
        assert!(matches!(result, Err(BuildError::NoRuntime)));
    }

    #[tokio::test]
    async fn build_normalizes_config() {
        let app = AppBuilder::new()
            .workers(0)
            .queue_capacity(0)
            .work(SimulatedWork::seeded(1))
            .build()
            .unwrap();
        assert_eq!(app.config(), PoolConfig::default());
        app.shutdown().await;
    }
}
