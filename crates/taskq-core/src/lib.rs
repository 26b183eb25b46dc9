//! taskq-core
//!
//! In-memory task execution engine: tasks are submitted with a payload and a
//! retry budget, executed by a fixed worker pool, and retried with jittered
//! exponential backoff until they succeed or run out of budget.
//!
//! # Modules
//! - **domain**: task id, record, handle and status state machine
//! - **store**: `TaskStore` trait + in-memory implementation
//! - **service**: the lifecycle of one execution attempt
//! - **work**: the pluggable unit of work (`Work`, `SimulatedWork`)
//! - **queue**: bounded admission / retry queues and `RetryPolicy`
//! - **worker**: the worker pool
//! - **scheduler**: the retry scheduler
//! - **shutdown**: cancellation broadcast
//! - **app**: `AppBuilder` / `App`, the external boundary

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod observability;
pub mod queue;
pub mod scheduler;
pub mod service;
pub mod shutdown;
pub mod store;
pub mod work;
pub mod worker;

pub use app::{App, AppBuilder, BuildError, Health};
pub use config::PoolConfig;
pub use domain::{NewTask, Task, TaskHandle, TaskId, TaskStatus};
pub use error::{TaskError, WorkError};
pub use observability::StatusCounts;
pub use queue::RetryPolicy;
pub use shutdown::{Shutdown, ShutdownSignal};
pub use store::{InMemoryTaskStore, TaskStore};
pub use work::{SimulatedWork, Work};
