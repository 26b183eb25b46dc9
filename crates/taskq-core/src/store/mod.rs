//! Task store: the single source of truth for task records.

mod memory;

pub use memory::InMemoryTaskStore;

use async_trait::async_trait;

use crate::domain::{Task, TaskId, TaskStatus};
use crate::error::TaskError;
use crate::observability::StatusCounts;

/// Store port (interface).
///
/// Design intent:
/// - Records never leave the store by reference; reads return snapshots.
/// - Mutations for one id never interleave (implementations serialize them).
/// - `update_status` rejects transitions the state machine does not allow,
///   so no caller can bypass it.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new record. Fails if the id is taken or the record is invalid.
    async fn create(&self, task: Task) -> Result<(), TaskError>;

    async fn get(&self, id: &TaskId) -> Result<Task, TaskError>;

    /// All records, in no particular order.
    async fn list(&self) -> Vec<Task>;

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), TaskError>;

    /// Increment the attempt counter and return the new value.
    async fn increment_attempts(&self, id: &TaskId) -> Result<u32, TaskError>;

    async fn counts(&self) -> StatusCounts;
}
