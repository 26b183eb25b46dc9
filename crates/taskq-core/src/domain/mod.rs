//! Domain model: task identity, record, handle and status.

pub mod state;
pub mod task;

pub use state::TaskStatus;
pub use task::{NewTask, Task, TaskHandle, TaskId};
