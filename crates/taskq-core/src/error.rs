use thiserror::Error;

use crate::domain::{TaskId, TaskStatus};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid task data: {0}")]
    InvalidData(String),

    #[error("task already exists: id={0}")]
    AlreadyExists(TaskId),

    #[error("task not found: id={0}")]
    NotFound(TaskId),

    #[error("illegal status transition for id={id}: {from} -> {to}")]
    InvalidTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("execution failed for id={id} on attempt {attempts}: {reason}")]
    Execution {
        id: TaskId,
        attempts: u32,
        reason: String,
    },

    #[error("shutdown in progress")]
    Cancelled,
}

/// Failure reported by a [`Work`](crate::work::Work) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    #[error("{0}")]
    Failed(String),

    #[error("work cancelled")]
    Cancelled,
}
