use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskStatus;
use crate::error::TaskError;

/// Caller-supplied task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A submission, before it becomes a record.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: TaskId,
    pub payload: String,
    pub max_retries: u32,
}

impl NewTask {
    pub fn new(id: impl Into<TaskId>, payload: impl Into<String>, max_retries: u32) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
            max_retries,
        }
    }

    pub fn validate(&self) -> Result<(), TaskError> {
        validate_id(&self.id)
    }
}

pub(crate) fn validate_id(id: &TaskId) -> Result<(), TaskError> {
    if id.is_empty() {
        return Err(TaskError::InvalidData("id is required".to_string()));
    }
    Ok(())
}

/// The authoritative task record, as held by the store.
///
/// Callers only ever see snapshots of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub payload: String,
    pub max_retries: u32,

    /// Execution attempts so far, including one that is currently running.
    pub attempts: u32,

    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A fresh record for an accepted submission.
    pub fn queued(new_task: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: new_task.id,
            payload: new_task.payload,
            max_retries: new_task.max_retries,
            attempts: 0,
            status: TaskStatus::Queued,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), TaskError> {
        validate_id(&self.id)
    }

    /// Handle to pass through the queues.
    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            id: self.id.clone(),
            max_retries: self.max_retries,
            attempts: self.attempts,
        }
    }

    /// Done, or Failed with the retry budget spent.
    pub fn is_terminal(&self) -> bool {
        match self.status {
            TaskStatus::Done => true,
            TaskStatus::Failed => self.attempts > self.max_retries,
            TaskStatus::Queued | TaskStatus::Running => false,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// What the admission queue and the retry path carry around.
///
/// Not a second copy of the record: `attempts` is only the count the last
/// execution observed, used for the retry decision and the backoff delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub id: TaskId,
    pub max_retries: u32,
    pub attempts: u32,
}

impl TaskHandle {
    /// `attempts <= max_retries`: the attempt at which `max_retries` attempts
    /// have been made is still followed by one more.
    pub fn retry_eligible(&self) -> bool {
        self.attempts <= self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn queued_record_starts_clean() {
        let task = Task::queued(NewTask::new("a", "payload", 2));
        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.attempts, 0);
        assert_eq!(task.created_at, task.updated_at);
        assert!(!task.is_terminal());
    }

    #[test]
    fn empty_id_is_invalid() {
        let err = NewTask::new("", "x", 0).validate().unwrap_err();
        assert!(matches!(err, TaskError::InvalidData(_)));
    }

    #[rstest]
    #[case(0, 0, true)]
    #[case(0, 1, false)]
    #[case(3, 3, true)]
    #[case(3, 4, false)]
    fn retry_eligibility(#[case] max_retries: u32, #[case] attempts: u32, #[case] eligible: bool) {
        let handle = TaskHandle {
            id: TaskId::new("t"),
            max_retries,
            attempts,
        };
        assert_eq!(handle.retry_eligible(), eligible);
    }

    #[test]
    fn failed_is_terminal_only_when_budget_spent() {
        let mut task = Task::queued(NewTask::new("a", "", 1));
        task.status = TaskStatus::Failed;
        task.attempts = 1;
        assert!(!task.is_terminal());
        task.attempts = 2;
        assert!(task.is_terminal());
    }

    #[test]
    fn serializes_wire_shape() {
        let task = Task::queued(NewTask::new("job-1", "hello", 3));
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], "job-1");
        assert_eq!(value["payload"], "hello");
        assert_eq!(value["max_retries"], 3);
        assert_eq!(value["attempts"], 0);
        assert_eq!(value["status"], "queued");
        assert!(value["created_at"].is_string());
        assert_eq!(value["created_at"], value["updated_at"]);

        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            [
                "attempts",
                "created_at",
                "id",
                "max_retries",
                "payload",
                "status",
                "updated_at"
            ]
        );
    }
}
