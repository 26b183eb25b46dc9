//! Task status state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Task status.
///
/// State transitions:
/// - Queued -> Running -> Done
/// - Queued -> Running -> Failed
/// - Failed -> Running (a retry re-admitted by the scheduler)
///
/// `Failed` is only terminal once the retry budget is spent; the record itself
/// does not know whether a retry is pending, the worker pool decides that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted and waiting in the admission queue.
    Queued,

    /// Currently being executed by a worker.
    Running,

    /// Successfully completed.
    Done,

    /// Last attempt failed.
    Failed,
}

impl TaskStatus {
    /// Is `self -> next` a legal transition?
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        match (self, next) {
            (Queued, Running) | (Failed, Running) => true,
            (Running, Done) | (Running, Failed) => true,
            (Queued, _) | (Running, _) | (Done, _) | (Failed, _) => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
