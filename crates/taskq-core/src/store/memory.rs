//! In-memory store implementation.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::TaskStore;
use crate::domain::{Task, TaskId, TaskStatus};
use crate::error::TaskError;
use crate::observability::StatusCounts;

/// In-memory store.
///
/// One lock for the whole map: every mutation is exclusive, reads share.
/// The lock is never held across an await outside this module.
#[derive(Default)]
pub struct InMemoryTaskStore {
    records: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::with_capacity(16)),
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> Result<(), TaskError> {
        task.validate()?;

        let mut records = self.records.write().await;
        match records.entry(task.id.clone()) {
            Entry::Occupied(entry) => Err(TaskError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(task);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &TaskId) -> Result<Task, TaskError> {
        let records = self.records.read().await;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(id.clone()))
    }

    async fn list(&self) -> Vec<Task> {
        let records = self.records.read().await;
        records.values().cloned().collect()
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), TaskError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;

        if !record.status.can_transition_to(status) {
            return Err(TaskError::InvalidTransition {
                id: id.clone(),
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        record.touch();
        Ok(())
    }

    async fn increment_attempts(&self, id: &TaskId) -> Result<u32, TaskError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;

        record.attempts = record.attempts.saturating_add(1);
        record.touch();
        Ok(record.attempts)
    }

    async fn counts(&self) -> StatusCounts {
        let records = self.records.read().await;
        records.values().map(|record| record.status).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::NewTask;

    fn task(id: &str, max_retries: u32) -> Task {
        Task::queued(NewTask::new(id, format!("payload-{id}"), max_retries))
    }

    #[tokio::test]
    async fn create_then_get_returns_snapshot() {
        let store = InMemoryTaskStore::new();
        store.create(task("a", 1)).await.unwrap();

        let got = store.get(&TaskId::new("a")).await.unwrap();
        assert_eq!(got.status, TaskStatus::Queued);
        assert_eq!(got.attempts, 0);
        assert_eq!(got.payload, "payload-a");
    }

    #[tokio::test]
    async fn duplicate_create_keeps_original() {
        let store = InMemoryTaskStore::new();
        store.create(task("a", 1)).await.unwrap();

        let mut other = task("a", 7);
        other.payload = "other".to_string();
        let err = store.create(other).await.unwrap_err();
        assert!(matches!(err, TaskError::AlreadyExists(ref id) if id.as_str() == "a"));

        let got = store.get(&TaskId::new("a")).await.unwrap();
        assert_eq!(got.payload, "payload-a");
        assert_eq!(got.max_retries, 1);
    }

    #[tokio::test]
    async fn create_rejects_empty_id() {
        let store = InMemoryTaskStore::new();
        let err = store.create(task("", 0)).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidData(_)));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryTaskStore::new();
        let id = TaskId::new("missing");

        assert!(matches!(store.get(&id).await, Err(TaskError::NotFound(_))));
        assert!(matches!(
            store.update_status(&id, TaskStatus::Running).await,
            Err(TaskError::NotFound(_))
        ));
        assert!(matches!(
            store.increment_attempts(&id).await,
            Err(TaskError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected() {
        let store = InMemoryTaskStore::new();
        store.create(task("a", 0)).await.unwrap();
        let id = TaskId::new("a");

        let err = store.update_status(&id, TaskStatus::Done).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::InvalidTransition {
                from: TaskStatus::Queued,
                to: TaskStatus::Done,
                ..
            }
        ));
        assert_eq!(store.get(&id).await.unwrap().status, TaskStatus::Queued);

        store.update_status(&id, TaskStatus::Running).await.unwrap();
        store.update_status(&id, TaskStatus::Failed).await.unwrap();
        store.update_status(&id, TaskStatus::Running).await.unwrap();
        store.update_status(&id, TaskStatus::Done).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().status, TaskStatus::Done);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryTaskStore::new());
        store.create(task("a", 0)).await.unwrap();

        let mut joins = Vec::new();
        for _ in 0..64 {
            let store = Arc::clone(&store);
            joins.push(tokio::spawn(async move {
                store.increment_attempts(&TaskId::new("a")).await.unwrap()
            }));
        }
        for join in joins {
            join.await.unwrap();
        }

        assert_eq!(store.get(&TaskId::new("a")).await.unwrap().attempts, 64);
    }

    #[tokio::test]
    async fn increment_saturates_at_max() {
        let store = InMemoryTaskStore::new();
        let mut record = task("a", u32::MAX);
        record.attempts = u32::MAX - 1;
        store.create(record).await.unwrap();
        let id = TaskId::new("a");

        assert_eq!(store.increment_attempts(&id).await.unwrap(), u32::MAX);
        assert_eq!(store.increment_attempts(&id).await.unwrap(), u32::MAX);
        assert_eq!(store.get(&id).await.unwrap().attempts, u32::MAX);
    }

    #[tokio::test]
    async fn status_change_advances_updated_at() {
        let store = InMemoryTaskStore::new();
        store.create(task("a", 0)).await.unwrap();
        let id = TaskId::new("a");
        let before = store.get(&id).await.unwrap();

        store.update_status(&id, TaskStatus::Running).await.unwrap();
        let after = store.get(&id).await.unwrap();
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn list_and_counts_cover_all_records() {
        let store = InMemoryTaskStore::new();
        for id in ["a", "b", "c"] {
            store.create(task(id, 0)).await.unwrap();
        }
        store
            .update_status(&TaskId::new("b"), TaskStatus::Running)
            .await
            .unwrap();

        let mut ids: Vec<_> = store.list().await.into_iter().map(|t| t.id).collect();
        ids.sort();
        assert_eq!(ids, vec![TaskId::new("a"), TaskId::new("b"), TaskId::new("c")]);

        let counts = store.counts().await;
        assert_eq!(counts.queued, 2);
        assert_eq!(counts.running, 1);
    }
}
