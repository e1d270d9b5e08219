//! In-process task store for local runs without PostgreSQL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::repos::{CreateTaskParams, RepoError, TasksRepo, UpdateTaskParams};
use crate::domain::entities::{TaskId, TaskRecord};
use crate::domain::tasks::TaskWindow;

#[derive(Default)]
struct MemoryState {
    last_id: TaskId,
    tasks: BTreeMap<TaskId, TaskRecord>,
}

/// Tasks kept in a map ordered by id. Ids start at 1 and are never reused, even
/// after deletion.
#[derive(Default)]
pub struct MemoryTaskStore {
    state: RwLock<MemoryState>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TasksRepo for MemoryTaskStore {
    async fn create_task(&self, params: CreateTaskParams) -> Result<TaskRecord, RepoError> {
        let mut state = self.state.write().await;
        let id = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| RepoError::from_persistence("task id space exhausted"))?;
        state.last_id = id;

        let task = TaskRecord {
            id,
            title: params.title,
            description: params.description,
            completed: false,
        };
        state.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: TaskId) -> Result<Option<TaskRecord>, RepoError> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn update_task(
        &self,
        params: UpdateTaskParams,
    ) -> Result<Option<TaskRecord>, RepoError> {
        let mut state = self.state.write().await;
        Ok(state.tasks.get_mut(&params.id).map(|task| {
            task.title = params.title;
            task.description = params.description;
            task.completed = params.completed;
            task.clone()
        }))
    }

    async fn update_task_completion(
        &self,
        id: TaskId,
        completed: bool,
    ) -> Result<Option<TaskRecord>, RepoError> {
        let mut state = self.state.write().await;
        Ok(state.tasks.get_mut(&id).map(|task| {
            task.completed = completed;
            task.clone()
        }))
    }

    async fn delete_task(&self, id: TaskId) -> Result<Option<TaskRecord>, RepoError> {
        Ok(self.state.write().await.tasks.remove(&id))
    }

    async fn list_tasks(&self, window: TaskWindow) -> Result<Vec<TaskRecord>, RepoError> {
        let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
        Ok(self
            .state
            .read()
            .await
            .tasks
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(title: &str) -> CreateTaskParams {
        CreateTaskParams {
            title: title.to_string(),
            description: "description".to_string(),
        }
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        let store = MemoryTaskStore::new();
        let first = store.create_task(params("a")).await.expect("create");
        store.delete_task(first.id).await.expect("delete");
        let second = store.create_task(params("b")).await.expect("create");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(!second.completed);
    }

    #[tokio::test]
    async fn list_windows_follow_id_order() {
        let store = MemoryTaskStore::new();
        for title in ["a", "b", "c", "d"] {
            store.create_task(params(title)).await.expect("create");
        }

        let window = store
            .list_tasks(TaskWindow::new(1, 2))
            .await
            .expect("list");
        let titles: Vec<_> = window.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c"]);

        let beyond = store
            .list_tasks(TaskWindow::new(10, 2))
            .await
            .expect("list");
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn updates_report_absence() {
        let store = MemoryTaskStore::new();
        let missing = store
            .update_task(UpdateTaskParams {
                id: 5,
                title: "t".to_string(),
                description: "d".to_string(),
                completed: true,
            })
            .await
            .expect("update");
        assert!(missing.is_none());
        assert!(
            store
                .update_task_completion(5, true)
                .await
                .expect("patch")
                .is_none()
        );
        assert!(store.delete_task(5).await.expect("delete").is_none());
    }

    #[tokio::test]
    async fn partial_update_only_touches_completion() {
        let store = MemoryTaskStore::new();
        let task = store.create_task(params("a")).await.expect("create");

        let patched = store
            .update_task_completion(task.id, true)
            .await
            .expect("patch")
            .expect("task exists");

        assert_eq!(patched.title, task.title);
        assert_eq!(patched.description, task.description);
        assert!(patched.completed);
    }
}
