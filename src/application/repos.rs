//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{TaskId, TaskRecord};
use crate::domain::tasks::TaskWindow;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateTaskParams {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTaskParams {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// Authoritative task storage.
///
/// Lookups and writes that target an id return `Ok(None)` when no such task exists;
/// absence is not an error at this layer.
#[async_trait]
pub trait TasksRepo: Send + Sync {
    /// Insert a task with `completed = false` and return it with its assigned id.
    async fn create_task(&self, params: CreateTaskParams) -> Result<TaskRecord, RepoError>;

    async fn find_task(&self, id: TaskId) -> Result<Option<TaskRecord>, RepoError>;

    /// Replace title, description and completion of an existing task.
    async fn update_task(&self, params: UpdateTaskParams)
    -> Result<Option<TaskRecord>, RepoError>;

    async fn update_task_completion(
        &self,
        id: TaskId,
        completed: bool,
    ) -> Result<Option<TaskRecord>, RepoError>;

    /// Remove a task, returning the record as it was before deletion.
    async fn delete_task(&self, id: TaskId) -> Result<Option<TaskRecord>, RepoError>;

    /// Tasks ordered by ascending id, `window.skip` rows skipped, at most `window.limit` returned.
    async fn list_tasks(&self, window: TaskWindow) -> Result<Vec<TaskRecord>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}
