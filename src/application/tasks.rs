//! Task operations and the cache policy that wraps them.
//!
//! Reads are read-through: a cache hit is served as stored, a miss consults the store
//! and populates the entry. Updates write the fresh task back into its single-item
//! entry. Every successful write drops all cached list windows, since any window's
//! membership may have changed. Failed writes leave the cache untouched.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::repos::{CreateTaskParams, RepoError, TasksRepo, UpdateTaskParams};
use crate::cache::{CacheConfig, CacheError, CacheKey, CacheKeys, CacheStore};
use crate::domain::entities::{TaskId, TaskRecord};
use crate::domain::tasks::{NewTask, TaskCompletion, TaskReplacement, TaskWindow};

pub const METRIC_CACHE_HIT: &str = "taskcache_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "taskcache_cache_miss_total";
pub const METRIC_CACHE_INVALIDATION: &str = "taskcache_cache_invalidation_total";
pub const METRIC_CACHE_DECODE_ERROR: &str = "taskcache_cache_decode_error_total";

#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error("task {id} not found")]
    NotFound { id: TaskId },
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("failed to encode cache payload: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TasksRepo>,
    cache: Arc<dyn CacheStore>,
    keys: CacheKeys,
    ttl: Duration,
}

impl TaskService {
    pub fn new(store: Arc<dyn TasksRepo>, cache: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            cache,
            keys: CacheKeys::new(config.key_prefix.clone()),
            ttl: config.ttl,
        }
    }

    /// Persist a new task. The single-item entry is left for the first read to fill.
    pub async fn create(&self, input: NewTask) -> Result<TaskRecord, TaskServiceError> {
        let NewTask { title, description } = input;
        let task = self
            .store
            .create_task(CreateTaskParams { title, description })
            .await?;

        self.invalidate_lists().await?;
        debug!(task_id = task.id, "task created");
        Ok(task)
    }

    pub async fn get(&self, id: TaskId) -> Result<TaskRecord, TaskServiceError> {
        let key = CacheKey::Task(id);
        if let Some(task) = self.read_cached::<TaskRecord>(key).await? {
            return Ok(task);
        }

        let task = self
            .store
            .find_task(id)
            .await?
            .ok_or(TaskServiceError::NotFound { id })?;

        self.populate(key, &task).await?;
        Ok(task)
    }

    /// Read one pagination window. Only the requested window is populated.
    pub async fn list(&self, window: TaskWindow) -> Result<Vec<TaskRecord>, TaskServiceError> {
        let key = CacheKey::TaskList(window);
        if let Some(tasks) = self.read_cached::<Vec<TaskRecord>>(key).await? {
            return Ok(tasks);
        }

        let tasks = self.store.list_tasks(window).await?;
        self.populate(key, &tasks).await?;
        Ok(tasks)
    }

    pub async fn replace(
        &self,
        id: TaskId,
        input: TaskReplacement,
    ) -> Result<TaskRecord, TaskServiceError> {
        let TaskReplacement {
            title,
            description,
            completed,
        } = input;
        let task = self
            .store
            .update_task(UpdateTaskParams {
                id,
                title,
                description,
                completed,
            })
            .await?
            .ok_or(TaskServiceError::NotFound { id })?;

        self.write_through(&task).await?;
        Ok(task)
    }

    pub async fn set_completion(
        &self,
        id: TaskId,
        input: TaskCompletion,
    ) -> Result<TaskRecord, TaskServiceError> {
        let task = self
            .store
            .update_task_completion(id, input.completed)
            .await?
            .ok_or(TaskServiceError::NotFound { id })?;

        self.write_through(&task).await?;
        Ok(task)
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.store
            .delete_task(id)
            .await?
            .ok_or(TaskServiceError::NotFound { id })?;

        let key = CacheKey::Task(id);
        self.cache.delete(&self.keys.render(key)).await?;
        counter!(METRIC_CACHE_INVALIDATION, "kind" => key.kind()).increment(1);
        self.invalidate_lists().await?;
        debug!(task_id = id, "task deleted");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), TaskServiceError> {
        self.store.health_check().await.map_err(TaskServiceError::from)
    }

    async fn write_through(&self, task: &TaskRecord) -> Result<(), TaskServiceError> {
        self.populate(CacheKey::Task(task.id), task).await?;
        self.invalidate_lists().await?;
        debug!(task_id = task.id, "task updated");
        Ok(())
    }

    /// Returns `None` on a miss. An entry that fails to decode counts as a miss; the
    /// populate that follows overwrites it.
    async fn read_cached<T: DeserializeOwned>(
        &self,
        key: CacheKey,
    ) -> Result<Option<T>, TaskServiceError> {
        let rendered = self.keys.render(key);
        let Some(bytes) = self.cache.get(&rendered).await? else {
            counter!(METRIC_CACHE_MISS, "kind" => key.kind()).increment(1);
            debug!(key = %rendered, "cache miss");
            return Ok(None);
        };

        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "kind" => key.kind()).increment(1);
                debug!(key = %rendered, "cache hit");
                Ok(Some(value))
            }
            Err(err) => {
                counter!(METRIC_CACHE_DECODE_ERROR, "kind" => key.kind()).increment(1);
                counter!(METRIC_CACHE_MISS, "kind" => key.kind()).increment(1);
                warn!(key = %rendered, error = %err, "discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), TaskServiceError> {
        let rendered = self.keys.render(key);
        let payload = Bytes::from(serde_json::to_vec(value)?);
        self.cache.set(&rendered, payload, self.ttl).await?;
        debug!(key = %rendered, ttl_secs = self.ttl.as_secs(), "cache populated");
        Ok(())
    }

    async fn invalidate_lists(&self) -> Result<(), TaskServiceError> {
        let prefix = self.keys.task_lists_prefix();
        let removed = self.cache.scan_delete(&prefix).await?;
        counter!(METRIC_CACHE_INVALIDATION, "kind" => "task_list").increment(removed);
        debug!(prefix = %prefix, removed, "task list windows invalidated");
        Ok(())
    }
}
