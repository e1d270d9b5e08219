use async_trait::async_trait;

use crate::{
    application::repos::{CreateTaskParams, RepoError, TasksRepo, UpdateTaskParams},
    domain::entities::{TaskId, TaskRecord},
    domain::tasks::TaskWindow,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    completed: bool,
}

impl From<TaskRow> for TaskRecord {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
        }
    }
}

fn window_bound(value: u64, name: &str) -> Result<i64, RepoError> {
    i64::try_from(value).map_err(|_| RepoError::InvalidInput {
        message: format!("{name} exceeds supported range"),
    })
}

#[async_trait]
impl TasksRepo for PostgresRepositories {
    async fn create_task(&self, params: CreateTaskParams) -> Result<TaskRecord, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (title, description, completed)
            VALUES ($1, $2, FALSE)
            RETURNING id, title, description, completed
            "#,
        )
        .bind(params.title)
        .bind(params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TaskRecord::from(row))
    }

    async fn find_task(&self, id: TaskId) -> Result<Option<TaskRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, completed
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TaskRecord::from))
    }

    async fn update_task(
        &self,
        params: UpdateTaskParams,
    ) -> Result<Option<TaskRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                completed = $4
            WHERE id = $1
            RETURNING id, title, description, completed
            "#,
        )
        .bind(params.id)
        .bind(params.title)
        .bind(params.description)
        .bind(params.completed)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TaskRecord::from))
    }

    async fn update_task_completion(
        &self,
        id: TaskId,
        completed: bool,
    ) -> Result<Option<TaskRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET completed = $2
            WHERE id = $1
            RETURNING id, title, description, completed
            "#,
        )
        .bind(id)
        .bind(completed)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TaskRecord::from))
    }

    async fn delete_task(&self, id: TaskId) -> Result<Option<TaskRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            DELETE FROM tasks
            WHERE id = $1
            RETURNING id, title, description, completed
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TaskRecord::from))
    }

    async fn list_tasks(&self, window: TaskWindow) -> Result<Vec<TaskRecord>, RepoError> {
        let offset = window_bound(window.skip, "skip")?;
        let limit = window_bound(window.limit, "limit")?;

        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, completed
            FROM tasks
            ORDER BY id ASC
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TaskRecord::from).collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
