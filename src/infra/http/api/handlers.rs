use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::application::error::ErrorReport;
use crate::domain::error::ValidationErrors;
use crate::domain::tasks::{
    validate_new_task, validate_task_completion, validate_task_id, validate_task_replacement,
    validate_window,
};

use super::{error::ApiError, models::TaskListQuery, state::ApiState};

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        ApiError::validation(ValidationErrors::single("body", rejection.body_text()))
    })
}

pub async fn create_task(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = validate_new_task(&json_body(payload)?)?;
    let task = state.tasks.create(input).await?;
    Ok(Json(task))
}

pub async fn list_tasks(
    State(state): State<ApiState>,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::validation(ValidationErrors::single("query", rejection.body_text()))
    })?;
    let window = validate_window(query.skip.as_deref(), query.limit.as_deref())?;
    let tasks = state.tasks.list(window).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validate_task_id(&id)?;
    let task = state.tasks.get(id).await?;
    Ok(Json(task))
}

pub async fn replace_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validate_task_id(&id)?;
    let input = validate_task_replacement(&json_body(payload)?)?;
    let task = state.tasks.replace(id, input).await?;
    Ok(Json(task))
}

pub async fn patch_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validate_task_id(&id)?;
    let input = validate_task_completion(&json_body(payload)?)?;
    let task = state.tasks.set_completion(id, input).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validate_task_id(&id)?;
    state.tasks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health(State(state): State<ApiState>) -> Response {
    match state.tasks.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}
