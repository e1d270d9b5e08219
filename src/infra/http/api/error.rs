use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::application::tasks::TaskServiceError;
use crate::domain::error::{FieldError, ValidationErrors};

const SOURCE: &str = "infra::http::api";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const VALIDATION: &str = "validation_error";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
    pub const CACHE_UNAVAILABLE: &str = "cache_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Vec<FieldError>,
    /// Diagnostic for the logs; never rendered to the client.
    diagnostic: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: Vec::new(),
            diagnostic: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            details: errors.into_errors(),
            ..Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                codes::VALIDATION,
                "Request validation failed",
            )
        }
    }

    fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        let diagnostic = err.to_string();
        let api = match &err {
            TaskServiceError::NotFound { id } => {
                return Self::not_found(format!("Task {id} not found"));
            }
            TaskServiceError::Repo(RepoError::Persistence(_) | RepoError::InvalidInput { .. }) => {
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::INTERNAL,
                    "Internal server error",
                )
            }
            TaskServiceError::Repo(RepoError::Unavailable(_) | RepoError::Timeout) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::STORE_UNAVAILABLE,
                "Service temporarily unavailable",
            ),
            TaskServiceError::Cache(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CACHE_UNAVAILABLE,
                "Service temporarily unavailable",
            ),
            TaskServiceError::Encode(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "Internal server error",
            ),
        };
        api.with_diagnostic(diagnostic)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match (&self.diagnostic, self.details.is_empty()) {
            (Some(diagnostic), _) => diagnostic.clone(),
            (None, false) => self
                .details
                .iter()
                .map(|field| format!("{}: {}", field.field, field.message))
                .collect::<Vec<_>>()
                .join("; "),
            (None, true) => self.message.clone(),
        };
        let report = ErrorReport::from_message(
            SOURCE,
            self.status,
            format!("{}: {detail}", self.code),
        );

        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message,
                details: self.details,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (
                TaskServiceError::NotFound { id: 3 },
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
            ),
            (
                TaskServiceError::Repo(RepoError::Timeout),
                StatusCode::SERVICE_UNAVAILABLE,
                codes::STORE_UNAVAILABLE,
            ),
            (
                TaskServiceError::Repo(RepoError::from_persistence("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
            ),
            (
                TaskServiceError::Cache(CacheError::connection("refused")),
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CACHE_UNAVAILABLE,
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn responses_carry_error_report() {
        let response =
            ApiError::from(TaskServiceError::Repo(RepoError::unavailable("pool closed")))
                .into_response();

        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.source, SOURCE);
        assert!(report.messages[0].contains("pool closed"));
    }
}
