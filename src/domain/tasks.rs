//! Task inputs and the validation step that produces them.
//!
//! Request bodies arrive as loosely-typed JSON. Each `validate_*` function checks
//! presence and type of every field it needs and either yields a typed input or the
//! complete list of field errors.

use serde_json::{Map, Value};

use super::error::ValidationErrors;

pub const DEFAULT_WINDOW_SKIP: u64 = 0;
pub const DEFAULT_WINDOW_LIMIT: u64 = 10;

/// Fields accepted when creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

/// Fields accepted by a full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReplacement {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// Fields accepted by a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCompletion {
    pub completed: bool,
}

/// A `(skip, limit)` slice of the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskWindow {
    pub skip: u64,
    pub limit: u64,
}

impl TaskWindow {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }
}

impl Default for TaskWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SKIP, DEFAULT_WINDOW_LIMIT)
    }
}

pub fn validate_new_task(body: &Value) -> Result<NewTask, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(fields) = as_object(body, &mut errors) else {
        return Err(errors);
    };

    let title = string_field(fields, "title", &mut errors);
    let description = string_field(fields, "description", &mut errors);

    errors.finish(|| NewTask {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
    })
}

pub fn validate_task_replacement(body: &Value) -> Result<TaskReplacement, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(fields) = as_object(body, &mut errors) else {
        return Err(errors);
    };

    let title = string_field(fields, "title", &mut errors);
    let description = string_field(fields, "description", &mut errors);
    let completed = bool_field(fields, "completed", &mut errors);

    errors.finish(|| TaskReplacement {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        completed: completed.unwrap_or_default(),
    })
}

/// `completed` is required here; a `null` or missing value is rejected rather than
/// treated as "leave unchanged".
pub fn validate_task_completion(body: &Value) -> Result<TaskCompletion, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(fields) = as_object(body, &mut errors) else {
        return Err(errors);
    };

    let completed = bool_field(fields, "completed", &mut errors);

    errors.finish(|| TaskCompletion {
        completed: completed.unwrap_or_default(),
    })
}

/// Parse raw `skip`/`limit` query values, applying defaults for absent ones.
pub fn validate_window(
    skip: Option<&str>,
    limit: Option<&str>,
) -> Result<TaskWindow, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let skip = count_param("skip", skip, DEFAULT_WINDOW_SKIP, &mut errors);
    let limit = count_param("limit", limit, DEFAULT_WINDOW_LIMIT, &mut errors);
    errors.finish(|| TaskWindow::new(skip, limit))
}

/// Parse a task id taken from a request path.
pub fn validate_task_id(raw: &str) -> Result<i64, ValidationErrors> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationErrors::single("id", "expected an integer"))
}

fn as_object<'a>(body: &'a Value, errors: &mut ValidationErrors) -> Option<&'a Map<String, Value>> {
    match body {
        Value::Object(fields) => Some(fields),
        _ => {
            errors.push("body", "expected a JSON object");
            None
        }
    }
}

fn string_field(
    fields: &Map<String, Value>,
    name: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match fields.get(name) {
        Some(Value::String(value)) if value.contains('\0') => {
            errors.push(name, "must not contain NUL characters");
            None
        }
        Some(Value::String(value)) => Some(value.clone()),
        None | Some(Value::Null) => {
            errors.push(name, "field required");
            None
        }
        Some(_) => {
            errors.push(name, "expected a string");
            None
        }
    }
}

fn bool_field(
    fields: &Map<String, Value>,
    name: &'static str,
    errors: &mut ValidationErrors,
) -> Option<bool> {
    match fields.get(name) {
        Some(Value::Bool(value)) => Some(*value),
        None | Some(Value::Null) => {
            errors.push(name, "field required");
            None
        }
        Some(_) => {
            errors.push(name, "expected a boolean");
            None
        }
    }
}

fn count_param(
    name: &'static str,
    raw: Option<&str>,
    default: u64,
    errors: &mut ValidationErrors,
) -> u64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if i64::try_from(value).is_ok() => value,
        _ => {
            errors.push(name, "expected a non-negative integer");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::error::FieldError;

    fn fields(errors: ValidationErrors) -> Vec<String> {
        errors
            .into_errors()
            .into_iter()
            .map(|FieldError { field, .. }| field)
            .collect()
    }

    #[test]
    fn new_task_accepts_title_and_description() {
        let input = validate_new_task(&json!({"title": "A", "description": "B"}))
            .expect("valid input");
        assert_eq!(
            input,
            NewTask {
                title: "A".to_string(),
                description: "B".to_string(),
            }
        );
    }

    #[test]
    fn new_task_ignores_client_supplied_completion() {
        let input = validate_new_task(&json!({
            "title": "A",
            "description": "B",
            "completed": true,
        }))
        .expect("valid input");
        assert_eq!(input.title, "A");
    }

    #[test]
    fn new_task_reports_every_missing_field() {
        let errors = validate_new_task(&json!({})).expect_err("missing fields");
        assert_eq!(fields(errors), vec!["title", "description"]);
    }

    #[test]
    fn null_title_is_rejected() {
        let errors =
            validate_new_task(&json!({"title": null, "description": "B"})).expect_err("null");
        assert_eq!(fields(errors), vec!["title"]);
    }

    #[test]
    fn nul_characters_are_rejected() {
        let errors = validate_new_task(&json!({"title": "a\0b", "description": "B"}))
            .expect_err("nul in title");
        assert_eq!(fields(errors), vec!["title"]);

        let errors = validate_task_replacement(&json!({
            "title": "C",
            "description": "\0",
            "completed": false,
        }))
        .expect_err("nul in description");
        assert_eq!(fields(errors), vec!["description"]);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let errors = validate_new_task(&json!(["title"])).expect_err("array body");
        assert_eq!(fields(errors), vec!["body"]);
    }

    #[test]
    fn replacement_requires_completed() {
        let errors = validate_task_replacement(&json!({"title": "C", "description": "D"}))
            .expect_err("missing completed");
        assert_eq!(fields(errors), vec!["completed"]);
    }

    #[test]
    fn replacement_rejects_string_completed() {
        let errors = validate_task_replacement(&json!({
            "title": "C",
            "description": "D",
            "completed": "yes",
        }))
        .expect_err("wrong type");
        assert_eq!(fields(errors), vec!["completed"]);
    }

    #[test]
    fn completion_rejects_null() {
        let errors =
            validate_task_completion(&json!({"completed": null})).expect_err("null completed");
        assert_eq!(fields(errors), vec!["completed"]);
    }

    #[test]
    fn completion_accepts_boolean() {
        let input = validate_task_completion(&json!({"completed": true})).expect("valid");
        assert!(input.completed);
    }

    #[test]
    fn window_defaults_apply() {
        assert_eq!(validate_window(None, None), Ok(TaskWindow::new(0, 10)));
        assert_eq!(
            validate_window(Some("5"), None),
            Ok(TaskWindow::new(5, DEFAULT_WINDOW_LIMIT))
        );
    }

    #[test]
    fn window_rejects_negative_values() {
        let errors = validate_window(Some("-1"), Some("abc")).expect_err("invalid window");
        assert_eq!(fields(errors), vec!["skip", "limit"]);
    }

    #[test]
    fn task_id_must_be_integer() {
        assert_eq!(validate_task_id("42"), Ok(42));
        assert!(validate_task_id("forty-two").is_err());
    }
}
