use serde::Deserialize;

/// Raw pagination parameters; parsed by `validate_window` so bad values become field errors.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub skip: Option<String>,
    pub limit: Option<String>,
}
