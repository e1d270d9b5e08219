//! Cache key definitions.
//!
//! Single tasks live under `task:{id}`, list windows under `tasks:all:{skip}:{limit}`.
//! All list windows share the `tasks:all` prefix so a single prefix scan drops them.

use std::fmt;

use crate::domain::entities::TaskId;
use crate::domain::tasks::TaskWindow;

const TASK_KEY_PREFIX: &str = "task";
const TASK_LIST_KEY_PREFIX: &str = "tasks:all";

/// A logical cache entry, independent of any namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A single serialized task.
    Task(TaskId),
    /// One pagination window of the task list.
    TaskList(TaskWindow),
}

impl CacheKey {
    /// Label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheKey::Task(_) => "task",
            CacheKey::TaskList(_) => "task_list",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Task(id) => write!(f, "{TASK_KEY_PREFIX}:{id}"),
            CacheKey::TaskList(window) => write!(
                f,
                "{TASK_LIST_KEY_PREFIX}:{}:{}",
                window.skip, window.limit
            ),
        }
    }
}

/// Renders cache keys under an optional namespace.
#[derive(Debug, Clone, Default)]
pub struct CacheKeys {
    namespace: Option<String>,
}

impl CacheKeys {
    pub fn new(namespace: Option<String>) -> Self {
        let namespace = namespace.and_then(|value| {
            let trimmed = value.trim().trim_end_matches(':');
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });
        Self { namespace }
    }

    pub fn render(&self, key: CacheKey) -> String {
        self.qualify(&key.to_string())
    }

    /// Prefix shared by every task list window.
    pub fn task_lists_prefix(&self) -> String {
        self.qualify(TASK_LIST_KEY_PREFIX)
    }

    fn qualify(&self, key: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}:{key}"),
            None => key.to_string(),
        }
    }
}
