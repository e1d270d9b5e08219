//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};

/// Identifier assigned by the store on creation.
pub type TaskId = i64;

/// A task as persisted by the store.
///
/// The serialized shape doubles as the wire format and the cache payload, so the
/// field set must stay `{id, title, description, completed}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub completed: bool,
}
