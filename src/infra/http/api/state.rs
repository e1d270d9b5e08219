use std::sync::Arc;

use crate::application::tasks::TaskService;

#[derive(Clone)]
pub struct ApiState {
    pub tasks: Arc<TaskService>,
}

impl ApiState {
    pub fn new(tasks: TaskService) -> Self {
        Self {
            tasks: Arc::new(tasks),
        }
    }
}
