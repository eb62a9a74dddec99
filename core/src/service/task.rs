use serde_json::json;

use crate::controller::TaskController;
use crate::entity::{StatusChange, Task, TaskStatus};

use super::{handle_error, ServiceError};

#[derive(Clone)]
pub struct TaskService {
    tasks: TaskController,
}

impl TaskService {
    pub fn new(tasks: TaskController) -> Self {
        Self { tasks }
    }

    pub async fn complete_task(&self, id: &str) -> Result<Task, ServiceError> {
        let change = StatusChange {
            id: id.to_string(),
            status: TaskStatus::Completed,
        };
        self.tasks
            .update_status(&change)
            .await
            .map_err(handle_error("complete_task", json!({ "id": id })))
    }

    /// Moves a task to a new assignee and puts it back in progress.
    ///
    /// Two calls; if the status change fails the new assignment is kept.
    pub async fn reassign(&self, id: &str, assignee_id: &str) -> Result<Task, ServiceError> {
        let on_error = || handle_error("reassign", json!({ "id": id, "assignee_id": assignee_id }));

        self.tasks.assign(id, assignee_id).await.map_err(on_error())?;
        let change = StatusChange {
            id: id.to_string(),
            status: TaskStatus::InProgress,
        };
        self.tasks.update_status(&change).await.map_err(on_error())
    }
}
