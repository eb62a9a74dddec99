use std::sync::Arc;

use serde::Serialize;

use crate::entity::{EntityKind, NewTask, StatusChange, Task, TaskFilter, TaskUpdate};
use crate::error::Error;
use crate::transport::Transport;

use super::{invoke, Crud};

#[derive(Clone)]
pub struct TaskController {
    transport: Arc<dyn Transport>,
}

#[derive(Serialize)]
struct AssignParams<'a> {
    id: &'a str,
    assignee_id: &'a str,
}

impl TaskController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Status transition: `update_task_status` with `{id, status}`.
    pub async fn update_status(&self, change: &StatusChange) -> Result<Task, Error> {
        invoke(self.transport.as_ref(), "update_task_status", change).await
    }

    pub async fn assign(&self, id: &str, assignee_id: &str) -> Result<Task, Error> {
        invoke(self.transport.as_ref(), "assign_task", AssignParams { id, assignee_id }).await
    }
}

impl Crud for TaskController {
    type Record = Task;
    type Create = NewTask;
    type Update = TaskUpdate;
    type Filter = TaskFilter;

    fn kind(&self) -> EntityKind {
        EntityKind::Task
    }

    fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}
