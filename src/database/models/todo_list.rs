use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{ProjectId, TodoListId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: TodoListId,
    pub name: String,
    pub project_id: ProjectId,
}

impl TodoList {
    pub fn new(name: String, project_id: ProjectId) -> Self {
        Self {
            id: TodoListId::generate(),
            name,
            project_id,
        }
    }
}
