use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{TaskId, TodoListId};

/// A task inside a todo list.
///
/// `position` is the dense zero-based rank of the task among the tasks that
/// share its `todo_list_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub todo_list_id: TodoListId,
    pub position: i32,
}

impl Task {
    pub fn new(
        title: String,
        description: Option<String>,
        due_date: Option<NaiveDate>,
        todo_list_id: TodoListId,
        position: i32,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            title,
            description,
            completed: false,
            due_date,
            todo_list_id,
            position,
        }
    }

    pub fn belongs_to(&self, todo_list_id: TodoListId) -> bool {
        self.todo_list_id == todo_list_id
    }
}
