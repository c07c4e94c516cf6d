//! Storage ports.
//!
//! Services only ever talk to these traits. Two adapters ship with the crate:
//! [`memory::MemoryStore`] for development and tests, and
//! [`postgres::PgStore`] backed by sqlx.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

use crate::database::models::{Project, Task, TodoList, User};
use crate::types::{ProjectId, TaskId, TodoListId, UserId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by store adapters
#[derive(Debug, Error)]
pub enum StoreError {
    /// The row, or the parent it must hang off, does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The persisted state changed underneath a write that depended on it
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;
    async fn find_by_owner(&self, owner_id: UserId) -> Result<Vec<Project>, StoreError>;
    async fn save(&self, project: &Project) -> Result<Project, StoreError>;
    /// Removes the project; lists and tasks under it go with it
    async fn delete(&self, id: ProjectId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TodoListStore: Send + Sync {
    async fn find_by_id(&self, id: TodoListId) -> Result<Option<TodoList>, StoreError>;
    async fn find_by_id_and_project_id(
        &self,
        id: TodoListId,
        project_id: ProjectId,
    ) -> Result<Option<TodoList>, StoreError>;
    async fn find_by_project_id(&self, project_id: ProjectId) -> Result<Vec<TodoList>, StoreError>;
    async fn exists_by_name_and_project_id(
        &self,
        name: &str,
        project_id: ProjectId,
    ) -> Result<bool, StoreError>;
    /// Insert or rename a list; the project must exist, otherwise `NotFound`
    async fn save(&self, todo_list: &TodoList) -> Result<TodoList, StoreError>;
    /// Removes the list and its tasks
    async fn delete(&self, id: TodoListId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError>;
    /// Tasks of one list, ascending by position
    async fn find_by_todo_list_id(&self, todo_list_id: TodoListId) -> Result<Vec<Task>, StoreError>;

    /// Insert a new task. Its todo list must still exist, otherwise `NotFound`.
    async fn insert(&self, task: &Task) -> Result<Task, StoreError>;

    /// Write title, description, completion and due date of a stored task.
    ///
    /// `todo_list_id` and `position` are never written here. A task that no
    /// longer exists in `task.todo_list_id` is `NotFound` and nothing is
    /// written.
    async fn update(&self, task: &Task) -> Result<Task, StoreError>;

    /// Persist the positions of `tasks` as one all-or-nothing write.
    ///
    /// `tasks` must be the complete membership of `todo_list_id`. If the
    /// stored membership no longer matches (a task was added or removed
    /// concurrently) nothing is written and `StoreError::Conflict` is returned.
    async fn save_positions(
        &self,
        todo_list_id: TodoListId,
        tasks: &[Task],
    ) -> Result<Vec<Task>, StoreError>;

    /// Delete one task of `todo_list_id` and renumber the rest to
    /// `0..n-1`, as one all-or-nothing write. Returns the remaining tasks
    /// ascending by position; a task not in the list is `NotFound`.
    async fn remove(&self, todo_list_id: TodoListId, id: TaskId) -> Result<Vec<Task>, StoreError>;

    async fn delete_by_todo_list_id(&self, todo_list_id: TodoListId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    /// Insert a new user; a duplicate email is a `Conflict`
    async fn save(&self, user: &User) -> Result<User, StoreError>;
}

/// True when `stored` and `tasks` hold exactly the same task ids
pub(crate) fn same_membership(stored: impl IntoIterator<Item = TaskId>, tasks: &[Task]) -> bool {
    let stored: HashSet<TaskId> = stored.into_iter().collect();
    let submitted: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
    stored.len() == tasks.len() && stored == submitted
}
