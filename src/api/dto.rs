//! Request and response bodies of the HTTP API.
//!
//! Field names are camelCase on the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::validation::{min_two_words, no_surrounding_whitespace, not_in_past, strong_password, valid_username};
use crate::database::models::{Task, User};
use crate::database::Patch;
use crate::types::{ProjectId, TaskId, TodoListId, UserId};

// ---------------------------------------------------------------------------
// Users and authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "valid_username"))]
    pub username: String,

    #[validate(length(min = 3, max = 100, message = "name must be between 3 and 100 characters"))]
    #[validate(custom(function = "no_surrounding_whitespace"))]
    #[validate(custom(function = "min_two_words"))]
    pub name: String,

    #[validate(email(message = "invalid email address"))]
    pub email: String,

    #[validate(custom(function = "strong_password"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub email: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    #[validate(custom(function = "no_surrounding_whitespace"))]
    #[validate(custom(function = "min_two_words"))]
    pub name: String,

    #[validate(custom(function = "no_surrounding_whitespace"))]
    pub description: Option<String>,
}

/// Partial project update; omitted fields stay as they are
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

impl Validate for UpdateProjectRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match &self.name {
            Patch::Clear => errors.add("name", required("name")),
            Patch::Set(name) => {
                check(&mut errors, "name", non_empty(name, "name"));
                check(&mut errors, "name", no_surrounding_whitespace(name));
                check(&mut errors, "name", min_two_words(name));
            }
            Patch::Unchanged => {}
        }
        if let Patch::Set(description) = &self.description {
            check(&mut errors, "description", no_surrounding_whitespace(description));
        }
        finish(errors)
    }
}

// ---------------------------------------------------------------------------
// Todo lists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TodoListRequest {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    #[validate(custom(function = "no_surrounding_whitespace"))]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    #[validate(custom(function = "no_surrounding_whitespace"))]
    #[validate(custom(function = "min_two_words"))]
    pub title: String,

    #[validate(custom(function = "no_surrounding_whitespace"))]
    pub description: Option<String>,

    #[validate(custom(function = "not_in_past"))]
    pub due_date: Option<NaiveDate>,
}

/// Partial task update; omitted fields stay as they are, `null` clears
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub due_date: Patch<NaiveDate>,
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match &self.title {
            Patch::Clear => errors.add("title", required("title")),
            Patch::Set(title) => {
                check(&mut errors, "title", non_empty(title, "title"));
                check(&mut errors, "title", no_surrounding_whitespace(title));
                check(&mut errors, "title", min_two_words(title));
            }
            Patch::Unchanged => {}
        }
        if let Patch::Set(description) = &self.description {
            check(&mut errors, "description", no_surrounding_whitespace(description));
        }
        if let Patch::Set(due_date) = &self.due_date {
            check(&mut errors, "dueDate", not_in_past(due_date));
        }
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusRequest {
    pub completed: bool,
}

/// Body of the reorder endpoint; ids stay raw so malformed entries can be
/// reported as a bad request instead of a body rejection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub task_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub todo_list_id: TodoListId,
    pub project_id: ProjectId,
    pub position: i32,
}

impl TaskView {
    pub fn new(task: Task, project_id: ProjectId) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            completed: task.completed,
            due_date: task.due_date,
            todo_list_id: task.todo_list_id,
            project_id,
            position: task.position,
        }
    }

    pub fn many(tasks: Vec<Task>, project_id: ProjectId) -> Vec<Self> {
        tasks.into_iter().map(|task| Self::new(task, project_id)).collect()
    }
}

// ---------------------------------------------------------------------------
// Hand-written validation helpers for patch bodies
// ---------------------------------------------------------------------------

fn required(field: &'static str) -> ValidationError {
    let mut error = ValidationError::new("required");
    error.message = Some(format!("{} cannot be null", field).into());
    error
}

fn non_empty(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut error = ValidationError::new("length");
        error.message = Some(format!("{} is required", field).into());
        return Err(error);
    }
    Ok(())
}

fn check(errors: &mut ValidationErrors, field: &'static str, result: Result<(), ValidationError>) {
    if let Err(error) = result {
        errors.add(field, error);
    }
}

fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
