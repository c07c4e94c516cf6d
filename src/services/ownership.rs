use std::sync::Arc;

use super::{Deadline, ServiceError};
use crate::auth::IdentityContext;
use crate::database::models::{Project, TodoList};
use crate::store::{ProjectStore, TodoListStore};
use crate::types::{ProjectId, TodoListId};

/// The single authorization gate.
///
/// Every check walks the chain fresh from the stores and compares the
/// caller with the owner of the root project. Holds no mutable state, so
/// one instance is shared by all requests.
#[derive(Clone)]
pub struct OwnershipValidator {
    projects: Arc<dyn ProjectStore>,
    todo_lists: Arc<dyn TodoListStore>,
    deadline: Deadline,
}

impl OwnershipValidator {
    pub fn new(projects: Arc<dyn ProjectStore>, todo_lists: Arc<dyn TodoListStore>, deadline: Deadline) -> Self {
        Self {
            projects,
            todo_lists,
            deadline,
        }
    }

    /// Load the project and confirm the caller owns it.
    ///
    /// Fails with `NotFound` when the project is absent and `Forbidden` when
    /// somebody else owns it.
    pub async fn validate_project_ownership(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
    ) -> Result<Project, ServiceError> {
        let project = self
            .deadline
            .run("project lookup", self.projects.find_by_id(project_id))
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("project {}", project_id)))?;

        let user_id = caller.current_user();
        if !project.is_owned_by(user_id) {
            tracing::warn!("User {} denied access to project {}", user_id, project_id);
            return Err(ServiceError::Forbidden);
        }

        tracing::debug!("User {} owns project {}", user_id, project_id);
        Ok(project)
    }

    /// Load the todo list, confirm it hangs off `project_id`, then confirm
    /// the caller owns that project.
    ///
    /// The relationship check runs before the ownership check, so a list
    /// paired with the wrong project is `InvalidRelationship` for every caller.
    pub async fn validate_todo_list_ownership(
        &self,
        caller: &dyn IdentityContext,
        todo_list_id: TodoListId,
        project_id: ProjectId,
    ) -> Result<TodoList, ServiceError> {
        let todo_list = self
            .deadline
            .run("todo list lookup", self.todo_lists.find_by_id(todo_list_id))
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("todo list {}", todo_list_id)))?;

        if todo_list.project_id != project_id {
            tracing::warn!(
                "Todo list {} does not belong to project {} (caller {})",
                todo_list_id,
                project_id,
                caller.current_user()
            );
            return Err(ServiceError::invalid_relationship(
                "todo list does not belong to the given project",
            ));
        }

        self.validate_project_ownership(caller, project_id).await?;
        Ok(todo_list)
    }
}
