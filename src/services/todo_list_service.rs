use std::sync::Arc;
use validator::Validate;

use super::{Deadline, ListLocks, OwnershipValidator, ServiceError};
use crate::api::TodoListRequest;
use crate::auth::IdentityContext;
use crate::database::models::TodoList;
use crate::store::{TaskStore, TodoListStore};
use crate::types::{ProjectId, TodoListId};

#[derive(Clone)]
pub struct TodoListService {
    todo_lists: Arc<dyn TodoListStore>,
    tasks: Arc<dyn TaskStore>,
    validator: OwnershipValidator,
    locks: ListLocks,
    deadline: Deadline,
}

impl TodoListService {
    pub fn new(
        todo_lists: Arc<dyn TodoListStore>,
        tasks: Arc<dyn TaskStore>,
        validator: OwnershipValidator,
        locks: ListLocks,
        deadline: Deadline,
    ) -> Self {
        Self {
            todo_lists,
            tasks,
            validator,
            locks,
            deadline,
        }
    }

    pub async fn create(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        request: TodoListRequest,
    ) -> Result<TodoList, ServiceError> {
        request.validate()?;
        self.validator.validate_project_ownership(caller, project_id).await?;
        self.ensure_name_free(&request.name, project_id).await?;

        let todo_list = TodoList::new(request.name, project_id);
        let saved = self
            .deadline
            .run("todo list save", self.todo_lists.save(&todo_list))
            .await?;

        tracing::info!("User {} created todo list {} in project {}", caller.current_user(), saved.id, project_id);
        Ok(saved)
    }

    pub async fn list(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
    ) -> Result<Vec<TodoList>, ServiceError> {
        self.validator.validate_project_ownership(caller, project_id).await?;
        self.deadline
            .run("todo list listing", self.todo_lists.find_by_project_id(project_id))
            .await
    }

    pub async fn get(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        id: TodoListId,
    ) -> Result<TodoList, ServiceError> {
        self.validator.validate_todo_list_ownership(caller, id, project_id).await
    }

    pub async fn rename(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        id: TodoListId,
        request: TodoListRequest,
    ) -> Result<TodoList, ServiceError> {
        request.validate()?;
        let mut todo_list = self.validator.validate_todo_list_ownership(caller, id, project_id).await?;

        if todo_list.name == request.name {
            return Ok(todo_list);
        }
        self.ensure_name_free(&request.name, project_id).await?;

        todo_list.name = request.name;
        let saved = self
            .deadline
            .run("todo list save", self.todo_lists.save(&todo_list))
            .await?;

        tracing::info!("User {} renamed todo list {}", caller.current_user(), id);
        Ok(saved)
    }

    /// Delete the list and every task in it.
    ///
    /// Holds the list lock, so a task create waiting on it either lands
    /// before the cascade or finds the list gone.
    pub async fn delete(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        id: TodoListId,
    ) -> Result<(), ServiceError> {
        self.validator.validate_todo_list_ownership(caller, id, project_id).await?;

        let _guard = self.locks.lock(id).await;
        self.deadline
            .run("task cascade", self.tasks.delete_by_todo_list_id(id))
            .await?;
        self.deadline.run("todo list delete", self.todo_lists.delete(id)).await?;

        tracing::info!("User {} deleted todo list {}", caller.current_user(), id);
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, project_id: ProjectId) -> Result<(), ServiceError> {
        let taken = self
            .deadline
            .run(
                "todo list name check",
                self.todo_lists.exists_by_name_and_project_id(name, project_id),
            )
            .await?;
        if taken {
            return Err(ServiceError::conflict(format!(
                "a todo list named '{}' already exists in this project",
                name
            )));
        }
        Ok(())
    }
}
