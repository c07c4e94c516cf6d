use std::sync::Arc;
use validator::Validate;

use super::{Deadline, ListLocks, OwnershipValidator, ReorderingEngine, ServiceError};
use crate::api::{CreateTaskRequest, UpdateTaskRequest};
use crate::auth::IdentityContext;
use crate::database::models::Task;
use crate::store::TaskStore;
use crate::types::{ProjectId, TaskId, TodoListId};

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    validator: OwnershipValidator,
    engine: ReorderingEngine,
    locks: ListLocks,
    deadline: Deadline,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        validator: OwnershipValidator,
        engine: ReorderingEngine,
        locks: ListLocks,
        deadline: Deadline,
    ) -> Self {
        Self {
            tasks,
            validator,
            engine,
            locks,
            deadline,
        }
    }

    /// Append a new, not yet completed task at the end of the list.
    ///
    /// Runs under the list lock, which list and project deletes also take;
    /// if the list went away while this call waited, the insert is
    /// `NotFound` and no task is written.
    pub async fn create(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
        request: CreateTaskRequest,
    ) -> Result<Task, ServiceError> {
        request.validate()?;
        self.validator
            .validate_todo_list_ownership(caller, todo_list_id, project_id)
            .await?;

        let _guard = self.locks.lock(todo_list_id).await;
        let existing = self
            .deadline
            .run("task listing", self.tasks.find_by_todo_list_id(todo_list_id))
            .await?;
        let position = i32::try_from(existing.len()).map_err(|_| ServiceError::bad_request("todo list is full"))?;

        let task = Task::new(request.title, request.description, request.due_date, todo_list_id, position);
        let saved = self.deadline.run("task insert", self.tasks.insert(&task)).await?;

        tracing::info!(
            "User {} created task {} in todo list {} at position {}",
            caller.current_user(),
            saved.id,
            todo_list_id,
            position
        );
        Ok(saved)
    }

    /// Tasks of the list ascending by position.
    pub async fn list(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
    ) -> Result<Vec<Task>, ServiceError> {
        self.validator
            .validate_todo_list_ownership(caller, todo_list_id, project_id)
            .await?;
        let mut tasks = self
            .deadline
            .run("task listing", self.tasks.find_by_todo_list_id(todo_list_id))
            .await?;
        tasks.sort_by_key(|task| task.position);
        Ok(tasks)
    }

    pub async fn get(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
        id: TaskId,
    ) -> Result<Task, ServiceError> {
        self.load(caller, project_id, todo_list_id, id).await
    }

    pub async fn update(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
        id: TaskId,
        patch: UpdateTaskRequest,
    ) -> Result<Task, ServiceError> {
        patch.validate()?;
        let mut task = self.load(caller, project_id, todo_list_id, id).await?;

        patch.title.apply_required(&mut task.title);
        patch.description.apply_to(&mut task.description);
        patch.due_date.apply_to(&mut task.due_date);

        let saved = self.deadline.run("task update", self.tasks.update(&task)).await?;
        tracing::info!("User {} updated task {}", caller.current_user(), id);
        Ok(saved)
    }

    pub async fn set_status(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
        id: TaskId,
        completed: bool,
    ) -> Result<Task, ServiceError> {
        let mut task = self.load(caller, project_id, todo_list_id, id).await?;
        task.completed = completed;

        let saved = self.deadline.run("task update", self.tasks.update(&task)).await?;
        tracing::info!(
            "User {} marked task {} as {}",
            caller.current_user(),
            id,
            if completed { "completed" } else { "open" }
        );
        Ok(saved)
    }

    /// Delete the task and close the gap it leaves in the list's positions,
    /// both in one store write.
    pub async fn delete(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
        id: TaskId,
    ) -> Result<(), ServiceError> {
        self.load(caller, project_id, todo_list_id, id).await?;

        let _guard = self.locks.lock(todo_list_id).await;
        let remaining = self
            .deadline
            .run("task delete", self.tasks.remove(todo_list_id, id))
            .await?;

        tracing::info!(
            "User {} deleted task {} ({} left in todo list {})",
            caller.current_user(),
            id,
            remaining.len(),
            todo_list_id
        );
        Ok(())
    }

    pub async fn reorder(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
        ordered_task_ids: &[TaskId],
    ) -> Result<Vec<Task>, ServiceError> {
        self.engine
            .reorder(caller, project_id, todo_list_id, ordered_task_ids)
            .await
    }

    /// Authorize against the list first, so a caller who does not own the
    /// project learns nothing about the task, then check the task itself.
    async fn load(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
        id: TaskId,
    ) -> Result<Task, ServiceError> {
        self.validator
            .validate_todo_list_ownership(caller, todo_list_id, project_id)
            .await?;

        let task = self
            .deadline
            .run("task lookup", self.tasks.find_by_id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("task {}", id)))?;

        if !task.belongs_to(todo_list_id) {
            return Err(ServiceError::invalid_relationship(
                "task does not belong to the given todo list",
            ));
        }
        Ok(task)
    }
}
