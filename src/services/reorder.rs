use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{Deadline, ListLocks, OwnershipValidator, ServiceError};
use crate::auth::IdentityContext;
use crate::database::models::Task;
use crate::store::TaskStore;
use crate::types::{ProjectId, TaskId, TodoListId};

/// Reassigns task positions of one todo list to a caller supplied order.
#[derive(Clone)]
pub struct ReorderingEngine {
    validator: OwnershipValidator,
    tasks: Arc<dyn TaskStore>,
    locks: ListLocks,
    deadline: Deadline,
}

impl ReorderingEngine {
    pub fn new(
        validator: OwnershipValidator,
        tasks: Arc<dyn TaskStore>,
        locks: ListLocks,
        deadline: Deadline,
    ) -> Self {
        Self {
            validator,
            tasks,
            locks,
            deadline,
        }
    }

    /// Apply `ordered_task_ids` as the new order of the list's tasks.
    ///
    /// The whole id list is validated against the current task set before
    /// anything is written, and the write itself is a single
    /// `save_positions` call, so a failed reorder leaves every position as it
    /// was. Returns the tasks ascending by their new position. All store
    /// calls share one deadline even when called outside a request.
    pub async fn reorder(
        &self,
        caller: &dyn IdentityContext,
        project_id: ProjectId,
        todo_list_id: TodoListId,
        ordered_task_ids: &[TaskId],
    ) -> Result<Vec<Task>, ServiceError> {
        self.deadline
            .scope(async {
                self.validator
                    .validate_todo_list_ownership(caller, todo_list_id, project_id)
                    .await?;

                let _guard = self.locks.lock(todo_list_id).await;

                let current = self
                    .deadline
                    .run("task listing", self.tasks.find_by_todo_list_id(todo_list_id))
                    .await?;

                let planned = plan_positions(current, ordered_task_ids)?;

                let saved = self
                    .deadline
                    .run("task reorder", self.tasks.save_positions(todo_list_id, &planned))
                    .await?;

                tracing::info!(
                    "User {} reordered {} tasks in todo list {}",
                    caller.current_user(),
                    saved.len(),
                    todo_list_id
                );
                Ok::<_, ServiceError>(saved)
            })
            .await
    }
}

/// Check that `ordered` is exactly a permutation of `current` and return the
/// tasks in that order with dense positions `0..n`.
pub fn plan_positions(current: Vec<Task>, ordered: &[TaskId]) -> Result<Vec<Task>, ServiceError> {
    let mut seen = HashSet::with_capacity(ordered.len());
    if !ordered.iter().all(|id| seen.insert(*id)) {
        return Err(ServiceError::bad_request("duplicate task ids"));
    }

    let mut by_id: HashMap<TaskId, Task> = current.into_iter().map(|task| (task.id, task)).collect();

    if ordered.iter().any(|id| !by_id.contains_key(id)) {
        return Err(ServiceError::bad_request("some tasks do not belong to the list"));
    }
    if ordered.len() != by_id.len() {
        return Err(ServiceError::bad_request("tasks are missing"));
    }

    ordered
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let mut task = by_id
                .remove(id)
                .ok_or_else(|| ServiceError::bad_request("some tasks do not belong to the list"))?;
            task.position = i32::try_from(index).map_err(|_| ServiceError::bad_request("too many tasks"))?;
            Ok(task)
        })
        .collect()
}

/// Parse raw ids from a request body; any malformed entry is a bad request.
pub fn parse_task_ids(raw: &[String]) -> Result<Vec<TaskId>, ServiceError> {
    raw.iter()
        .map(|id| {
            id.parse::<TaskId>()
                .map_err(|_| ServiceError::bad_request(format!("invalid task id '{}'", id)))
        })
        .collect()
}
