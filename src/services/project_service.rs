use std::sync::Arc;
use validator::Validate;

use super::{Deadline, ListLocks, OwnershipValidator, ServiceError};
use crate::api::{CreateProjectRequest, UpdateProjectRequest};
use crate::auth::IdentityContext;
use crate::database::models::Project;
use crate::store::{ProjectStore, TaskStore, TodoListStore};
use crate::types::ProjectId;

#[derive(Clone)]
pub struct ProjectService {
    projects: Arc<dyn ProjectStore>,
    todo_lists: Arc<dyn TodoListStore>,
    tasks: Arc<dyn TaskStore>,
    validator: OwnershipValidator,
    locks: ListLocks,
    deadline: Deadline,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        todo_lists: Arc<dyn TodoListStore>,
        tasks: Arc<dyn TaskStore>,
        validator: OwnershipValidator,
        locks: ListLocks,
        deadline: Deadline,
    ) -> Self {
        Self {
            projects,
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
        request: CreateProjectRequest,
    ) -> Result<Project, ServiceError> {
        request.validate()?;

        let project = Project::new(request.name, request.description, caller.current_user());
        let saved = self.deadline.run("project save", self.projects.save(&project)).await?;

        tracing::info!("User {} created project {}", saved.owner_id, saved.id);
        Ok(saved)
    }

    pub async fn get(&self, caller: &dyn IdentityContext, id: ProjectId) -> Result<Project, ServiceError> {
        self.validator.validate_project_ownership(caller, id).await
    }

    /// Projects owned by the caller, oldest first.
    ///
    /// The store query is already scoped to the owner; each row is checked
    /// again and anything foreign is dropped.
    pub async fn list_mine(&self, caller: &dyn IdentityContext) -> Result<Vec<Project>, ServiceError> {
        let user_id = caller.current_user();
        let projects = self
            .deadline
            .run("project listing", self.projects.find_by_owner(user_id))
            .await?;

        let total = projects.len();
        let owned: Vec<Project> = projects.into_iter().filter(|p| p.is_owned_by(user_id)).collect();
        if owned.len() != total {
            tracing::warn!(
                "Dropped {} foreign projects from listing for user {}",
                total - owned.len(),
                user_id
            );
        }
        Ok(owned)
    }

    pub async fn update(
        &self,
        caller: &dyn IdentityContext,
        id: ProjectId,
        patch: UpdateProjectRequest,
    ) -> Result<Project, ServiceError> {
        patch.validate()?;

        let mut project = self.validator.validate_project_ownership(caller, id).await?;
        patch.name.apply_required(&mut project.name);
        patch.description.apply_to(&mut project.description);

        let saved = self.deadline.run("project save", self.projects.save(&project)).await?;
        tracing::info!("User {} updated project {}", caller.current_user(), id);
        Ok(saved)
    }

    /// Delete the project together with its lists and their tasks. Each
    /// list is cleared while holding its lock.
    pub async fn delete(&self, caller: &dyn IdentityContext, id: ProjectId) -> Result<(), ServiceError> {
        self.validator.validate_project_ownership(caller, id).await?;

        let lists = self
            .deadline
            .run("todo list listing", self.todo_lists.find_by_project_id(id))
            .await?;
        for list in &lists {
            let _guard = self.locks.lock(list.id).await;
            self.deadline
                .run("task cascade", self.tasks.delete_by_todo_list_id(list.id))
                .await?;
            self.deadline
                .run("todo list delete", self.todo_lists.delete(list.id))
                .await?;
        }
        self.deadline.run("project delete", self.projects.delete(id)).await?;

        tracing::info!(
            "User {} deleted project {} ({} todo lists)",
            caller.current_user(),
            id,
            lists.len()
        );
        Ok(())
    }
}
