//! Authorization gate, reordering engine and the resource services built on
//! top of them.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{JwtKeys, PasswordHasher, SessionStore};
use crate::store::{MemoryStore, PgStore, ProjectStore, TaskStore, TodoListStore, UserStore};

pub mod deadline;
pub mod error;
pub mod locks;
pub mod ownership;
pub mod project_service;
pub mod reorder;
pub mod task_service;
pub mod todo_list_service;
pub mod user_service;

pub use deadline::Deadline;
pub use error::ServiceError;
pub use locks::ListLocks;
pub use ownership::OwnershipValidator;
pub use project_service::ProjectService;
pub use reorder::ReorderingEngine;
pub use task_service::TaskService;
pub use todo_list_service::TodoListService;
pub use user_service::UserService;

/// The store ports the services are built from
#[derive(Clone)]
pub struct Stores {
    pub projects: Arc<dyn ProjectStore>,
    pub todo_lists: Arc<dyn TodoListStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    pub fn memory() -> Self {
        Self::from_adapter(MemoryStore::new())
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::from_adapter(PgStore::new(pool))
    }

    fn from_adapter<S>(store: S) -> Self
    where
        S: ProjectStore + TodoListStore + TaskStore + UserStore + Clone + 'static,
    {
        Self {
            projects: Arc::new(store.clone()),
            todo_lists: Arc::new(store.clone()),
            tasks: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }
}

/// Everything the HTTP layer calls into
#[derive(Clone)]
pub struct Services {
    pub projects: ProjectService,
    pub todo_lists: TodoListService,
    pub tasks: TaskService,
    pub users: UserService,
}

impl Services {
    pub fn new(
        stores: Stores,
        hasher: Arc<dyn PasswordHasher>,
        sessions: Arc<dyn SessionStore>,
        keys: JwtKeys,
        single_session: bool,
        request_timeout: Duration,
    ) -> Self {
        let deadline = Deadline::new(request_timeout);
        let users = UserService::new(stores.users.clone(), hasher, sessions, keys, single_session, deadline);
        Self::assemble(stores, users, ListLocks::new(), deadline)
    }

    /// Every service that touches a list's tasks shares `locks`
    fn assemble(stores: Stores, users: UserService, locks: ListLocks, deadline: Deadline) -> Self {
        let validator = OwnershipValidator::new(stores.projects.clone(), stores.todo_lists.clone(), deadline);
        let engine = ReorderingEngine::new(validator.clone(), stores.tasks.clone(), locks.clone(), deadline);

        Self {
            projects: ProjectService::new(
                stores.projects.clone(),
                stores.todo_lists.clone(),
                stores.tasks.clone(),
                validator.clone(),
                locks.clone(),
                deadline,
            ),
            todo_lists: TodoListService::new(
                stores.todo_lists.clone(),
                stores.tasks.clone(),
                validator.clone(),
                locks.clone(),
                deadline,
            ),
            tasks: TaskService::new(stores.tasks, validator, engine, locks, deadline),
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CreateProjectRequest, CreateTaskRequest, TodoListRequest, UpdateProjectRequest, UpdateTaskRequest};
    use crate::auth::{Argon2Hasher, InMemorySessionStore};
    use crate::database::models::Task;
    use crate::database::Patch;
    use crate::store::StoreError;
    use crate::types::{ProjectId, TaskId, TodoListId, UserId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn services() -> Services {
        Services::new(
            Stores::memory(),
            Arc::new(Argon2Hasher::new()),
            Arc::new(InMemorySessionStore::new()),
            JwtKeys::new("test-secret", 1).unwrap(),
            false,
            Duration::from_secs(5),
        )
    }

    /// Memory task store that can stall one lookup or fail removals
    #[derive(Default)]
    struct InstrumentedTasks {
        inner: MemoryStore,
        stall_next_lookup: AtomicBool,
        fail_removal: AtomicBool,
        writes: AtomicUsize,
    }

    impl InstrumentedTasks {
        fn wrote(&self) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TaskStore for InstrumentedTasks {
        async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
            let found = TaskStore::find_by_id(&self.inner, id).await?;
            if self.stall_next_lookup.swap(false, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Ok(found)
        }

        async fn find_by_todo_list_id(&self, todo_list_id: TodoListId) -> Result<Vec<Task>, StoreError> {
            self.inner.find_by_todo_list_id(todo_list_id).await
        }

        async fn insert(&self, task: &Task) -> Result<Task, StoreError> {
            self.wrote();
            self.inner.insert(task).await
        }

        async fn update(&self, task: &Task) -> Result<Task, StoreError> {
            self.wrote();
            self.inner.update(task).await
        }

        async fn save_positions(&self, todo_list_id: TodoListId, tasks: &[Task]) -> Result<Vec<Task>, StoreError> {
            self.wrote();
            self.inner.save_positions(todo_list_id, tasks).await
        }

        async fn remove(&self, todo_list_id: TodoListId, id: TaskId) -> Result<Vec<Task>, StoreError> {
            self.wrote();
            if self.fail_removal.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            self.inner.remove(todo_list_id, id).await
        }

        async fn delete_by_todo_list_id(&self, todo_list_id: TodoListId) -> Result<(), StoreError> {
            self.wrote();
            self.inner.delete_by_todo_list_id(todo_list_id).await
        }
    }

    struct Harness {
        services: Services,
        tasks: Arc<InstrumentedTasks>,
        locks: ListLocks,
        owner: UserId,
    }

    impl Harness {
        fn new() -> Self {
            let tasks = Arc::new(InstrumentedTasks::default());
            let memory = tasks.inner.clone();
            let locks = ListLocks::new();
            let deadline = Deadline::new(Duration::from_secs(5));
            let stores = Stores {
                projects: Arc::new(memory.clone()),
                todo_lists: Arc::new(memory.clone()),
                tasks: tasks.clone(),
                users: Arc::new(memory),
            };
            let users = UserService::new(
                stores.users.clone(),
                Arc::new(Argon2Hasher::new()),
                Arc::new(InMemorySessionStore::new()),
                JwtKeys::new("test-secret", 1).unwrap(),
                false,
                deadline,
            );

            Self {
                services: Services::assemble(stores, users, locks.clone(), deadline),
                tasks,
                locks,
                owner: UserId::generate(),
            }
        }

        /// A project with one list holding tasks titled `titles`, in order
        async fn seed(&self, titles: &[&str]) -> (ProjectId, TodoListId, Vec<TaskId>) {
            let s = &self.services;
            let project = s.projects.create(&self.owner, project_request("Home project")).await.unwrap();
            let list = s
                .todo_lists
                .create(&self.owner, project.id, list_request("Errands"))
                .await
                .unwrap();
            let mut ids = Vec::new();
            for title in titles {
                let task = s
                    .tasks
                    .create(&self.owner, project.id, list.id, task_request(title))
                    .await
                    .unwrap();
                ids.push(task.id);
            }
            (project.id, list.id, ids)
        }

        async fn stored_positions(&self, list: TodoListId) -> Vec<(TaskId, i32)> {
            let tasks = self.tasks.inner.find_by_todo_list_id(list).await.unwrap();
            tasks.iter().map(|t| (t.id, t.position)).collect()
        }
    }

    fn project_request(name: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            name: name.to_string(),
            description: Some("things to do".to_string()),
        }
    }

    fn task_request(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: None,
            due_date: None,
        }
    }

    fn list_request(name: &str) -> TodoListRequest {
        TodoListRequest { name: name.to_string() }
    }

    #[tokio::test]
    async fn project_listing_only_shows_own_projects() {
        let s = services();
        let ana = UserId::generate();
        let bob = UserId::generate();
        s.projects.create(&ana, project_request("Ana project")).await.unwrap();
        s.projects.create(&bob, project_request("Bob project")).await.unwrap();

        let mine = s.projects.list_mine(&ana).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner_id, ana);
    }

    #[tokio::test]
    async fn project_update_patches_fields_and_keeps_owner() {
        let s = services();
        let ana = UserId::generate();
        let project = s.projects.create(&ana, project_request("Ana project")).await.unwrap();

        let patch = UpdateProjectRequest {
            name: Patch::Unchanged,
            description: Patch::Clear,
        };
        let updated = s.projects.update(&ana, project.id, patch).await.unwrap();
        assert_eq!(updated.name, "Ana project");
        assert_eq!(updated.description, None);
        assert_eq!(updated.owner_id, ana);

        let stranger = s
            .projects
            .update(&UserId::generate(), project.id, UpdateProjectRequest::default())
            .await;
        assert!(matches!(stranger, Err(ServiceError::Forbidden)));
    }

    #[tokio::test]
    async fn invalid_project_name_is_a_validation_error() {
        let s = services();
        let result = s.projects.create(&UserId::generate(), project_request("Solo")).await;
        assert!(matches!(result, Err(ServiceError::Validation { .. })));
    }

    #[tokio::test]
    async fn duplicate_list_name_is_a_conflict() {
        let s = services();
        let ana = UserId::generate();
        let project = s.projects.create(&ana, project_request("Ana project")).await.unwrap();
        s.todo_lists.create(&ana, project.id, list_request("Errands")).await.unwrap();

        let again = s.todo_lists.create(&ana, project.id, list_request("Errands")).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn tasks_are_appended_and_compacted_on_delete() {
        let s = services();
        let ana = UserId::generate();
        let project = s.projects.create(&ana, project_request("Ana project")).await.unwrap();
        let list = s.todo_lists.create(&ana, project.id, list_request("Errands")).await.unwrap();

        let mut ids = Vec::new();
        for title in ["Buy milk", "Walk dog", "Pay rent"] {
            let task = s.tasks.create(&ana, project.id, list.id, task_request(title)).await.unwrap();
            assert!(!task.completed);
            ids.push(task.id);
        }

        s.tasks.delete(&ana, project.id, list.id, ids[0]).await.unwrap();

        let remaining = s.tasks.list(&ana, project.id, list.id).await.unwrap();
        let summary: Vec<(TaskId, i32)> = remaining.iter().map(|t| (t.id, t.position)).collect();
        assert_eq!(summary, vec![(ids[1], 0), (ids[2], 1)]);
    }

    #[tokio::test]
    async fn task_checks_run_ownership_first() {
        let s = services();
        let ana = UserId::generate();
        let project = s.projects.create(&ana, project_request("Ana project")).await.unwrap();
        let errands = s.todo_lists.create(&ana, project.id, list_request("Errands")).await.unwrap();
        let chores = s.todo_lists.create(&ana, project.id, list_request("Chores")).await.unwrap();
        let task = s
            .tasks
            .create(&ana, project.id, errands.id, task_request("Buy milk"))
            .await
            .unwrap();

        // Strangers are stopped before the task is looked at
        let stranger = s.tasks.get(&UserId::generate(), project.id, errands.id, TaskId::generate()).await;
        assert!(matches!(stranger, Err(ServiceError::Forbidden)));

        let missing = s.tasks.get(&ana, project.id, errands.id, TaskId::generate()).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));

        let wrong_list = s.tasks.get(&ana, project.id, chores.id, task.id).await;
        assert!(matches!(wrong_list, Err(ServiceError::InvalidRelationship(_))));
    }

    #[tokio::test]
    async fn task_update_and_status_leave_position_alone() {
        let s = services();
        let ana = UserId::generate();
        let project = s.projects.create(&ana, project_request("Ana project")).await.unwrap();
        let list = s.todo_lists.create(&ana, project.id, list_request("Errands")).await.unwrap();
        s.tasks.create(&ana, project.id, list.id, task_request("Buy milk")).await.unwrap();
        let second = s
            .tasks
            .create(&ana, project.id, list.id, task_request("Walk dog"))
            .await
            .unwrap();

        let patch = UpdateTaskRequest {
            title: Patch::Set("Walk the dog".to_string()),
            description: Patch::Set("around the park".to_string()),
            due_date: Patch::Unchanged,
        };
        let updated = s.tasks.update(&ana, project.id, list.id, second.id, patch).await.unwrap();
        assert_eq!(updated.title, "Walk the dog");
        assert_eq!(updated.position, 1);

        let done = s.tasks.set_status(&ana, project.id, list.id, second.id, true).await.unwrap();
        assert!(done.completed);
        assert_eq!(done.position, 1);
    }

    #[tokio::test]
    async fn deleting_a_project_removes_its_lists_and_tasks() {
        let s = services();
        let ana = UserId::generate();
        let project = s.projects.create(&ana, project_request("Ana project")).await.unwrap();
        let list = s.todo_lists.create(&ana, project.id, list_request("Errands")).await.unwrap();
        let task = s
            .tasks
            .create(&ana, project.id, list.id, task_request("Buy milk"))
            .await
            .unwrap();

        s.projects.delete(&ana, project.id).await.unwrap();

        assert!(matches!(s.projects.get(&ana, project.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            s.todo_lists.get(&ana, project.id, list.id).await,
            Err(ServiceError::NotFound(_))
        ));
        let stores_task = s.tasks.get(&ana, project.id, list.id, task.id).await;
        assert!(matches!(stores_task, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn status_change_racing_a_delete_does_not_bring_the_task_back() {
        let h = Harness::new();
        let (project, list, ids) = h.seed(&["Buy milk", "Walk dog", "Pay rent"]).await;

        // The status change reads the task, then stalls before writing
        h.tasks.stall_next_lookup.store(true, Ordering::SeqCst);
        let status = {
            let tasks = h.services.tasks.clone();
            let owner = h.owner;
            let id = ids[0];
            tokio::spawn(async move { tasks.set_status(&owner, project, list, id, true).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        h.services.tasks.delete(&h.owner, project, list, ids[0]).await.unwrap();

        let result = status.await.unwrap();
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert_eq!(h.stored_positions(list).await, vec![(ids[1], 0), (ids[2], 1)]);
    }

    #[tokio::test]
    async fn task_create_queued_behind_a_list_delete_writes_nothing() {
        let h = Harness::new();
        let (project, list, _) = h.seed(&["Buy milk"]).await;

        // Queue the delete ahead of the create on the list lock
        let guard = h.locks.lock(list).await;
        let delete = {
            let lists = h.services.todo_lists.clone();
            let owner = h.owner;
            tokio::spawn(async move { lists.delete(&owner, project, list).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let create = {
            let tasks = h.services.tasks.clone();
            let owner = h.owner;
            tokio::spawn(async move { tasks.create(&owner, project, list, task_request("Walk dog")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        delete.await.unwrap().unwrap();
        let created = create.await.unwrap();
        assert!(matches!(created, Err(ServiceError::NotFound(_))));
        assert!(h.stored_positions(list).await.is_empty());
    }

    #[tokio::test]
    async fn task_create_queued_behind_a_project_delete_writes_nothing() {
        let h = Harness::new();
        let (project, list, _) = h.seed(&["Buy milk"]).await;

        let guard = h.locks.lock(list).await;
        let delete = {
            let projects = h.services.projects.clone();
            let owner = h.owner;
            tokio::spawn(async move { projects.delete(&owner, project).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let create = {
            let tasks = h.services.tasks.clone();
            let owner = h.owner;
            tokio::spawn(async move { tasks.create(&owner, project, list, task_request("Walk dog")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        delete.await.unwrap().unwrap();
        let created = create.await.unwrap();
        assert!(matches!(created, Err(ServiceError::NotFound(_))));
        assert!(h.stored_positions(list).await.is_empty());
    }

    #[tokio::test]
    async fn failed_task_delete_leaves_the_list_untouched() {
        let h = Harness::new();
        let (project, list, ids) = h.seed(&["Buy milk", "Walk dog", "Pay rent"]).await;
        let before = h.stored_positions(list).await;
        let writes_before = h.tasks.writes.load(Ordering::SeqCst);

        h.tasks.fail_removal.store(true, Ordering::SeqCst);
        let result = h.services.tasks.delete(&h.owner, project, list, ids[1]).await;

        assert!(matches!(result, Err(ServiceError::Store(_))));
        // Delete and renumber go to the store as a single write
        assert_eq!(h.tasks.writes.load(Ordering::SeqCst), writes_before + 1);
        assert_eq!(h.stored_positions(list).await, before);
    }
}
