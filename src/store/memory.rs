//! In-memory store adapter.
//!
//! All four ports share one `Arc<RwLock<..>>` so a clone of [`MemoryStore`]
//! sees the same data. Multi-row writes happen under a single write guard,
//! which makes them atomic with respect to every other store call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{same_membership, ProjectStore, StoreError, TaskStore, TodoListStore, UserStore};
use crate::database::models::{Project, Task, TodoList, User};
use crate::types::{ProjectId, TaskId, TodoListId, UserId};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
    todo_lists: HashMap<TodoListId, TodoList>,
    tasks: HashMap<TaskId, Task>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Vec<Project>, StoreError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|project| project.owner_id == owner_id)
            .cloned()
            .collect();
        projects.sort_by_key(|project| project.created_at);
        Ok(projects)
    }

    async fn save(&self, project: &Project) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        tables.projects.insert(project.id, project.clone());
        Ok(project.clone())
    }

    async fn delete(&self, id: ProjectId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.projects.remove(&id);

        let Tables { todo_lists, tasks, .. } = &mut *tables;
        todo_lists.retain(|_, list| list.project_id != id);
        tasks.retain(|_, task| todo_lists.contains_key(&task.todo_list_id));
        Ok(())
    }
}

#[async_trait]
impl TodoListStore for MemoryStore {
    async fn find_by_id(&self, id: TodoListId) -> Result<Option<TodoList>, StoreError> {
        Ok(self.tables.read().await.todo_lists.get(&id).cloned())
    }

    async fn find_by_id_and_project_id(
        &self,
        id: TodoListId,
        project_id: ProjectId,
    ) -> Result<Option<TodoList>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .todo_lists
            .get(&id)
            .filter(|list| list.project_id == project_id)
            .cloned())
    }

    async fn find_by_project_id(&self, project_id: ProjectId) -> Result<Vec<TodoList>, StoreError> {
        let tables = self.tables.read().await;
        let mut lists: Vec<TodoList> = tables
            .todo_lists
            .values()
            .filter(|list| list.project_id == project_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lists)
    }

    async fn exists_by_name_and_project_id(
        &self,
        name: &str,
        project_id: ProjectId,
    ) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .todo_lists
            .values()
            .any(|list| list.project_id == project_id && list.name == name))
    }

    async fn save(&self, todo_list: &TodoList) -> Result<TodoList, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&todo_list.project_id) {
            return Err(StoreError::NotFound(format!("project {}", todo_list.project_id)));
        }
        tables.todo_lists.insert(todo_list.id, todo_list.clone());
        Ok(todo_list.clone())
    }

    async fn delete(&self, id: TodoListId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.todo_lists.remove(&id);
        tables.tasks.retain(|_, task| task.todo_list_id != id);
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn find_by_todo_list_id(&self, todo_list_id: TodoListId) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|task| task.todo_list_id == todo_list_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.position);
        Ok(tasks)
    }

    async fn insert(&self, task: &Task) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.todo_lists.contains_key(&task.todo_list_id) {
            return Err(StoreError::NotFound(format!("todo list {}", task.todo_list_id)));
        }
        tables.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .tasks
            .get_mut(&task.id)
            .filter(|stored| stored.todo_list_id == task.todo_list_id)
            .ok_or_else(|| StoreError::NotFound(format!("task {}", task.id)))?;

        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.completed = task.completed;
        stored.due_date = task.due_date;
        Ok(stored.clone())
    }

    async fn save_positions(
        &self,
        todo_list_id: TodoListId,
        tasks: &[Task],
    ) -> Result<Vec<Task>, StoreError> {
        let mut tables = self.tables.write().await;

        let stored = tables
            .tasks
            .values()
            .filter(|task| task.todo_list_id == todo_list_id)
            .map(|task| task.id);
        if !same_membership(stored, tasks) {
            return Err(StoreError::Conflict(format!(
                "tasks of todo list {} changed during reorder",
                todo_list_id
            )));
        }

        let mut saved = Vec::with_capacity(tasks.len());
        for task in tasks {
            if let Some(existing) = tables.tasks.get_mut(&task.id) {
                existing.position = task.position;
                saved.push(existing.clone());
            }
        }
        saved.sort_by_key(|task| task.position);
        Ok(saved)
    }

    async fn remove(&self, todo_list_id: TodoListId, id: TaskId) -> Result<Vec<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.tasks.get(&id) {
            Some(task) if task.todo_list_id == todo_list_id => {}
            _ => return Err(StoreError::NotFound(format!("task {}", id))),
        }
        tables.tasks.remove(&id);

        let mut remaining: Vec<&mut Task> = tables
            .tasks
            .values_mut()
            .filter(|task| task.todo_list_id == todo_list_id)
            .collect();
        remaining.sort_by_key(|task| (task.position, task.id));
        for (rank, task) in remaining.iter_mut().enumerate() {
            task.position = i32::try_from(rank).unwrap_or(i32::MAX);
        }
        Ok(remaining.into_iter().map(|task| task.clone()).collect())
    }

    async fn delete_by_todo_list_id(&self, todo_list_id: TodoListId) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .tasks
            .retain(|_, task| task.todo_list_id != todo_list_id);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(UserStore::find_by_email(self, email).await?.is_some())
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|existing| existing.id != user.id && existing.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(list: TodoListId, position: i32) -> Task {
        Task::new(format!("task number {}", position), None, None, list, position)
    }

    /// A project with one list; returns both ids
    async fn seed_list(store: &MemoryStore) -> (ProjectId, TodoListId) {
        let project = ProjectStore::save(store, &Project::new("Home chores".to_string(), None, UserId::generate()))
            .await
            .unwrap();
        let list = TodoListStore::save(store, &TodoList::new("Kitchen".to_string(), project.id))
            .await
            .unwrap();
        (project.id, list.id)
    }

    async fn positions(store: &MemoryStore, list: TodoListId) -> Vec<(TaskId, i32)> {
        store
            .find_by_todo_list_id(list)
            .await
            .unwrap()
            .into_iter()
            .map(|task| (task.id, task.position))
            .collect()
    }

    #[tokio::test]
    async fn lists_tasks_in_position_order() {
        let store = MemoryStore::new();
        let (_, list) = seed_list(&store).await;
        let (_, other) = seed_list(&store).await;
        let second = task(list, 1);
        let first = task(list, 0);
        store.insert(&second).await.unwrap();
        store.insert(&first).await.unwrap();
        store.insert(&task(other, 0)).await.unwrap();

        let tasks = store.find_by_todo_list_id(list).await.unwrap();
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn insert_into_missing_list_is_not_found() {
        let store = MemoryStore::new();
        let result = store.insert(&task(TodoListId::generate(), 0)).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        let orphan_list = TodoListStore::save(&store, &TodoList::new("Nowhere".to_string(), ProjectId::generate())).await;
        assert!(matches!(orphan_list, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn save_positions_rejects_stale_membership() {
        let store = MemoryStore::new();
        let (_, list) = seed_list(&store).await;
        let a = task(list, 0);
        let b = task(list, 1);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        // A task added after the caller read the list
        store.insert(&task(list, 2)).await.unwrap();

        let mut moved_a = a.clone();
        moved_a.position = 1;
        let mut moved_b = b.clone();
        moved_b.position = 0;
        let result = store.save_positions(list, &[moved_b, moved_a]).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let untouched = TaskStore::find_by_id(&store, a.id).await.unwrap().unwrap();
        assert_eq!(untouched.position, 0);
    }

    #[tokio::test]
    async fn save_positions_only_touches_position() {
        let store = MemoryStore::new();
        let (_, list) = seed_list(&store).await;
        let mut a = task(list, 0);
        a.completed = true;
        store.insert(&a).await.unwrap();

        let mut stale = a.clone();
        stale.completed = false;
        stale.title = "renamed elsewhere".to_string();
        let saved = store.save_positions(list, &[stale]).await.unwrap();

        assert!(saved[0].completed);
        assert_eq!(saved[0].title, a.title);
    }

    #[tokio::test]
    async fn update_writes_content_but_not_position() {
        let store = MemoryStore::new();
        let (_, list) = seed_list(&store).await;
        let a = task(list, 0);
        store.insert(&a).await.unwrap();

        let mut edited = a.clone();
        edited.title = "task renamed".to_string();
        edited.position = 7;
        let saved = store.update(&edited).await.unwrap();

        assert_eq!(saved.title, "task renamed");
        assert_eq!(saved.position, 0);
    }

    #[tokio::test]
    async fn update_of_removed_task_writes_nothing() {
        let store = MemoryStore::new();
        let (_, list) = seed_list(&store).await;
        let a = task(list, 0);
        let b = task(list, 1);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();
        store.remove(list, a.id).await.unwrap();

        let mut stale = a.clone();
        stale.completed = true;
        let result = store.update(&stale).await;

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(positions(&store, list).await, vec![(b.id, 0)]);
    }

    #[tokio::test]
    async fn update_through_another_list_is_not_found() {
        let store = MemoryStore::new();
        let (_, list) = seed_list(&store).await;
        let (_, other) = seed_list(&store).await;
        let a = task(list, 0);
        store.insert(&a).await.unwrap();

        let mut moved = a.clone();
        moved.todo_list_id = other;
        assert!(matches!(store.update(&moved).await, Err(StoreError::NotFound(_))));
        assert_eq!(TaskStore::find_by_id(&store, a.id).await.unwrap().unwrap().todo_list_id, list);
    }

    #[tokio::test]
    async fn remove_closes_the_gap() {
        let store = MemoryStore::new();
        let (_, list) = seed_list(&store).await;
        let tasks: Vec<Task> = (0..4).map(|p| task(list, p)).collect();
        for t in &tasks {
            store.insert(t).await.unwrap();
        }

        let remaining = store.remove(list, tasks[1].id).await.unwrap();

        let expected = vec![(tasks[0].id, 0), (tasks[2].id, 1), (tasks[3].id, 2)];
        assert_eq!(remaining.iter().map(|t| (t.id, t.position)).collect::<Vec<_>>(), expected);
        assert_eq!(positions(&store, list).await, expected);
    }

    #[tokio::test]
    async fn remove_from_the_wrong_list_changes_nothing() {
        let store = MemoryStore::new();
        let (_, list) = seed_list(&store).await;
        let (_, other) = seed_list(&store).await;
        let a = task(list, 0);
        let b = task(list, 1);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        assert!(matches!(store.remove(other, a.id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.remove(list, TaskId::generate()).await, Err(StoreError::NotFound(_))));
        assert_eq!(positions(&store, list).await, vec![(a.id, 0), (b.id, 1)]);
    }

    #[tokio::test]
    async fn deleting_parents_cascades() {
        let store = MemoryStore::new();
        let (project, list) = seed_list(&store).await;
        let second_list = TodoListStore::save(&store, &TodoList::new("Garage".to_string(), project))
            .await
            .unwrap();
        store.insert(&task(list, 0)).await.unwrap();
        store.insert(&task(second_list.id, 0)).await.unwrap();

        TodoListStore::delete(&store, list).await.unwrap();
        assert!(store.find_by_todo_list_id(list).await.unwrap().is_empty());
        assert_eq!(store.find_by_todo_list_id(second_list.id).await.unwrap().len(), 1);

        ProjectStore::delete(&store, project).await.unwrap();
        assert!(TodoListStore::find_by_id(&store, second_list.id).await.unwrap().is_none());
        assert!(store.find_by_todo_list_id(second_list.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        let user = |email: &str| User {
            id: UserId::generate(),
            username: "ana_dev".to_string(),
            name: "Ana Dev".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            created_at: chrono::Utc::now(),
        };
        UserStore::save(&store, &user("ana@example.com")).await.unwrap();
        let result = UserStore::save(&store, &user("ANA@example.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }
}
