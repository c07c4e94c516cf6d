//! Postgres store adapter (sqlx).

use async_trait::async_trait;
use sqlx::PgPool;

use super::{same_membership, ProjectStore, StoreError, TaskStore, TodoListStore, UserStore};
use crate::database::models::{Project, Task, TodoList, User};
use crate::types::{ProjectId, TaskId, TodoListId, UserId};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn unique_violation_to_conflict(err: sqlx::Error, what: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(what),
        _ => StoreError::Database(err),
    }
}

/// A row whose parent vanished fails the foreign key
fn missing_parent_to_not_found(err: sqlx::Error, parent: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound(parent),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, name, description, owner_id, created_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Vec<Project>, StoreError> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT id, name, description, owner_id, created_at
             FROM projects
             WHERE owner_id = $1
             ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn save(&self, project: &Project) -> Result<Project, StoreError> {
        // owner_id and created_at are write-once
        let saved = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (id, name, description, owner_id, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description
             RETURNING id, name, description, owner_id, created_at",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.owner_id)
        .bind(project.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete(&self, id: ProjectId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TodoListStore for PgStore {
    async fn find_by_id(&self, id: TodoListId) -> Result<Option<TodoList>, StoreError> {
        let list = sqlx::query_as::<_, TodoList>("SELECT id, name, project_id FROM todo_lists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(list)
    }

    async fn find_by_id_and_project_id(
        &self,
        id: TodoListId,
        project_id: ProjectId,
    ) -> Result<Option<TodoList>, StoreError> {
        let list = sqlx::query_as::<_, TodoList>(
            "SELECT id, name, project_id FROM todo_lists WHERE id = $1 AND project_id = $2",
        )
        .bind(id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(list)
    }

    async fn find_by_project_id(&self, project_id: ProjectId) -> Result<Vec<TodoList>, StoreError> {
        let lists = sqlx::query_as::<_, TodoList>(
            "SELECT id, name, project_id FROM todo_lists WHERE project_id = $1 ORDER BY name",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    async fn exists_by_name_and_project_id(
        &self,
        name: &str,
        project_id: ProjectId,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM todo_lists WHERE name = $1 AND project_id = $2)",
        )
        .bind(name)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn save(&self, todo_list: &TodoList) -> Result<TodoList, StoreError> {
        sqlx::query_as::<_, TodoList>(
            "INSERT INTO todo_lists (id, name, project_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, name, project_id",
        )
        .bind(todo_list.id)
        .bind(&todo_list.name)
        .bind(todo_list.project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match missing_parent_to_not_found(e, format!("project {}", todo_list.project_id)) {
            StoreError::Database(e) => {
                unique_violation_to_conflict(e, format!("todo list '{}' already exists", todo_list.name))
            }
            other => other,
        })
    }

    async fn delete(&self, id: TodoListId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM todo_lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

const TASK_COLUMNS: &str = "id, title, description, completed, due_date, todo_list_id, position";

#[async_trait]
impl TaskStore for PgStore {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_by_todo_list_id(&self, todo_list_id: TodoListId) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE todo_list_id = $1 ORDER BY position, id",
            TASK_COLUMNS
        ))
        .bind(todo_list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn insert(&self, task: &Task) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks ({cols})
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {cols}",
            cols = TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.due_date)
        .bind(task.todo_list_id)
        .bind(task.position)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_parent_to_not_found(e, format!("todo list {}", task.todo_list_id)))
    }

    async fn update(&self, task: &Task) -> Result<Task, StoreError> {
        // todo_list_id and position only move through save_positions and remove
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $3, description = $4, completed = $5, due_date = $6
             WHERE id = $1 AND todo_list_id = $2
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(task.todo_list_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.due_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("task {}", task.id)))
    }

    async fn save_positions(
        &self,
        todo_list_id: TodoListId,
        tasks: &[Task],
    ) -> Result<Vec<Task>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row locks keep other writers out of this list until commit
        let stored: Vec<TaskId> =
            sqlx::query_scalar("SELECT id FROM tasks WHERE todo_list_id = $1 FOR UPDATE")
                .bind(todo_list_id)
                .fetch_all(&mut *tx)
                .await?;

        if !same_membership(stored, tasks) {
            // Dropping the transaction rolls it back
            return Err(StoreError::Conflict(format!(
                "tasks of todo list {} changed during reorder",
                todo_list_id
            )));
        }

        for task in tasks {
            sqlx::query("UPDATE tasks SET position = $1 WHERE id = $2")
                .bind(task.position)
                .bind(task.id)
                .execute(&mut *tx)
                .await?;
        }

        let saved = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE todo_list_id = $1 ORDER BY position",
            TASK_COLUMNS
        ))
        .bind(todo_list_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn remove(&self, todo_list_id: TodoListId, id: TaskId) -> Result<Vec<Task>, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM tasks WHERE todo_list_id = $1 FOR UPDATE")
            .bind(todo_list_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1 AND todo_list_id = $2")
            .bind(id)
            .bind(todo_list_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("task {}", id)));
        }

        sqlx::query(
            "UPDATE tasks SET position = ranked.position
             FROM (
                SELECT id, (ROW_NUMBER() OVER (ORDER BY position, id) - 1)::INTEGER AS position
                FROM tasks
                WHERE todo_list_id = $1
             ) AS ranked
             WHERE tasks.id = ranked.id AND tasks.position <> ranked.position",
        )
        .bind(todo_list_id)
        .execute(&mut *tx)
        .await?;

        let remaining = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE todo_list_id = $1 ORDER BY position",
            TASK_COLUMNS
        ))
        .bind(todo_list_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(remaining)
    }

    async fn delete_by_todo_list_id(&self, todo_list_id: TodoListId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM tasks WHERE todo_list_id = $1")
            .bind(todo_list_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, name, email, password_hash, created_at
             FROM users
             WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, name, email, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, username, name, email, password_hash, created_at",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_to_conflict(e, format!("email {} already registered", user.email)))
    }
}
