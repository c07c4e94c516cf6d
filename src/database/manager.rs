use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Tables are created on startup when missing. Children reference parents
/// with ON DELETE CASCADE so removing a project removes its lists and tasks.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        username      VARCHAR(100) NOT NULL,
        name          VARCHAR(100) NOT NULL,
        email         VARCHAR(255) NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id          UUID PRIMARY KEY,
        name        VARCHAR(255) NOT NULL,
        description TEXT,
        owner_id    UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS todo_lists (
        id         UUID PRIMARY KEY,
        name       VARCHAR(255) NOT NULL,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        UNIQUE (project_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id           UUID PRIMARY KEY,
        title        VARCHAR(255) NOT NULL,
        description  TEXT,
        completed    BOOLEAN NOT NULL DEFAULT false,
        due_date     DATE,
        todo_list_id UUID NOT NULL REFERENCES todo_lists(id) ON DELETE CASCADE,
        position     INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects (owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_list_position ON tasks (todo_list_id, position)",
];

/// Connection pool construction and schema bootstrap for the Postgres backend
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool using the configured URL and sizing
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(pool)
    }

    /// Create any missing tables and indexes
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Database schema verified");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
