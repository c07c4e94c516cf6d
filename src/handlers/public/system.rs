// handlers/public/system.rs - GET / and GET /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Todo API",
            "version": version,
            "description": "Projects, todo lists and ordered tasks, scoped to their owner",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/auth/login (public)",
                "register": "/api/users/register (public)",
                "auth": "/api/auth/me, /api/auth/session (protected)",
                "projects": "/api/projects[/:project_id] (protected)",
                "todolists": "/api/projects/:project_id/todolists[/:todo_list_id] (protected)",
                "tasks": "/api/projects/:project_id/todolists/:todo_list_id/tasks[/:task_id|/reorder] (protected)"
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let storage = state.storage.name();

    match state.storage.check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": storage
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "storage unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "storage": storage
                    }
                })),
            )
        }
    }
}
