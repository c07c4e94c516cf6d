// handlers/protected/todo_lists.rs - /api/projects/:project_id/todolists[/:todo_list_id]

use axum::{extract::State, Extension};

use crate::api::TodoListRequest;
use crate::database::models::TodoList;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::{ProjectId, TodoListId};

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<ProjectId>,
    ApiJson(payload): ApiJson<TodoListRequest>,
) -> ApiResult<TodoList> {
    let todo_list = state.services.todo_lists.create(&user, project_id, payload).await?;
    Ok(ApiResponse::created(todo_list))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<ProjectId>,
) -> ApiResult<Vec<TodoList>> {
    let todo_lists = state.services.todo_lists.list(&user, project_id).await?;
    Ok(ApiResponse::success(todo_lists))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id)): ApiPath<(ProjectId, TodoListId)>,
) -> ApiResult<TodoList> {
    let todo_list = state.services.todo_lists.get(&user, project_id, todo_list_id).await?;
    Ok(ApiResponse::success(todo_list))
}

/// PUT - rename; another list of the same project with that name is a 409
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id)): ApiPath<(ProjectId, TodoListId)>,
    ApiJson(payload): ApiJson<TodoListRequest>,
) -> ApiResult<TodoList> {
    let todo_list = state
        .services
        .todo_lists
        .rename(&user, project_id, todo_list_id, payload)
        .await?;
    Ok(ApiResponse::success(todo_list))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id)): ApiPath<(ProjectId, TodoListId)>,
) -> ApiResult<()> {
    state.services.todo_lists.delete(&user, project_id, todo_list_id).await?;
    Ok(ApiResponse::no_content())
}
