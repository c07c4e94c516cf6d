// handlers/protected/tasks.rs - /api/projects/:project_id/todolists/:todo_list_id/tasks[...]

use axum::{extract::State, Extension};

use crate::api::{CreateTaskRequest, ReorderRequest, TaskStatusRequest, TaskView, UpdateTaskRequest};
use crate::error::ApiError;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::reorder::parse_task_ids;
use crate::state::AppState;
use crate::types::{ProjectId, TaskId, TodoListId};

type ListPath = (ProjectId, TodoListId);
type TaskPath = (ProjectId, TodoListId, TaskId);

/// POST - new tasks start open and go to the end of the list
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id)): ApiPath<ListPath>,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> ApiResult<TaskView> {
    let task = state
        .services
        .tasks
        .create(&user, project_id, todo_list_id, payload)
        .await?;
    Ok(ApiResponse::created(TaskView::new(task, project_id)))
}

/// GET - tasks ascending by position
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id)): ApiPath<ListPath>,
) -> ApiResult<Vec<TaskView>> {
    let tasks = state.services.tasks.list(&user, project_id, todo_list_id).await?;
    Ok(ApiResponse::success(TaskView::many(tasks, project_id)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id, task_id)): ApiPath<TaskPath>,
) -> ApiResult<TaskView> {
    let task = state
        .services
        .tasks
        .get(&user, project_id, todo_list_id, task_id)
        .await?;
    Ok(ApiResponse::success(TaskView::new(task, project_id)))
}

/// PUT - omitted fields stay, `null` clears description or dueDate
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id, task_id)): ApiPath<TaskPath>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> ApiResult<TaskView> {
    let task = state
        .services
        .tasks
        .update(&user, project_id, todo_list_id, task_id, payload)
        .await?;
    Ok(ApiResponse::success(TaskView::new(task, project_id)))
}

/// PATCH .../:task_id/status - `{"completed": bool}`
pub async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id, task_id)): ApiPath<TaskPath>,
    ApiJson(payload): ApiJson<TaskStatusRequest>,
) -> ApiResult<TaskView> {
    let task = state
        .services
        .tasks
        .set_status(&user, project_id, todo_list_id, task_id, payload.completed)
        .await?;
    Ok(ApiResponse::success(TaskView::new(task, project_id)))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id, task_id)): ApiPath<TaskPath>,
) -> ApiResult<()> {
    state
        .services
        .tasks
        .delete(&user, project_id, todo_list_id, task_id)
        .await?;
    Ok(ApiResponse::no_content())
}

/// PATCH .../tasks/reorder - `{"taskIds": [...]}` in the desired order
///
/// The ids must be exactly the list's current tasks. Answers with the tasks
/// in their new order.
pub async fn reorder(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, todo_list_id)): ApiPath<ListPath>,
    ApiJson(payload): ApiJson<ReorderRequest>,
) -> ApiResult<Vec<TaskView>> {
    let raw_ids = payload
        .task_ids
        .ok_or_else(|| ApiError::bad_request("taskIds is required"))?;
    let task_ids = parse_task_ids(&raw_ids)?;

    let tasks = state
        .services
        .tasks
        .reorder(&user, project_id, todo_list_id, &task_ids)
        .await?;
    Ok(ApiResponse::success(TaskView::many(tasks, project_id)))
}
