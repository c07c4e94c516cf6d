// handlers/protected/projects.rs - /api/projects[/:project_id]

use axum::{extract::State, Extension};

use crate::api::{CreateProjectRequest, UpdateProjectRequest};
use crate::database::models::Project;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::ProjectId;

/// POST /api/projects - the caller becomes the owner
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateProjectRequest>,
) -> ApiResult<Project> {
    let project = state.services.projects.create(&user, payload).await?;
    Ok(ApiResponse::created(project))
}

/// GET /api/projects - projects owned by the caller
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Project>> {
    let projects = state.services.projects.list_mine(&user).await?;
    Ok(ApiResponse::success(projects))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<ProjectId>,
) -> ApiResult<Project> {
    let project = state.services.projects.get(&user, project_id).await?;
    Ok(ApiResponse::success(project))
}

/// PUT /api/projects/:project_id - omitted fields are left as they are
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<ProjectId>,
    ApiJson(payload): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Project> {
    let project = state.services.projects.update(&user, project_id, payload).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/:project_id - also removes its lists and tasks
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<ProjectId>,
) -> ApiResult<()> {
    state.services.projects.delete(&user, project_id).await?;
    Ok(ApiResponse::no_content())
}
