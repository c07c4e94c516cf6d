// handlers/public/auth/register.rs - POST /api/users/register handler

use axum::extract::State;

use crate::api::{AuthTokenResponse, RegisterRequest};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/users/register - Create an account and log it in
///
/// Expected Input:
/// ```json
/// {
///   "username": "ana_dev",
///   "name": "Ana Developer",
///   "email": "ana@example.com",
///   "password": "Sup3r$ecret"
/// }
/// ```
///
/// Answers 201 with `{ "token": ... }`, 400 with `field_errors` when a
/// field is rejected and 409 when the email is taken.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<AuthTokenResponse> {
    let token = state.services.users.register(payload).await?;
    Ok(ApiResponse::created(AuthTokenResponse { token }))
}
