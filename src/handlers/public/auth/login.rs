// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;

use crate::api::{AuthTokenResponse, LoginRequest};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/login - Authenticate user and receive JWT token
///
/// Expected Input:
/// ```json
/// { "email": "ana@example.com", "password": "Sup3r$ecret" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "data": { "token": "eyJhbGciOiJIUzI1NiI..." } }
/// ```
///
/// Unknown email and wrong password both answer 401 with the same message.
/// With single-session enabled a user who is still logged in gets 409.
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<AuthTokenResponse> {
    let token = state.services.users.login(payload).await?;
    Ok(ApiResponse::success(AuthTokenResponse { token }))
}
