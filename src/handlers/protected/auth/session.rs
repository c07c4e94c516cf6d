use axum::{extract::State, Extension};

use crate::api::UserView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/auth/me - Profile of the authenticated user
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserView> {
    let profile = state.services.users.me(&user).await?;
    Ok(ApiResponse::success(UserView::from(profile)))
}

/// DELETE /api/auth/session - Revoke the session the token belongs to
///
/// The token stops working immediately, and with single-session enabled the
/// user may log in again.
pub async fn logout(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<()> {
    state.services.users.logout(&user, user.session_id).await?;
    Ok(ApiResponse::no_content())
}
