use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Give every store call made while serving this request one shared expiry
pub async fn request_deadline(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.deadline.scope(next.run(request)).await
}
