use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{IdentityContext, VerifiedToken};
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::UserId;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub session_id: Uuid,
    pub email: String,
}

impl From<VerifiedToken> for AuthUser {
    fn from(token: VerifiedToken) -> Self {
        Self {
            user_id: token.user_id,
            session_id: token.session_id,
            email: token.email,
        }
    }
}

impl IdentityContext for AuthUser {
    fn current_user(&self) -> UserId {
        self.user_id
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
///
/// The token must verify and its session must still be active; the
/// resulting `AuthUser` is inserted into the request extensions.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract JWT from Authorization header
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    // Validate and decode JWT
    let verified = state.verifier.verify_token(&token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    let active = state.sessions.is_active(verified.session_id).await.map_err(|e| {
        tracing::error!("Session lookup failed: {}", e);
        ApiError::service_unavailable("Session store unavailable")
    })?;
    if !active {
        tracing::debug!("Token for revoked session {} presented", verified.session_id);
        return Err(ApiError::unauthorized("Session has ended, please log in again"));
    }

    // Convert token to AuthUser and inject into request
    request.extensions_mut().insert(AuthUser::from(verified));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        assert!(extract_jwt_from_headers(&headers("Basic dXNlcg==")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
    }
}
