use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{Deadline, ServiceError};
use crate::api::{LoginRequest, RegisterRequest};
use crate::auth::{IdentityContext, JwtKeys, PasswordHasher, SessionStore};
use crate::database::models::User;
use crate::store::UserStore;
use crate::types::UserId;

const BAD_CREDENTIALS: &str = "invalid email or password";

/// Registration, login and logout.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: Arc<dyn SessionStore>,
    keys: JwtKeys,
    single_session: bool,
    deadline: Deadline,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: Arc<dyn SessionStore>,
        keys: JwtKeys,
        single_session: bool,
        deadline: Deadline,
    ) -> Self {
        Self {
            users,
            hasher,
            sessions,
            keys,
            single_session,
            deadline,
        }
    }

    /// Create an account and log it in; returns the new token.
    pub async fn register(&self, request: RegisterRequest) -> Result<String, ServiceError> {
        request.validate()?;

        let taken = self
            .deadline
            .run("email check", self.users.exists_by_email(&request.email))
            .await?;
        if taken {
            return Err(ServiceError::conflict("email is already registered"));
        }

        let password_hash = self.hash_password(request.password).await?;
        let user = User {
            id: UserId::generate(),
            username: request.username,
            name: request.name,
            email: request.email,
            password_hash,
            created_at: Utc::now(),
        };
        let saved = self.deadline.run("user save", self.users.save(&user)).await?;

        tracing::info!("Registered user {} ({})", saved.id, saved.username);
        self.start_session(&saved).await
    }

    /// Check credentials and open a session; returns the token.
    ///
    /// Unknown email and wrong password fail with the same message.
    pub async fn login(&self, request: LoginRequest) -> Result<String, ServiceError> {
        request.validate()?;

        let user = self
            .deadline
            .run("user lookup", self.users.find_by_email(&request.email))
            .await?;
        let Some(user) = user else {
            tracing::warn!("Login attempt for unknown email");
            return Err(ServiceError::unauthorized(BAD_CREDENTIALS));
        };

        if !self.verify_password(request.password, user.password_hash.clone()).await? {
            tracing::warn!("Failed login for user {}", user.id);
            return Err(ServiceError::unauthorized(BAD_CREDENTIALS));
        }

        if self.single_session && self.sessions.active_for_user(user.id).await?.is_some() {
            tracing::warn!("Rejected second login for user {}", user.id);
            return Err(ServiceError::conflict("user already logged in"));
        }

        self.start_session(&user).await
    }

    pub async fn logout(&self, caller: &dyn IdentityContext, session_id: Uuid) -> Result<(), ServiceError> {
        self.sessions.revoke(session_id).await?;
        tracing::info!("User {} logged out of session {}", caller.current_user(), session_id);
        Ok(())
    }

    pub async fn me(&self, caller: &dyn IdentityContext) -> Result<User, ServiceError> {
        let user_id = caller.current_user();
        self.deadline
            .run("user lookup", self.users.find_by_id(user_id))
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {}", user_id)))
    }

    async fn start_session(&self, user: &User) -> Result<String, ServiceError> {
        let session = self.sessions.create(user.id, self.keys.expiry()).await?;
        let token = self.keys.issue(user, session.id)?;
        tracing::info!("User {} logged in (session {})", user.id, session.id);
        Ok(token)
    }

    // Hashing runs on the blocking pool
    async fn hash_password(&self, password: String) -> Result<String, ServiceError> {
        let hasher = Arc::clone(&self.hasher);
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))??;
        Ok(hashed)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, ServiceError> {
        let hasher = Arc::clone(&self.hasher);
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))??;
        Ok(verified)
    }
}
