//! Caller identity, token issuance/verification, password hashing and
//! login sessions.

use thiserror::Error;

use crate::types::UserId;

pub mod jwt;
pub mod password;
pub mod session;

pub use jwt::{Claims, JwtKeys, TokenVerifier, VerifiedToken};
pub use password::{Argon2Hasher, PasswordHasher};
pub use session::{InMemorySessionStore, Session, SessionStore};

/// Resolves the caller of the current request.
///
/// Services never look at tokens; they only ask this for the user id.
pub trait IdentityContext: Send + Sync {
    fn current_user(&self) -> UserId;
}

impl IdentityContext for UserId {
    fn current_user(&self) -> UserId {
        *self
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Session is no longer active")]
    SessionInactive,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Session store error: {0}")]
    SessionStore(String),
}
