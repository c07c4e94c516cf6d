use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::types::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub username: String,
    /// Id of the login session the token belongs to
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// What a successfully verified token tells the caller
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub user_id: UserId,
    pub session_id: Uuid,
    pub email: String,
}

/// Turns a bearer token into a caller identity.
pub trait TokenVerifier: Send + Sync {
    fn verify_token(&self, token: &str) -> Result<VerifiedToken, AuthError>;
}

/// HS256 signing and verification keys derived from the configured secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        // One year at most
        let hours = expiry_hours.min(24 * 365) as i64;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(hours),
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    /// Lifetime of issued tokens; sessions use the same value
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn issue(&self, user: &User, session_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            jti: session_id,
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}

impl TokenVerifier for JwtKeys {
    fn verify_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(VerifiedToken {
            user_id: data.claims.sub,
            session_id: data.claims.jti,
            email: data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::generate(),
            username: "ana_dev".to_string(),
            name: "Ana Developer".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_to_the_same_user_and_session() {
        let keys = JwtKeys::new("test-secret", 1).unwrap();
        let user = user();
        let session = Uuid::new_v4();

        let token = keys.issue(&user, session).unwrap();
        let verified = keys.verify_token(&token).unwrap();

        assert_eq!(verified.user_id, user.id);
        assert_eq!(verified.session_id, session);
        assert_eq!(verified.email, user.email);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = JwtKeys::new("one-secret", 1).unwrap().issue(&user(), Uuid::new_v4()).unwrap();
        let result = JwtKeys::new("another-secret", 1).unwrap().verify_token(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(JwtKeys::new("", 1), Err(AuthError::MissingSecret)));
    }
}
