use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AuthError;
use crate::types::UserId;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Login sessions. A token is only honoured while its session is active.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user_id: UserId, ttl: Duration) -> Result<Session, AuthError>;
    async fn is_active(&self, session_id: Uuid) -> Result<bool, AuthError>;
    async fn active_for_user(&self, user_id: UserId) -> Result<Option<Session>, AuthError>;
    async fn revoke(&self, session_id: Uuid) -> Result<(), AuthError>;
}

/// Process-local session store; expired entries are dropped lazily on access
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user_id: UserId, ttl: Duration) -> Result<Session, AuthError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn is_active(&self, session_id: Uuid) -> Result<bool, AuthError> {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&session_id).is_some_and(|s| !s.is_expired(now)))
    }

    async fn active_for_user(&self, user_id: UserId) -> Result<Option<Session>, AuthError> {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .find(|s| s.user_id == user_id && !s.is_expired(now))
            .cloned())
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AuthError> {
        self.sessions.write().await.remove(&session_id);
        Ok(())
    }
}
