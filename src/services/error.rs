use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Failures raised by the ownership gate, the reordering engine and the
/// resource services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("you do not have permission to access this resource")]
    Forbidden,

    /// Parent and child ids are individually valid but unrelated
    #[error("{0}")]
    InvalidRelationship(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{operation} did not complete within {limit:?}")]
    Timeout { operation: &'static str, limit: Duration },

    #[error("storage failure: {0}")]
    Store(#[source] StoreError),

    /// Failure inside the service itself (token signing, hashing)
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn invalid_relationship(message: impl Into<String>) -> Self {
        ServiceError::InvalidRelationship(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ServiceError::Unauthorized(message.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) | AuthError::SessionInactive => {
                ServiceError::Unauthorized(err.to_string())
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                (field.to_string(), message)
            })
            .collect();

        ServiceError::Validation {
            message: "Validation failed".to_string(),
            field_errors,
        }
    }
}
