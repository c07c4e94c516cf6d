use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use super::ServiceError;
use crate::store::StoreError;

tokio::task_local! {
    /// Expiry of the request currently being served
    static EXPIRES_AT: Instant;
}

/// Request-scoped deadline for store calls.
///
/// [`Deadline::scope`] fixes one expiry instant, `limit` from now, for
/// everything awaited inside it, and every [`Deadline::run`] in that scope
/// races the same instant. Nested scopes keep the outer instant. A call made
/// outside any scope gets the full `limit` to itself.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Run `fut` with one shared budget for all of its store calls
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        if EXPIRES_AT.try_with(|_| ()).is_ok() {
            return fut.await;
        }
        EXPIRES_AT.scope(Instant::now() + self.limit, fut).await
    }

    fn expires_at(&self) -> Instant {
        EXPIRES_AT
            .try_with(|at| *at)
            .unwrap_or_else(|_| Instant::now() + self.limit)
    }

    /// Run one store call against the current deadline.
    ///
    /// Store failures are converted into `ServiceError`; an elapsed deadline
    /// becomes `ServiceError::Timeout` regardless of what the call would
    /// eventually have returned.
    pub async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let started = Instant::now();

        match timeout_at(self.expires_at(), fut).await {
            Ok(Ok(value)) => {
                tracing::trace!("Store call {} completed in {:?}", operation, started.elapsed());
                Ok(value)
            }
            Ok(Err(StoreError::Database(err))) => {
                tracing::error!("Store call {} failed: {}", operation, err);
                Err(ServiceError::Store(StoreError::Database(err)))
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_elapsed) => {
                tracing::error!("Store call {} ran past the {:?} request deadline", operation, self.limit);
                Err(ServiceError::Timeout {
                    operation,
                    limit: self.limit,
                })
            }
        }
    }
}
