//! Time-bounded store calls

use std::future::Future;
use std::time::Duration;

use crate::domain::DomainError;

/// Run a store call, failing with [`DomainError::Timeout`] once `limit` elapses
pub async fn with_deadline<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = Result<T, DomainError>>,
) -> Result<T, DomainError> {
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        DomainError::timeout(format!("{} exceeded {}ms", operation, limit.as_millis()))
    })?
}
