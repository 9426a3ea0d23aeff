use std::future::Future;
use std::time::Duration;

use crate::error::AuthServiceError;

pub mod issue;
pub mod purge;
pub mod resolve;
pub mod session;
pub mod verify;

/// Run one external call under `limit`. On timeout, `on_timeout` builds the call's own failure kind.
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    call: &'static str,
    fut: F,
    on_timeout: fn(anyhow::Error) -> AuthServiceError,
) -> Result<T, AuthServiceError>
where
    F: Future<Output = Result<T, AuthServiceError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(call, timeout_ms = limit.as_millis() as u64, "external call timed out");
            Err(on_timeout(anyhow::anyhow!(
                "{call} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}
